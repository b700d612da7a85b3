//! Bundled HTTP fee-rate provider.
//!
//! Operators without their own estimator can plug this [`FeeRateProvider`]
//! implementation into the on-chain handler. It queries a mempool-style
//! `fees/recommended` endpoint and picks a rate by confirmation target.
//! The on-chain handler only sees the [`FeeRateProvider`] trait, so any
//! other estimator can be substituted.

use crate::errors::ServiceError;
use crate::services::FeeRateProvider;
use crate::types::{FeeRate, Network};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_URL: &str = "https://mempool.space/api/v1/fees/recommended";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fee-rate provider backed by a mempool-style HTTP API.
#[derive(Debug, Clone)]
pub struct HttpFeeRateProvider {
    api_url: String,
    /// Confirmation target in blocks (6 ≈ one hour).
    confirmation_target: u32,
    client: reqwest::Client,
}

impl HttpFeeRateProvider {
    /// Creates a provider against the default mempool.space endpoint.
    pub fn new() -> Self {
        Self::with_url(DEFAULT_API_URL)
    }

    /// Creates a provider against a custom endpoint.
    pub fn with_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            confirmation_target: 6,
            client: reqwest::Client::new(),
        }
    }

    /// Sets the confirmation target used to pick a rate tier.
    pub fn with_confirmation_target(mut self, target: u32) -> Self {
        self.confirmation_target = target;
        self
    }

    fn select_rate(&self, fees: &RecommendedFees) -> FeeRate {
        let rate = match self.confirmation_target {
            0..=1 => fees.fastest_fee,
            2..=3 => fees.half_hour_fee,
            4..=6 => fees.hour_fee,
            7..=12 => fees.economy_fee,
            _ => fees.minimum_fee,
        };
        // Relay policies reject anything below 1 sat/unit.
        FeeRate::per_unit(rate.max(1))
    }
}

impl Default for HttpFeeRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeeRateProvider for HttpFeeRateProvider {
    async fn get_fee_rate(&self, network: &Network) -> Result<FeeRate, ServiceError> {
        debug!(network = %network.code, url = %self.api_url, "fetching fee rate");

        let response = self
            .client
            .get(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("fee API returned status {}", response.status()).into());
        }

        let fees: RecommendedFees = response.json().await?;
        let rate = self.select_rate(&fees);
        debug!(network = %network.code, sat_per_unit = rate.sat_per_unit, "fee rate selected");
        Ok(rate)
    }
}

/// Response shape of a mempool-style `fees/recommended` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendedFees {
    fastest_fee: u64,
    half_hour_fee: u64,
    hour_fee: u64,
    economy_fee: u64,
    minimum_fee: u64,
}

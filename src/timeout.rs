//! First-to-resolve combinator racing an operation against a cancellation
//! signal.
//!
//! Both rail handlers bound their external calls with this: the node-info
//! query races a fixed [`deadline`], the connectivity probe races a signal
//! supplied by its caller. The losing side is dropped when the race resolves,
//! so any registration tied to the signal is released on every exit path. The
//! operation itself is not force-terminated when the signal wins (it may be
//! running against an external process); only this wait completes so the
//! caller can react as a timeout.

use std::future::Future;
use std::time::Duration;

/// Outcome of racing an operation against a cancellation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    /// The operation finished first; carries its output.
    Completed(T),
    /// The signal fired first.
    TimedOut,
}

impl<T> RaceOutcome<T> {
    /// Returns the operation's output, or `None` when the race timed out.
    pub fn into_completed(self) -> Option<T> {
        match self {
            RaceOutcome::Completed(value) => Some(value),
            RaceOutcome::TimedOut => None,
        }
    }

    /// Whether the signal won the race.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, RaceOutcome::TimedOut)
    }
}

/// Races `operation` against `signal`, resolving with whichever finishes
/// first.
///
/// The poll order is biased towards the signal: a signal that has already
/// fired at call time resolves immediately as [`RaceOutcome::TimedOut`]
/// without polling the operation.
pub async fn race_cancel<T>(
    operation: impl Future<Output = T>,
    signal: impl Future<Output = ()>,
) -> RaceOutcome<T> {
    tokio::select! {
        biased;
        _ = signal => RaceOutcome::TimedOut,
        output = operation => RaceOutcome::Completed(output),
    }
}

/// A cancellation signal derived from a fixed deadline.
pub fn deadline(after: Duration) -> impl Future<Output = ()> {
    tokio::time::sleep(after)
}

//! Retry discipline of the server client.
//!
//! [`RetryPolicy::decide`] is a pure function of the attempt number and the classified
//! [`Outcome`] of that attempt, so the whole policy can be checked without a clock or a socket.

use std::time::Duration;

/// Classified result of a single HTTP attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// HTTP 200.
    Success,
    /// HTTP 5xx.
    ServerError(u16),
    /// Connection refused, timeout, reset, ...
    TransportFailure,
    /// Any other status.
    ClientError(u16),
}

impl Outcome {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Outcome::Success,
            500..=599 => Outcome::ServerError(status),
            _ => Outcome::ClientError(status),
        }
    }

    fn is_transient(&self) -> bool {
        matches!(self, Outcome::ServerError(_) | Outcome::TransportFailure)
    }
}

/// What the client should do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// The attempt succeeded.
    Done,
    /// Wait, then try again.
    RetryAfter(Duration),
    /// Give up. The error reported depends on the outcome.
    Fail,
}

/// Bounded retry with a fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, initial one included.
    pub max_attempts: u32,
    /// Delay before each retry. Never grows.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Attempts made before giving up.
    pub const MAX_ATTEMPTS: u32 = 5;
    /// Wait between two attempts.
    pub const BACKOFF: Duration = Duration::from_millis(100);

    /// Same bound, no waiting. Meant for tests.
    pub fn immediate() -> Self {
        Self {
            backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Decide what follows `outcome`, observed on attempt number `attempt` (1-based).
    pub fn decide(&self, attempt: u32, outcome: &Outcome) -> RetryStep {
        match outcome {
            Outcome::Success => RetryStep::Done,
            o if o.is_transient() && attempt < self.max_attempts => {
                RetryStep::RetryAfter(self.backoff)
            }
            _ => RetryStep::Fail,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::MAX_ATTEMPTS,
            backoff: Self::BACKOFF,
        }
    }
}

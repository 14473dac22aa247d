use crate::net::{HttpError, NetError};
use std::time::{Duration, Instant};

/// Tracks the absolute expiration for a single outbound HTTP request.
///
/// The client re-derives socket timeouts from the remaining budget before every connect,
/// read, and write, so the whole exchange ends at `expires_at` at the latest.
#[derive(Clone, Copy, Debug)]
pub struct RequestDeadline {
    expires_at: Instant,
}

impl RequestDeadline {
    pub fn from_timeout(timeout: Duration) -> Self {
        let bounded = if timeout.is_zero() {
            Duration::from_millis(1)
        } else {
            timeout
        };
        Self {
            expires_at: Instant::now() + bounded,
        }
    }

    pub fn from_deadline(expires_at: Instant) -> Self {
        Self { expires_at }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        match self.remaining() {
            Some(remaining) => remaining.is_zero(),
            None => true,
        }
    }

    pub fn enforce(&self) -> Result<(), NetError> {
        self.budget().map(|_| ())
    }

    /// Remaining time as a non-zero duration suitable for socket timeouts.
    pub(crate) fn budget(&self) -> Result<Duration, NetError> {
        self.remaining()
            .filter(|remaining| !remaining.is_zero())
            .ok_or_else(|| NetError::from(HttpError::RequestTimeout))
    }
}

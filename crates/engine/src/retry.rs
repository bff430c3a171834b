//! Retry policy for compare-and-swap loops
//!
//! Every conditional write loop (document set/delete/update, bucket
//! add/remove) asks the policy before each attempt. The default policy
//! retries forever without delay; a bounded policy gives up with
//! `Error::RetryLimitExceeded`, and a base delay turns on capped
//! exponential backoff between attempts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use folio_core::{Error, Result};

/// Configuration for CAS retry behavior
///
/// # Example
/// ```
/// use folio_engine::RetryPolicy;
///
/// let policy = RetryPolicy::unbounded()
///     .with_max_attempts(16)
///     .with_base_delay_ms(1)
///     .with_max_delay_ms(50);
/// assert_eq!(policy.max_attempts, Some(16));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts allowed per operation; None retries forever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Base delay before a retry in milliseconds; 0 retries immediately
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Retry forever, immediately
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Set the maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Delay before retry number `retry` (0-based)
    pub(crate) fn calculate_delay(&self, retry: u32) -> Duration {
        let shift = retry.min(63);
        let delay_ms = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(delay_ms.min(self.max_delay_ms.max(self.base_delay_ms)))
    }

    /// Start counting attempts of one operation on `key`
    pub(crate) fn attempts<'a>(&'a self, key: &'a [u8]) -> Attempts<'a> {
        Attempts {
            policy: self,
            key,
            made: 0,
        }
    }
}

/// Attempt counter of one CAS loop
pub(crate) struct Attempts<'a> {
    policy: &'a RetryPolicy,
    key: &'a [u8],
    made: u32,
}

impl Attempts<'_> {
    /// Call at the top of every loop iteration
    pub(crate) fn begin(&mut self) -> Result<()> {
        if let Some(max) = self.policy.max_attempts {
            if self.made >= max {
                return Err(Error::RetryLimitExceeded {
                    key: String::from_utf8_lossy(self.key).into_owned(),
                    attempts: self.made,
                });
            }
        }

        if self.made > 0 {
            debug!(
                target: "folio::retry",
                key = %String::from_utf8_lossy(self.key),
                attempt = self.made + 1,
                "Counter changed, retrying"
            );
            let delay = self.policy.calculate_delay(self.made - 1);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }

        self.made += 1;
        Ok(())
    }
}

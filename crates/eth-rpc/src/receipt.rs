//! Receipt polling with an injected retry policy.

use std::time::Duration;

use alloy_primitives::B256;
use tracing::{debug, info};

use crate::client::EthClient;
use crate::error::{Result, RpcError};
use crate::transport::Transport;
use crate::types::TransactionReceipt;

/// How often and how long to poll for a receipt.
///
/// The default polls 60 times, one second apart, without backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    /// Factor applied to the interval after each attempt; `1.0` keeps it fixed.
    pub backoff_multiplier: f64,
    /// Upper bound on the grown interval.
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_secs(1),
            backoff_multiplier: 1.0,
            max_interval: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            backoff_multiplier: 1.0,
            max_interval: interval,
        }
    }

    /// Delay to sleep after the given 1-based attempt failed.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.backoff_multiplier <= 1.0 || !self.backoff_multiplier.is_finite() {
            return self.interval;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let cap = self.max_interval.max(self.interval);
        if !secs.is_finite() || secs >= cap.as_secs_f64() {
            cap
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl<T: Transport> EthClient<T> {
    /// Polls `eth_getTransactionReceipt` until the receipt is available.
    ///
    /// "Not found" answers are retried up to `policy.max_attempts` times;
    /// any other error ends polling immediately. There is no sleep after the
    /// final attempt.
    pub async fn wait_for_receipt(&self, hash: B256, policy: &RetryPolicy) -> Result<TransactionReceipt> {
        for attempt in 1..=policy.max_attempts {
            match self.transaction_receipt(hash).await {
                Ok(receipt) => {
                    info!(%hash, attempt, status = ?receipt.status, "receipt received");
                    return Ok(receipt);
                }
                Err(RpcError::NotFound(_)) => {
                    debug!(%hash, attempt, "receipt not yet available");
                }
                Err(e) => return Err(e),
            }

            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.delay_after(attempt)).await;
            }
        }

        Err(RpcError::ReceiptTimeout {
            hash,
            attempts: policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sixty_seconds_fixed() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(59), Duration::from_secs(1));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            interval: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_interval: Duration::from_secs(3),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(2));
        assert_eq!(policy.delay_after(4), Duration::from_secs(3));
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(3));
    }

    #[test]
    fn non_finite_multiplier_is_fixed() {
        let policy = RetryPolicy {
            backoff_multiplier: f64::NAN,
            ..RetryPolicy::fixed(3, Duration::from_millis(250))
        };
        assert_eq!(policy.delay_after(2), Duration::from_millis(250));
    }
}

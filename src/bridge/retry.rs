use std::future::Future;
use std::time::Duration;

use crate::bridge::error::BridgeResult;
use crate::bridge::LOGGER;
use crate::platform::runtime;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Bounded retry with a fixed delay between attempts.
///
/// Absorbs the start-up window in which the script side has not attached yet. The
/// delay does not grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Retries without waiting in between.
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Upper bound of the time spent sleeping between attempts.
    pub fn total_backoff(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Runs `attempt` until it succeeds or the policy is exhausted.
///
/// Every failure is logged with the operation name. After the last attempt the final
/// error is returned unchanged.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut attempt: F,
) -> BridgeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BridgeResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut number = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if number >= max_attempts => {
                LOGGER.warn(format!(
                    "{operation} failed after {number} attempt(s), giving up: {err}"
                ));
                return Err(err);
            }
            Err(err) => {
                LOGGER.debug(format!(
                    "{operation} attempt {number}/{max_attempts} failed, retrying: {err}"
                ));
                number += 1;
                runtime::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::bridge::error::BridgeError;
    use std::cell::Cell;
    use std::time::Instant;

    #[test]
    fn default_policy_is_five_attempts_two_hundred_millis() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay, Duration::from_millis(200));
        assert_eq!(policy.total_backoff(), Duration::from_millis(800));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn succeeds_on_last_attempt() {
        let attempts = Cell::new(0);
        let result = retry(RetryPolicy::immediate(5), "auth.isSignedIn", || {
            attempts.set(attempts.get() + 1);
            let current = attempts.get();
            async move {
                if current < 5 {
                    Err(BridgeError::unavailable("auth.isSignedIn", "not attached"))
                } else {
                    Ok(true)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(true));
        assert_eq!(attempts.get(), 5);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn returns_last_error_when_exhausted() {
        let attempts = Cell::new(0);
        let result: BridgeResult<()> = retry(RetryPolicy::immediate(3), "loadSdk", || {
            attempts.set(attempts.get() + 1);
            let current = attempts.get();
            async move { Err(BridgeError::script("loadSdk", format!("failure {current}"))) }
        })
        .await;

        assert_eq!(result, Err(BridgeError::script("loadSdk", "failure 3")));
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waits_between_attempts_only() {
        let policy = RetryPolicy::new(3, Duration::from_millis(15));
        let started = Instant::now();
        let _: BridgeResult<()> = retry(policy, "loadSdk", || async {
            Err(BridgeError::unavailable("loadSdk", "not attached"))
        })
        .await;

        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn zero_attempts_still_runs_once() {
        let attempts = Cell::new(0);
        let _ = retry(RetryPolicy::immediate(0), "noop", || {
            attempts.set(attempts.get() + 1);
            async { Ok::<_, BridgeError>(()) }
        })
        .await;
        assert_eq!(attempts.get(), 1);
    }
}

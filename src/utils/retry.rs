//! Retry utilities with linear backoff for resilient hub calls.

use std::time::Duration;
use tokio::time::sleep;

use crate::hub::HubError;

/// Maximum number of retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay between retries; attempt `n` waits `base * (n + 1)`
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetrySettings {
    /// Retries after the first attempt, so `max_retries + 1` attempts total
    pub max_retries: u32,
    /// Base delay; the wait grows linearly with the attempt index
    pub base_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetrySettings {
    /// Set the maximum number of retries
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the base delay between retries
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }
}

/// Execute an async operation, retrying transient failures.
///
/// The operation is attempted immediately. On failure the error's
/// [`HubError::is_retryable`] capability decides what happens next: fatal
/// errors are returned at once without burning attempts, transient errors
/// sleep `base_delay * (attempt + 1)` and try again. After `max_retries`
/// retries the last error is returned. Each retry emits a console notice.
pub async fn with_retry<T, F, Fut>(settings: RetrySettings, operation: F) -> Result<T, HubError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, HubError>>,
{
    let mut operation = operation;
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempt + 1,
                        attempt
                    );
                }
                return Ok(result);
            }
            Err(error) if error.is_retryable() && attempt < settings.max_retries => {
                // Linear backoff, no jitter: 1x, 2x, 3x the base delay.
                let delay = settings.base_delay * (attempt + 1);

                eprintln!(
                    "Attempt {} failed: {}, retrying in {}s...",
                    attempt + 1,
                    error,
                    delay.as_secs_f64()
                );
                tracing::warn!(
                    "Transient error on attempt {}: {}, retrying in {:?}",
                    attempt + 1,
                    error,
                    delay
                );

                sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if attempt > 0 {
                    tracing::warn!("Operation failed after {} attempts: {}", attempt + 1, error);
                }
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fast_settings() -> RetrySettings {
        RetrySettings::default().base_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result = {
            let call_count = call_count.clone();
            with_retry(fast_settings(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_transient_failures() {
        let settings = RetrySettings::default(); // 3 retries, 5s base
        let call_count = Rc::new(RefCell::new(0));
        let started = tokio::time::Instant::now();

        let result = {
            let call_count = call_count.clone();
            with_retry(settings, move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    let count = *call_count.borrow();
                    if count <= 3 {
                        Err(HubError::Network("temporary error".to_string()))
                    } else {
                        Ok("success")
                    }
                }
            })
        }
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*call_count.borrow(), 4);
        // Linear backoff sleeps: 5 + 10 + 15 seconds.
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_returns_last_error() {
        let settings = RetrySettings::default();
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), HubError> = {
            let call_count = call_count.clone();
            with_retry(settings, move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    let count = *call_count.borrow();
                    Err(HubError::Api {
                        status: 503,
                        message: format!("unavailable #{}", count),
                    })
                }
            })
        }
        .await;

        // max_retries + 1 total attempts, and the final error is the one surfaced.
        assert_eq!(*call_count.borrow(), 4);
        match result {
            Err(HubError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "unavailable #4");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), HubError> = {
            let call_count = call_count.clone();
            with_retry(fast_settings(), move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(HubError::NotFound("org/missing".to_string()))
                }
            })
        }
        .await;

        assert!(matches!(result, Err(HubError::NotFound(_))));
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let settings = fast_settings().max_retries(0);
        let call_count = Rc::new(RefCell::new(0));

        let result: Result<(), HubError> = {
            let call_count = call_count.clone();
            with_retry(settings, move || {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err(HubError::Timeout)
                }
            })
        }
        .await;

        assert!(matches!(result, Err(HubError::Timeout)));
        assert_eq!(*call_count.borrow(), 1);
    }
}

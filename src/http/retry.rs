// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Retry with backoff

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::abort::{aborted, AbortSignal};
use super::DEFAULT_RETRY_DELAY;
use crate::error::{ErrorCode, HttpError, Result};

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffStrategy {
    /// `delay * 2^(attempt-1)`
    #[default]
    Exponential,
    /// `delay * attempt`
    Linear,
    /// `delay`
    Fixed,
}

/// Decides whether a failed attempt is retried
pub type RetryPredicate = Arc<dyn Fn(&HttpError, u32) -> bool + Send + Sync>;

/// Retry settings
#[derive(Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first
    pub retries: u32,
    /// Base delay
    pub retry_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Upper bound for a single delay
    pub max_retry_delay: Option<Duration>,
    /// Retry filter; `CANCELLED` is never retried regardless
    pub should_retry: Option<RetryPredicate>,
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("strategy", &self.strategy)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("should_retry", &self.should_retry.is_some())
            .finish()
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryConfig {
    /// Single attempt
    pub fn none() -> Self {
        Self::exponential(0, DEFAULT_RETRY_DELAY)
    }

    /// Uncapped exponential backoff retrying every non-cancelled error
    pub fn exponential(retries: u32, retry_delay: Duration) -> Self {
        Self {
            retries,
            retry_delay,
            strategy: BackoffStrategy::Exponential,
            max_retry_delay: None,
            should_retry: None,
        }
    }

    /// Unified client default: 3 retries from 1s, capped at 10s, on
    /// network, timeout and server errors
    pub fn unified_default() -> Self {
        Self {
            retries: 3,
            retry_delay: DEFAULT_RETRY_DELAY,
            strategy: BackoffStrategy::Exponential,
            max_retry_delay: Some(Duration::from_secs(10)),
            should_retry: Some(Arc::new(|err: &HttpError, _| {
                matches!(
                    err.code,
                    ErrorCode::NetworkError | ErrorCode::Timeout | ErrorCode::ServerError
                )
            })),
        }
    }

    pub fn strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn max_retry_delay(mut self, max: Duration) -> Self {
        self.max_retry_delay = Some(max);
        self
    }

    pub fn should_retry(mut self, f: impl Fn(&HttpError, u32) -> bool + Send + Sync + 'static) -> Self {
        self.should_retry = Some(Arc::new(f));
        self
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.strategy {
            BackoffStrategy::Exponential => {
                let factor = 2u32.saturating_pow(attempt - 1);
                self.retry_delay.saturating_mul(factor)
            }
            BackoffStrategy::Linear => self.retry_delay.saturating_mul(attempt),
            BackoffStrategy::Fixed => self.retry_delay,
        };
        match self.max_retry_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    fn allows(&self, err: &HttpError, attempt: u32) -> bool {
        if !err.is_retryable() {
            return false;
        }
        self.should_retry
            .as_ref()
            .map_or(true, |predicate| predicate(err, attempt))
    }

    /// Run `op` until it succeeds or retries are exhausted
    ///
    /// `op` receives the 0-based attempt number. The last error is returned
    /// unchanged. A fired `signal` interrupts the backoff sleep with
    /// `CANCELLED`.
    pub async fn run<T, F, Fut>(&self, signal: Option<&AbortSignal>, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            attempt += 1;
            if attempt > self.retries || !self.allows(&err, attempt) {
                if attempt > 1 {
                    debug!(attempts = attempt, code = %err.code, "Giving up after retries");
                }
                return Err(err);
            }

            let delay = self.delay_for(attempt);
            warn!(
                attempt,
                max = self.retries,
                delay_ms = delay.as_millis() as u64,
                code = %err.code,
                "Request failed, retrying"
            );

            tokio::select! {
                biased;
                _ = aborted(signal) => {
                    return Err(HttpError::cancelled("Request cancelled"));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::AbortController;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_delays() {
        let exp = RetryConfig::exponential(5, Duration::from_millis(100));
        assert_eq!(exp.delay_for(1), Duration::from_millis(100));
        assert_eq!(exp.delay_for(2), Duration::from_millis(200));
        assert_eq!(exp.delay_for(3), Duration::from_millis(400));

        let linear = exp.clone().strategy(BackoffStrategy::Linear);
        assert_eq!(linear.delay_for(3), Duration::from_millis(300));

        let fixed = exp.clone().strategy(BackoffStrategy::Fixed);
        assert_eq!(fixed.delay_for(4), Duration::from_millis(100));

        let capped = RetryConfig::unified_default();
        assert_eq!(capped.delay_for(4), Duration::from_secs(8));
        assert_eq!(capped.delay_for(5), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_and_backoff() {
        let calls = AtomicU32::new(0);
        let stamps = parking_lot::Mutex::new(Vec::new());
        let start = Instant::now();
        let policy = RetryConfig::exponential(3, Duration::from_millis(100));

        let res: Result<()> = policy
            .run(None, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                stamps.lock().push(start.elapsed());
                async { Err(HttpError::network("down")) }
            })
            .await;

        let err = res.unwrap_err();
        assert_eq!(err.message, "down");
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        let stamps = stamps.lock();
        let gaps: Vec<_> = stamps.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryConfig::exponential(3, Duration::from_millis(100));

        let res: Result<()> = policy
            .run(None, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(HttpError::cancelled("Request cancelled")) }
            })
            .await;

        assert!(res.unwrap_err().is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_filters() {
        let calls = AtomicU32::new(0);
        let policy = RetryConfig::unified_default();

        let res: Result<()> = policy
            .run(None, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(HttpError::new(ErrorCode::ClientError, "bad")) }
            })
            .await;

        assert!(res.unwrap_err().is_client_error());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_during_backoff() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let policy = RetryConfig::exponential(3, Duration::from_secs(60));

        let handle = tokio::spawn(async move {
            policy
                .run(Some(&signal), |_| async {
                    Err::<(), _>(HttpError::timeout("slow"))
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.abort();

        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_success_after_failures() {
        let policy = RetryConfig::exponential(2, Duration::from_millis(1));
        let value = policy
            .run(None, |attempt| async move {
                if attempt < 2 {
                    Err(HttpError::network("flaky"))
                } else {
                    Ok(attempt)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }
}

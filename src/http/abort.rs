// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request cancellation

use tokio_util::sync::CancellationToken;

/// Owner side of a cancellation signal
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    token: CancellationToken,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal to pass in a request config
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
        }
    }

    /// Cancel every request bound to this controller's signal
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Cancellation signal observed by adapters
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal fires
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Fire the signal from the receiving side
    pub(crate) fn trigger(&self) {
        self.token.cancel();
    }
}

/// Resolves when `signal` fires; never resolves without a signal
pub(crate) async fn aborted(signal: Option<&AbortSignal>) {
    match signal {
        Some(signal) => signal.cancelled().await,
        None => futures::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_abort_wakes_waiter() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.aborted());

        let waiter = tokio::spawn(async move { signal.cancelled().await });
        controller.abort();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(controller.is_aborted());
    }

    #[tokio::test]
    async fn test_no_signal_never_fires() {
        let res = tokio::time::timeout(Duration::from_millis(20), aborted(None)).await;
        assert!(res.is_err());
    }
}

//! Cooperative cancellation helpers.
//!
//! A single [`CancellationToken`] is threaded through every scan, sleep and
//! attack so that Ctrl-C (CLI) or a stop request (monitor) is observed
//! immediately instead of once per loop iteration.

use std::time::Duration;

use tokio::task::JoinHandle;
pub use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Sleeps for `duration` unless `cancel` fires first.
///
/// Returns `true` when the sleep was cut short by cancellation.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => cancel.is_cancelled(),
    }
}

/// Fails with [`Error::Cancelled`] once the token has fired.
pub fn check_cancel(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Cancels a token when a time limit passes.
///
/// Dropping the guard disarms the timer, so a finished run never cancels
/// its token later.
#[derive(Debug)]
pub struct Deadline {
    timer: JoinHandle<()>,
}

impl Deadline {
    /// Must be called from within a tokio runtime.
    pub fn start(cancel: &CancellationToken, after: Duration) -> Self {
        let cancel = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            cancel.cancel();
        });
        Self { timer }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_sleep_completes() {
        let cancel = CancellationToken::new();
        assert!(!sleep_or_cancel(Duration::from_millis(20), &cancel).await);
    }

    #[tokio::test]
    async fn test_sleep_interrupted() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        assert!(sleep_or_cancel(Duration::from_secs(30), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_check_cancel() {
        let cancel = CancellationToken::new();
        assert!(check_cancel(&cancel).is_ok());
        cancel.cancel();
        assert!(matches!(check_cancel(&cancel), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_deadline_fires() {
        let cancel = CancellationToken::new();
        let _deadline = Deadline::start(&cancel, Duration::from_millis(50));
        assert!(sleep_or_cancel(Duration::from_secs(5), &cancel).await);
    }

    #[tokio::test]
    async fn test_dropped_deadline_never_fires() {
        let cancel = CancellationToken::new();
        let deadline = Deadline::start(&cancel, Duration::from_millis(50));
        drop(deadline);
        assert!(!sleep_or_cancel(Duration::from_millis(200), &cancel).await);
        assert!(!cancel.is_cancelled());
    }
}

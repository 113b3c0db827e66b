/// Poller - bounded, cancellable wait for a terminal status
///
/// **Rules:**
/// 1. Query the backend once per attempt
/// 2. Return as soon as a terminal status (id > 2) is seen
/// 3. Sleep `interval` between attempts, never after the last one
/// 4. Give up with `Timeout` after `max_attempts` non-terminal answers
/// 5. Stop promptly with `Cancelled` once the caller's signal fires
///
/// Sleeping and querying are both awaited, so a waiting poll never holds a
/// runtime worker thread.

use crate::backend::{ExecutionBackend, RawResult};
use crate::error::{ExecError, Result};
use codepad_common::config::Config;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_max_attempts, config.poll_interval)
    }
}

/// Caller side of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Poller side of a cancellation pair. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle/signal pair
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. If the handle is dropped without
    /// cancelling, this stays pending forever.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}

/// Poll `token` until it reaches a terminal status
pub async fn poll(
    backend: &dyn ExecutionBackend,
    token: &str,
    policy: &PollPolicy,
    cancel: &CancelSignal,
) -> Result<RawResult> {
    let cancelled = |attempts: u32| ExecError::Cancelled {
        token: token.to_string(),
        attempts,
    };

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(cancelled(attempt - 1));
        }

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(attempt - 1)),
            result = backend.fetch(token) => result?,
        };

        debug!(
            token = %token,
            attempt,
            max_attempts = policy.max_attempts,
            status_id = raw.status.id,
            "Polled submission"
        );

        if raw.status.is_terminal() {
            return Ok(raw);
        }

        if attempt < policy.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(attempt)),
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }
    }

    Err(ExecError::Timeout {
        token: token.to_string(),
        attempts: policy.max_attempts,
    })
}

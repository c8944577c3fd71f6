use std::sync::{Arc, Mutex};
use std::time::Duration;

use offrag_core::config::RuntimeSettings;
use offrag_core::error::{Error, ModelStage, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Timeout and retry budget for one backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self { Self::from(&RuntimeSettings::default()) }
}

impl From<&RuntimeSettings> for CallPolicy {
    fn from(s: &RuntimeSettings) -> Self {
        Self {
            timeout: Duration::from_secs(s.model_timeout_secs),
            max_retries: s.max_retries,
            backoff: Duration::from_millis(s.retry_backoff_ms),
        }
    }
}

/// Runs backend calls one at a time on the blocking pool.
///
/// The lock is held by the blocking closure itself, so a call abandoned after
/// a timeout still finishes before the next one starts.
#[derive(Debug, Clone, Default)]
pub struct ModelGuard {
    policy: CallPolicy,
    lock: Arc<Mutex<()>>,
}

impl ModelGuard {
    pub fn new(policy: CallPolicy) -> Self { Self { policy, lock: Arc::default() } }

    pub fn policy(&self) -> CallPolicy { self.policy }

    pub async fn call<T, F>(&self, stage: ModelStage, cancel: &CancellationToken, f: F) -> Result<T>
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let f = Arc::new(f);
        let mut attempt = 0u32;
        loop {
            match self.attempt(stage, cancel, Arc::clone(&f)).await {
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff.saturating_mul(1u32 << attempt.min(16));
                    attempt += 1;
                    warn!(%stage, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying backend call");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                other => return other,
            }
        }
    }

    async fn attempt<T, F>(&self, stage: ModelStage, cancel: &CancellationToken, f: Arc<F>) -> Result<T>
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let lock = Arc::clone(&self.lock);
        let task = tokio::task::spawn_blocking(move || {
            let _serial = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        });
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            joined = tokio::time::timeout(self.policy.timeout, task) => match joined {
                Err(_) if stage == ModelStage::Rendering => {
                    Err(Error::Render(format!("timed out after {:.1}s", self.policy.timeout.as_secs_f64())))
                }
                Err(_) => Err(Error::Timeout { stage, after: self.policy.timeout }),
                Ok(Err(join)) => Err(Error::model(stage, format!("backend task aborted: {join}"))),
                Ok(Ok(result)) => result,
            },
        }
    }
}

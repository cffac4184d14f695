use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::{PipelineError, pipeline::Step};

/// Per-step retry policy: a fixed number of extra attempts with a fixed delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub retries: u32,
    pub delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 2, delay_secs: 120 }
    }
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self { retries: 0, delay_secs: 0 }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
pub async fn with_retries<T, F, Fut>(
    step: Step,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempts <= policy.retries => {
                warn!(%step, attempts, error = %err, delay_secs = policy.delay_secs, "Step failed, retrying");
                sleep(policy.delay()).await;
            }
            Err(err) => {
                error!(%step, attempts, error = %err, "Step failed");
                return Err(PipelineError::StepFailed { step, attempts, source: Box::new(err) });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rejected() -> PipelineError {
        PipelineError::UploadRejected { status: 500, body: "boom".into() }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy { retries: 2, delay_secs: 120 };

        let value = with_retries(Step::Notify, &policy, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err(rejected()) } else { Ok(7) }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_retries_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let err = with_retries(Step::Extract, &policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(rejected())
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            PipelineError::StepFailed { step, attempts, .. } => {
                assert_eq!(step, Step::Extract);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_retries_means_single_attempt() {
        let calls = AtomicU32::new(0);

        let result = with_retries(Step::TransformLoad, &RetryPolicy::none(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(rejected())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

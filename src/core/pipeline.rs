//! Bounded-concurrency, fault-tolerant batch executor.
//!
//! Used for post-processing fan-outs (edition resolution, per-creator
//! metadata scans) that must be rate-limited against RPC throttling. One
//! item's failure is caught and logged at the item level and never aborts
//! sibling work or the overall pipeline — the result is a best-effort sync
//! where some accounts may simply be absent from state.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::PipelineConfig;
use crate::utils::error::Result;

/// Outcome summary of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl PipelineReport {
    /// Total number of items processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Processes `items` with at most `config.jobs_count` workers in flight,
/// dispatching `config.sequence` items per tick with `config.delay()`
/// between ticks.
///
/// `worker` is called once per item to build that item's future; the future
/// runs on its own task. Failures are logged and counted, never propagated.
pub async fn run_pipeline<T, W, Fut>(
    items: Vec<T>,
    worker: W,
    config: &PipelineConfig,
) -> PipelineReport
where
    T: Send + 'static,
    W: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(config.jobs_count.max(1)));
    let sequence = config.sequence.max(1);
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    for (dispatched, item) in items.into_iter().enumerate() {
        if dispatched > 0 && dispatched % sequence == 0 && !config.delay().is_zero() {
            tokio::time::sleep(config.delay()).await;
        }

        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            // The semaphore is never closed while this loop holds it.
            break;
        };

        let fut = worker(item);
        tasks.spawn(async move {
            let _permit = permit;
            fut.await
        });
    }

    let mut report = PipelineReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => report.succeeded += 1,
            Ok(Err(e)) => {
                report.failed += 1;
                tracing::warn!(error = %e, "pipeline item failed");
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(error = %e, "pipeline worker panicked");
            }
        }
    }
    report
}

use kvstress_client::Connection;
use kvstress_common::{OpKind, Result, StressError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::histogram::Histogram;
use crate::partition::WorkPartition;
use crate::workload::{command_args, member};

/// What one worker executes.
#[derive(Debug, Clone)]
pub struct WorkerPlan {
    pub id: usize,
    pub op: OpKind,
    pub key: String,
    pub partition: WorkPartition,
    pub ceiling_ms: u64,
}

/// Issue one `plan.op` per index in the partition over `conn`, timing each.
///
/// Returns the worker's local histogram. The first failed command ends the
/// worker with [`StressError::Command`]; nothing is retried.
pub async fn run<C: Connection>(conn: &mut C, plan: &WorkerPlan) -> Result<Histogram> {
    let mut histogram = Histogram::new(plan.ceiling_ms);
    debug!(
        worker = plan.id,
        start = plan.partition.start,
        count = plan.partition.count,
        "worker started"
    );

    for index in plan.partition.indices() {
        let args = command_args(plan.op, &plan.key, index);

        let op_start = Instant::now();
        let outcome = conn.execute(plan.op.command(), &args).await;
        let latency = op_start.elapsed();

        if let Err(failure) = outcome {
            return Err(StressError::Command {
                op: plan.op,
                member: member(&plan.key, index),
                reason: failure.to_string(),
            });
        }
        histogram.record(whole_millis(latency));
    }

    debug!(worker = plan.id, recorded = histogram.total(), "worker finished");
    Ok(histogram)
}

/// Truncate to whole milliseconds: 1.9 ms counts as 1 ms.
pub fn whole_millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}

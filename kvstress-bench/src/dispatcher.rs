use kvstress_client::{ConnectionPool, Dialer};
use kvstress_common::{OpKind, Result, StressError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::BenchConfig;
use crate::histogram::{Histogram, SharedHistogram};
use crate::partition::partition;
use crate::worker::{self, WorkerPlan};

/// Outcome of a completed run. Only ever built after every worker finished.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub op: OpKind,
    pub total_requests: u64,
    pub concurrency: usize,
    pub elapsed: Duration,
    /// Requests no worker executed because `total_requests` did not divide evenly.
    pub dropped_requests: u64,
    pub histogram: Histogram,
}

impl RunSummary {
    /// Wall-clock run time in whole seconds (truncated).
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.as_secs()
    }
}

/// Run `config` to completion: one worker per client, each on its own leased
/// connection and partition, then wait for all of them.
///
/// Any worker failure aborts the others and is returned as-is; no partial
/// summary is produced.
pub async fn execute<D: Dialer>(
    pool: &Arc<ConnectionPool<D>>,
    config: &BenchConfig,
) -> Result<RunSummary> {
    config.validate()?;

    let partitions = partition(config.total_requests, config.concurrency, config.remainder);
    if partitions.dropped > 0 {
        warn!(
            dropped = partitions.dropped,
            total = config.total_requests,
            clients = config.concurrency,
            "requests do not divide evenly across clients; the remainder will not run"
        );
    }

    let mut leases = Vec::with_capacity(config.concurrency);
    for _ in 0..config.concurrency {
        leases.push(ConnectionPool::lease(pool).await?);
    }

    let shared = Arc::new(SharedHistogram::new(config.ceiling_ms));
    let mut workers = JoinSet::new();

    let started = Instant::now();
    for (id, (mut conn, part)) in leases.into_iter().zip(partitions.parts).enumerate() {
        let plan = WorkerPlan {
            id,
            op: config.op,
            key: config.key.clone(),
            partition: part,
            ceiling_ms: config.ceiling_ms,
        };
        let shared = Arc::clone(&shared);
        workers.spawn(async move {
            let local = worker::run(&mut *conn, &plan).await?;
            shared.merge_from(&local);
            // Hand the connection back before reporting completion.
            drop(conn);
            Ok::<usize, StressError>(id)
        });
    }
    info!(clients = config.concurrency, op = %config.op, "workers launched");

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(id)) => debug!(worker = id, "worker joined"),
            Ok(Err(e)) => {
                workers.abort_all();
                return Err(e);
            }
            Err(e) => {
                workers.abort_all();
                return Err(StressError::WorkerFailed(e.to_string()));
            }
        }
    }
    let elapsed = started.elapsed();

    Ok(RunSummary {
        op: config.op,
        total_requests: config.total_requests,
        concurrency: config.concurrency,
        elapsed,
        dropped_requests: partitions.dropped,
        histogram: shared.snapshot(),
    })
}

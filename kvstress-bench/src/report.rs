use kvstress_common::OpKind;
use serde::Serialize;
use std::fmt;

use crate::dispatcher::RunSummary;

/// `<percent>% <= <latency_ms>ms`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileLine {
    pub percent: f64,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub op: OpKind,
    pub total_requests: u64,
    pub concurrency: usize,
    pub elapsed_secs: u64,
    pub qps: u64,
    pub dropped_requests: u64,
    pub ceiling_ms: u64,
    pub overflow: u64,
    pub percentiles: Vec<PercentileLine>,
}

impl Report {
    pub fn from_summary(summary: &RunSummary) -> Self {
        let elapsed_secs = summary.elapsed_secs();
        Self {
            op: summary.op,
            total_requests: summary.total_requests,
            concurrency: summary.concurrency,
            elapsed_secs,
            qps: qps(summary.total_requests, elapsed_secs),
            dropped_requests: summary.dropped_requests,
            ceiling_ms: summary.histogram.ceiling(),
            overflow: summary.histogram.overflow(),
            percentiles: cumulative_percentiles(summary),
        }
    }
}

/// Requests per whole second. A run shorter than one second reports the
/// request count itself.
pub fn qps(total_requests: u64, elapsed_secs: u64) -> u64 {
    if elapsed_secs > 0 {
        total_requests / elapsed_secs
    } else {
        total_requests
    }
}

/// Walk the buckets in latency order, emitting one line per non-empty bucket
/// with the share of `total_requests` completed at or below that latency.
///
/// Percentages are relative to the configured request count, not to what was
/// recorded, and the walk stops once the running count reaches it.
fn cumulative_percentiles(summary: &RunSummary) -> Vec<PercentileLine> {
    let total = summary.total_requests;
    let mut lines = Vec::new();
    let mut cumulative = 0u64;

    for (latency_ms, count) in summary.histogram.iter_nonzero() {
        if cumulative >= total {
            break;
        }
        cumulative += count;
        lines.push(PercentileLine {
            percent: 100.0 * (cumulative as f64 / total as f64),
            latency_ms,
        });
    }
    lines
}

impl fmt::Display for PercentileLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}% <= {}ms", self.percent, self.latency_ms)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "================== {} =================", self.op)?;
        writeln!(
            f,
            "{} requests completed in {} seconds",
            self.total_requests, self.elapsed_secs
        )?;
        writeln!(f, "{} parallel clients", self.concurrency)?;
        writeln!(f, "{} queries per second", self.qps)?;
        writeln!(f)?;

        for line in &self.percentiles {
            writeln!(f, "{line}")?;
        }

        if self.dropped_requests > 0 {
            writeln!(
                f,
                "{} requests not executed ({} not divisible by {})",
                self.dropped_requests, self.total_requests, self.concurrency
            )?;
        }
        Ok(())
    }
}

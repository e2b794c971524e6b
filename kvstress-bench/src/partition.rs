use std::ops::Range;

/// A contiguous range of logical request indices owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPartition {
    pub start: u64,
    pub count: u64,
}

impl WorkPartition {
    pub fn indices(&self) -> Range<u64> {
        self.start..self.start + self.count
    }
}

/// What to do with `total % concurrency` requests that do not divide evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Never execute them. Compatible with the classic benchmark behavior.
    #[default]
    Drop,
    /// Give one extra request to each of the first `total % concurrency` workers.
    Spread,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitions {
    pub parts: Vec<WorkPartition>,
    /// Requests no worker will execute.
    pub dropped: u64,
}

impl Partitions {
    pub fn assigned(&self) -> u64 {
        self.parts.iter().map(|p| p.count).sum()
    }
}

/// Split `[0, total)` into `concurrency` back-to-back partitions.
///
/// `concurrency` must be non-zero; `BenchConfig::validate` guarantees this.
pub fn partition(total: u64, concurrency: usize, policy: RemainderPolicy) -> Partitions {
    let workers = concurrency as u64;
    let size = total / workers;
    let remainder = total % workers;

    let mut parts = Vec::with_capacity(concurrency);
    let mut offset = 0;
    for k in 0..workers {
        let extra = match policy {
            RemainderPolicy::Spread if k < remainder => 1,
            _ => 0,
        };
        let count = size + extra;
        parts.push(WorkPartition { start: offset, count });
        offset += count;
    }

    let dropped = match policy {
        RemainderPolicy::Drop => remainder,
        RemainderPolicy::Spread => 0,
    };
    Partitions { parts, dropped }
}

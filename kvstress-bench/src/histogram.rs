use parking_lot::Mutex;

/// Latencies at or above this many milliseconds land in the overflow counter.
pub const DEFAULT_CEILING_MS: u64 = 2_000;

/// One counter per whole millisecond in `0..ceiling`, plus an overflow counter.
///
/// It works like a counting sort: a 2 ms operation bumps `buckets[2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    buckets: Vec<u64>,
    overflow: u64,
}

impl Histogram {
    pub fn new(ceiling_ms: u64) -> Self {
        Self { buckets: vec![0; ceiling_ms as usize], overflow: 0 }
    }

    /// Count one operation that took `latency_ms` whole milliseconds.
    pub fn record(&mut self, latency_ms: u64) {
        let slot = usize::try_from(latency_ms).ok().and_then(|i| self.buckets.get_mut(i));
        match slot {
            Some(count) => *count += 1,
            None => self.overflow += 1,
        }
    }

    /// Add every counter of `other` into `self`.
    ///
    /// Both histograms must share a ceiling; counters of `other` beyond this
    /// ceiling are folded into overflow.
    pub fn merge(&mut self, other: &Histogram) {
        for (latency_ms, &count) in other.buckets.iter().enumerate() {
            match self.buckets.get_mut(latency_ms) {
                Some(slot) => *slot += count,
                None => self.overflow += count,
            }
        }
        self.overflow += other.overflow;
    }

    pub fn ceiling(&self) -> u64 {
        self.buckets.len() as u64
    }

    /// Count for the bucket at `latency_ms`; 0 at or past the ceiling.
    pub fn bucket(&self, latency_ms: u64) -> u64 {
        usize::try_from(latency_ms)
            .ok()
            .and_then(|i| self.buckets.get(i))
            .copied()
            .unwrap_or(0)
    }

    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Every recorded operation, overflow included.
    pub fn total(&self) -> u64 {
        self.buckets.iter().sum::<u64>() + self.overflow
    }

    /// `(latency_ms, count)` for each non-empty in-range bucket, in increasing latency.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(latency_ms, &count)| (latency_ms as u64, count))
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING_MS)
    }
}

/// A [`Histogram`] many workers can feed at once.
///
/// Every increment happens under one lock, so no update is ever lost.
/// `snapshot` is only meaningful once every producer has finished.
#[derive(Debug)]
pub struct SharedHistogram {
    inner: Mutex<Histogram>,
}

impl SharedHistogram {
    pub fn new(ceiling_ms: u64) -> Self {
        Self { inner: Mutex::new(Histogram::new(ceiling_ms)) }
    }

    pub fn record(&self, latency_ms: u64) {
        self.inner.lock().record(latency_ms);
    }

    /// Fold a worker's local histogram in with a single lock acquisition.
    pub fn merge_from(&self, local: &Histogram) {
        self.inner.lock().merge(local);
    }

    pub fn snapshot(&self) -> Histogram {
        self.inner.lock().clone()
    }
}

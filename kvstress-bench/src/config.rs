use kvstress_common::{OpKind, Result, StressError, Target};

use crate::histogram::DEFAULT_CEILING_MS;
use crate::partition::RemainderPolicy;

pub const DEFAULT_REQUESTS: u64 = 200_000;
pub const DEFAULT_CLIENTS: usize = 20;
pub const DEFAULT_POOL_SIZE: usize = 20;
pub const DEFAULT_KEY: &str = "pikatest";
/// Upper bound for `ceiling_ms`; the histogram holds one counter per millisecond.
pub const MAX_CEILING_MS: u64 = 60_000;

/// Everything a run needs, fixed before the first connection is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    pub target: Target,
    pub op: OpKind,
    pub total_requests: u64,
    pub concurrency: usize,
    pub pool_size: usize,
    /// Collection name; members are this key followed by the request index.
    pub key: String,
    pub ceiling_ms: u64,
    pub remainder: RemainderPolicy,
}

impl BenchConfig {
    pub fn new(op: OpKind) -> Self {
        Self {
            target: Target::default(),
            op,
            total_requests: DEFAULT_REQUESTS,
            concurrency: DEFAULT_CLIENTS,
            pool_size: DEFAULT_POOL_SIZE,
            key: DEFAULT_KEY.to_string(),
            ceiling_ms: DEFAULT_CEILING_MS,
            remainder: RemainderPolicy::Drop,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(StressError::InvalidConfig(
                "clients must be greater than zero".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(StressError::InvalidConfig(
                "pool size must be greater than zero".to_string(),
            ));
        }
        if self.ceiling_ms == 0 {
            return Err(StressError::InvalidConfig(
                "histogram ceiling must be at least 1 ms".to_string(),
            ));
        }
        if self.ceiling_ms > MAX_CEILING_MS {
            return Err(StressError::InvalidConfig(format!(
                "histogram ceiling must be at most {MAX_CEILING_MS} ms, got {}",
                self.ceiling_ms
            )));
        }
        Ok(())
    }
}

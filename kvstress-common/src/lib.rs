use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

/// Error types for kvstress runs
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StressError {
    #[error("Failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("{op} {member} failed: {reason}")]
    Command { op: OpKind, member: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown operation {0:?}")]
    UnknownOp(String),

    #[error("Worker task failed: {0}")]
    WorkerFailed(String),
}

/// Result type for kvstress operations
pub type Result<T> = std::result::Result<T, StressError>;

/// The single store operation a run issues, one per logical request index.
///
/// | Kind        | Command     | Arguments               |
/// |-------------|-------------|-------------------------|
/// | `Sadd`      | `SADD`      | key member              |
/// | `Srem`      | `SREM`      | key member              |
/// | `Sismember` | `SISMEMBER` | key member              |
/// | `Zadd`      | `ZADD`      | key index member        |
/// | `Zrem`      | `ZREM`      | key member              |
/// | `Zrank`     | `ZRANK`     | key member              |
/// | `Zscore`    | `ZSCORE`    | key member              |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Sadd,
    Srem,
    Sismember,
    Zadd,
    Zrem,
    Zrank,
    Zscore,
}

impl OpKind {
    pub const ALL: [OpKind; 7] = [
        OpKind::Sadd,
        OpKind::Srem,
        OpKind::Sismember,
        OpKind::Zadd,
        OpKind::Zrem,
        OpKind::Zrank,
        OpKind::Zscore,
    ];

    /// Parse a lowercase operation name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_name() == name)
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            OpKind::Sadd => "sadd",
            OpKind::Srem => "srem",
            OpKind::Sismember => "sismember",
            OpKind::Zadd => "zadd",
            OpKind::Zrem => "zrem",
            OpKind::Zrank => "zrank",
            OpKind::Zscore => "zscore",
        }
    }

    /// Command name as sent on the wire.
    pub fn command(&self) -> &'static str {
        match self {
            OpKind::Sadd => "SADD",
            OpKind::Srem => "SREM",
            OpKind::Sismember => "SISMEMBER",
            OpKind::Zadd => "ZADD",
            OpKind::Zrem => "ZREM",
            OpKind::Zrank => "ZRANK",
            OpKind::Zscore => "ZSCORE",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name())
    }
}

/// Where the store under test lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, password: None, db: 0 }
    }

    /// `host:port`, used in diagnostics.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

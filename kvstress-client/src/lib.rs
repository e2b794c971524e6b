use kvstress_common::{Result, StressError, Target};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::future::Future;
use thiserror::Error;
use tracing::debug;

#[cfg(feature = "mock")]
pub mod mock;
pub mod pool;

pub use pool::{ConnectionPool, PooledConnection};

/// A store-side failure for a single command (error reply or broken connection).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CommandFailure(pub String);

/// One open connection to the store under test.
///
/// Replies are discarded: the harness only cares whether the command
/// succeeded and how long it took.
pub trait Connection: Send + 'static {
    fn execute(
        &mut self,
        command: &str,
        args: &[String],
    ) -> impl Future<Output = std::result::Result<(), CommandFailure>> + Send;
}

/// Opens new connections for a [`ConnectionPool`].
pub trait Dialer: Send + Sync + 'static {
    type Conn: Connection;

    /// `host:port` of the target, used in diagnostics.
    fn addr(&self) -> String;

    fn dial(&self) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// Dials the target with the `redis` client over tokio.
pub struct RedisDialer {
    client: redis::Client,
    addr: String,
}

impl RedisDialer {
    /// Validate `target` and prepare a dialer. No connection is opened yet.
    pub fn new(target: &Target) -> Result<Self> {
        let client = redis::Client::open(connection_info(target))
            .map_err(|e| StressError::InvalidConfig(format!("target {}: {e}", target.addr())))?;
        Ok(Self { client, addr: target.addr() })
    }
}

/// Connection parameters for `target`, passed to the client as-is.
///
/// Nothing goes through a URL, so a password may hold any character.
pub fn connection_info(target: &Target) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(target.host.clone(), target.port),
        redis: RedisConnectionInfo {
            db: target.db,
            password: target.password.clone(),
            ..Default::default()
        },
    }
}

impl Dialer for RedisDialer {
    type Conn = RedisConnection;

    fn addr(&self) -> String {
        self.addr.clone()
    }

    async fn dial(&self) -> Result<RedisConnection> {
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StressError::Connect { addr: self.addr.clone(), reason: e.to_string() })?;
        debug!(addr = %self.addr, "connection established");
        Ok(RedisConnection { conn })
    }
}

pub struct RedisConnection {
    conn: redis::aio::MultiplexedConnection,
}

impl Connection for RedisConnection {
    async fn execute(
        &mut self,
        command: &str,
        args: &[String],
    ) -> std::result::Result<(), CommandFailure> {
        let mut cmd = redis::cmd(command);
        for arg in args {
            cmd.arg(arg);
        }
        let _: redis::Value = cmd
            .query_async(&mut self.conn)
            .await
            .map_err(|e| CommandFailure(e.to_string()))?;
        Ok(())
    }
}

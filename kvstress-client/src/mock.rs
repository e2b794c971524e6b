//! In-memory connections for exercising the harness without a live store.

use kvstress_common::{Result, StressError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{CommandFailure, Connection, Dialer};

pub const MOCK_ADDR: &str = "mock:0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

/// Everything the mock connections of one dialer were asked to do.
#[derive(Debug, Default)]
pub struct MockLog {
    commands: Mutex<Vec<Command>>,
    dials: AtomicUsize,
}

impl MockLog {
    /// Successfully executed commands, in completion order.
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockDialer {
    log: Arc<MockLog>,
    latency: Duration,
    fail_member: Option<String>,
    max_dials: Option<usize>,
}

impl MockDialer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command sleeps for `latency` before completing.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Any command carrying `member` as an argument fails with an error reply.
    pub fn failing_on(mut self, member: impl Into<String>) -> Self {
        self.fail_member = Some(member.into());
        self
    }

    /// Dials beyond the first `dials` are refused.
    pub fn refusing_after(mut self, dials: usize) -> Self {
        self.max_dials = Some(dials);
        self
    }

    pub fn log(&self) -> Arc<MockLog> {
        Arc::clone(&self.log)
    }
}

impl Dialer for MockDialer {
    type Conn = MockConnection;

    fn addr(&self) -> String {
        MOCK_ADDR.to_string()
    }

    async fn dial(&self) -> Result<MockConnection> {
        let attempt = self.log.dials.fetch_add(1, Ordering::SeqCst);
        if self.max_dials.is_some_and(|max| attempt >= max) {
            return Err(StressError::Connect {
                addr: MOCK_ADDR.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(MockConnection {
            log: Arc::clone(&self.log),
            latency: self.latency,
            fail_member: self.fail_member.clone(),
        })
    }
}

pub struct MockConnection {
    log: Arc<MockLog>,
    latency: Duration,
    fail_member: Option<String>,
}

impl Connection for MockConnection {
    async fn execute(
        &mut self,
        command: &str,
        args: &[String],
    ) -> std::result::Result<(), CommandFailure> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(member) = &self.fail_member {
            if args.iter().any(|a| a == member) {
                return Err(CommandFailure(format!("ERR injected failure for {member}")));
            }
        }
        self.log.commands.lock().push(Command {
            name: command.to_string(),
            args: args.to_vec(),
        });
        Ok(())
    }
}

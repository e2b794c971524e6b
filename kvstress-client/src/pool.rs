use kvstress_common::Result;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::Dialer;

/// A fixed set of idle connections plus on-demand dialing.
///
/// `size` connections are opened up front so an unreachable target fails the
/// run before any work starts. Leasing from an empty pool dials a fresh
/// connection; returning a lease to a full pool closes it.
pub struct ConnectionPool<D: Dialer> {
    dialer: D,
    idle: Mutex<Vec<D::Conn>>,
    max_idle: usize,
}

impl<D: Dialer> ConnectionPool<D> {
    pub async fn connect(dialer: D, size: usize) -> Result<Arc<Self>> {
        let mut idle = Vec::with_capacity(size);
        for _ in 0..size {
            idle.push(dialer.dial().await?);
        }
        debug!(addr = %dialer.addr(), size, "connection pool ready");
        Ok(Arc::new(Self { dialer, idle: Mutex::new(idle), max_idle: size }))
    }

    /// Take an idle connection, or dial a new one when none is left.
    pub async fn lease(pool: &Arc<Self>) -> Result<PooledConnection<D>> {
        let idle = pool.idle.lock().pop();
        let conn = match idle {
            Some(conn) => conn,
            None => {
                trace!(addr = %pool.dialer.addr(), "pool empty, dialing");
                pool.dialer.dial().await?
            }
        };
        Ok(PooledConnection { conn: Some(conn), pool: Arc::clone(pool) })
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    fn release(&self, conn: D::Conn) {
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }
}

/// A leased connection. Dropping it hands the connection back to its pool.
pub struct PooledConnection<D: Dialer> {
    // Only `None` while being dropped.
    conn: Option<D::Conn>,
    pool: Arc<ConnectionPool<D>>,
}

impl<D: Dialer> Deref for PooledConnection<D> {
    type Target = D::Conn;

    fn deref(&self) -> &D::Conn {
        self.conn.as_ref().expect("connection is present until drop")
    }
}

impl<D: Dialer> DerefMut for PooledConnection<D> {
    fn deref_mut(&mut self) -> &mut D::Conn {
        self.conn.as_mut().expect("connection is present until drop")
    }
}

impl<D: Dialer> Drop for PooledConnection<D> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

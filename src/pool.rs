use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::client::Client;
use crate::connection::{Connection, ConnectionLike, IntoConnectionInfo};
use crate::types::{ErrorKind, RedisResult};

/// Tuning knobs for a [`Pool`].
///
/// The server address is not part of the configuration; it is the
/// `IntoConnectionInfo` parameter of [`Pool::open`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of simultaneously live connections.
    pub size: usize,
    /// How long a checkout waits for a connection when the pool is
    /// saturated before failing with
    /// [`ErrorKind::PoolTimeout`](crate::ErrorKind::PoolTimeout).
    pub checkout_timeout: Duration,
    /// Per-connection TCP connect deadline.
    pub connect_timeout: Duration,
    /// Initial read deadline assigned to newly created connections.
    pub read_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> PoolConfig {
        PoolConfig {
            size: 5,
            checkout_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
struct PoolState {
    idle: VecDeque<Connection>,
    // idle + checked out; never exceeds config.size
    total: usize,
    // FIFO queue of waiting checkouts
    waiters: VecDeque<u64>,
    next_ticket: u64,
    closed: bool,
}

#[derive(Debug)]
struct PoolInner {
    client: Client,
    config: PoolConfig,
    state: Mutex<PoolState>,
    available: Condvar,
}

/// A snapshot of the pool's bookkeeping, mostly useful for tests and
/// monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections sitting idle in the pool.
    pub idle: usize,
    /// Live connections, idle and checked out combined.
    pub total: usize,
}

/// A bounded, thread-safe pool of connections to one redis server.
///
/// Connections are created lazily up to the configured size.  A checkout
/// hands the caller exclusive access to one connection; when the guard is
/// dropped the connection returns to the pool, unless a fault was observed
/// on it, in which case it is discarded and the slot freed for a
/// replacement.  Waiting checkouts are served in arrival order.
///
/// ```rust,no_run
/// # fn run() -> redsync::RedisResult<()> {
/// let pool = redsync::Pool::open("redis://127.0.0.1/")?;
/// let reply = pool.with(|con| redsync::cmd("PING").query(con))?;
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Creates a pool with the default configuration.
    pub fn open<T: IntoConnectionInfo>(params: T) -> RedisResult<Pool> {
        Pool::with_config(params, PoolConfig::default())
    }

    /// Creates a pool with an explicit configuration.
    pub fn with_config<T: IntoConnectionInfo>(params: T, config: PoolConfig) -> RedisResult<Pool> {
        if config.size == 0 {
            fail!((
                ErrorKind::InvalidClientConfig,
                "Pool size must be at least 1"
            ));
        }
        let client = Client::open(params)?;
        Ok(Pool {
            inner: Arc::new(PoolInner {
                client,
                config,
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    total: 0,
                    waiters: VecDeque::new(),
                    next_ticket: 0,
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        })
    }

    /// Checks out a connection, waiting up to the configured checkout
    /// timeout when the pool is saturated.
    ///
    /// The returned guard dereferences to [`Connection`] and checks the
    /// connection back in when dropped, on every exit path.  A connection
    /// that observed a fault while checked out reports `is_open() ==
    /// false` and is closed instead of returned.
    pub fn get(&self) -> RedisResult<PooledConnection> {
        let deadline = Instant::now() + self.inner.config.checkout_timeout;
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");

        if state.closed {
            fail!((ErrorKind::ClientError, "Pool has been shut down"));
        }

        // Fast path: nobody queued ahead of us.
        if state.waiters.is_empty() {
            if let Some(conn) = state.idle.pop_front() {
                return Ok(PooledConnection::new(&self.inner, conn));
            }
            if state.total < self.inner.config.size {
                state.total += 1;
                drop(state);
                return self.connect_reserved_slot();
            }
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.waiters.push_back(ticket);

        loop {
            if state.closed {
                remove_ticket(&mut state.waiters, ticket);
                fail!((ErrorKind::ClientError, "Pool has been shut down"));
            }

            if state.waiters.front() == Some(&ticket) {
                if let Some(conn) = state.idle.pop_front() {
                    state.waiters.pop_front();
                    self.inner.available.notify_all();
                    return Ok(PooledConnection::new(&self.inner, conn));
                }
                if state.total < self.inner.config.size {
                    state.waiters.pop_front();
                    state.total += 1;
                    self.inner.available.notify_all();
                    drop(state);
                    return self.connect_reserved_slot();
                }
            }

            let now = Instant::now();
            if now >= deadline {
                remove_ticket(&mut state.waiters, ticket);
                // the next queued waiter may be eligible where we were not
                self.inner.available.notify_all();
                fail!((
                    ErrorKind::PoolTimeout,
                    "Timed out waiting for a pooled connection"
                ));
            }
            let (guard, _) = self
                .inner
                .available
                .wait_timeout(state, deadline - now)
                .expect("pool mutex poisoned");
            state = guard;
        }
    }

    // A slot in `total` has already been reserved for us; either produce
    // a live connection or give the slot back.
    fn connect_reserved_slot(&self) -> RedisResult<PooledConnection> {
        let result = self
            .inner
            .client
            .get_connection_with_timeout(self.inner.config.connect_timeout)
            .and_then(|mut conn| {
                conn.set_read_timeout(Some(self.inner.config.read_timeout))?;
                Ok(conn)
            });
        match result {
            Ok(conn) => {
                debug!(
                    "pool opened connection to {}",
                    self.inner.client.get_connection_info().addr
                );
                Ok(PooledConnection::new(&self.inner, conn))
            }
            Err(err) => {
                let mut state = self.inner.state.lock().expect("pool mutex poisoned");
                state.total -= 1;
                self.inner.available.notify_all();
                Err(err)
            }
        }
    }

    /// Scoped access: checks out a connection, runs `f` on it, and checks
    /// it back in whatever happens, panics included.
    ///
    /// If `f` fails because of a connection fault the connection is
    /// discarded on check-in; a server error reply does not poison it.
    pub fn with<T, F>(&self, f: F) -> RedisResult<T>
    where
        F: FnOnce(&mut Connection) -> RedisResult<T>,
    {
        let mut conn = self.get()?;
        f(&mut conn)
    }

    /// Closes every idle connection and rejects all future checkouts.
    ///
    /// Connections that are currently checked out are closed as their
    /// guards are dropped.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        if state.closed {
            return;
        }
        state.closed = true;
        while let Some(mut conn) = state.idle.pop_front() {
            conn.close();
            state.total -= 1;
        }
        debug!(
            "pool for {} shut down",
            self.inner.client.get_connection_info().addr
        );
        self.inner.available.notify_all();
    }

    /// Reports the current idle and total connection counts.
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock().expect("pool mutex poisoned");
        PoolStatus {
            idle: state.idle.len(),
            total: state.total,
        }
    }
}

fn remove_ticket(waiters: &mut VecDeque<u64>, ticket: u64) {
    if let Some(pos) = waiters.iter().position(|&t| t == ticket) {
        waiters.remove(pos);
    }
}

/// A connection checked out of a [`Pool`].
///
/// Dereferences to [`Connection`].  Dropping the guard returns the
/// connection to the pool, or discards it when it is no longer open.
#[derive(Debug)]
pub struct PooledConnection {
    inner: Arc<PoolInner>,
    conn: Option<Connection>,
}

impl PooledConnection {
    fn new(inner: &Arc<PoolInner>, conn: Connection) -> PooledConnection {
        PooledConnection {
            inner: Arc::clone(inner),
            conn: Some(conn),
        }
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection taken")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection taken")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => return,
        };
        let mut state = self.inner.state.lock().expect("pool mutex poisoned");
        if state.closed {
            conn.close();
            state.total -= 1;
        } else if conn.is_open() {
            state.idle.push_back(conn);
        } else {
            warn!(
                "pool discarding faulted connection to {}",
                self.inner.client.get_connection_info().addr
            );
            conn.close();
            state.total -= 1;
        }
        self.inner.available.notify_all();
    }
}

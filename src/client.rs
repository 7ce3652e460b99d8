use std::time::Duration;

use crate::connection::{connect, Connection, ConnectionInfo, ConnectionLike, IntoConnectionInfo};
use crate::types::{RedisResult, Value};

/// The client type.  It validates and holds connection parameters and
/// opens actual connections from them.
///
/// The client itself performs no I/O; creating one is cheap and never
/// touches the network.  When multiple threads need connections, hand
/// the client to a [`Pool`](crate::Pool) instead of opening one
/// connection per call site.
#[derive(Debug, Clone)]
pub struct Client {
    connection_info: ConnectionInfo,
}

impl Client {
    /// Connects to a redis server and returns a client.  This does not
    /// actually open a connection yet but it does perform some basic
    /// checks on the URL that might make the operation fail.
    pub fn open<T: IntoConnectionInfo>(params: T) -> RedisResult<Client> {
        Ok(Client {
            connection_info: params.into_connection_info()?,
        })
    }

    /// Instructs the client to actually connect to redis and returns a
    /// connection object.  The connection object can be used to send
    /// commands to the server.  This can fail with a variety of errors
    /// (like unreachable hosts) so it's important that you handle those
    /// errors.
    pub fn get_connection(&self) -> RedisResult<Connection> {
        connect(&self.connection_info, None)
    }

    /// Like [`get_connection`](Client::get_connection), but gives up
    /// with [`ErrorKind::ConnectError`](crate::ErrorKind::ConnectError)
    /// when the connection cannot be established within `timeout`.
    pub fn get_connection_with_timeout(&self, timeout: Duration) -> RedisResult<Connection> {
        connect(&self.connection_info, Some(timeout))
    }

    /// Returns a reference of client connection info object.
    pub fn get_connection_info(&self) -> &ConnectionInfo {
        &self.connection_info
    }
}

impl ConnectionLike for Client {
    fn req_packed_command(&mut self, cmd: &[u8]) -> RedisResult<Value> {
        self.get_connection()?.req_packed_command(cmd)
    }

    fn get_db(&self) -> i64 {
        self.connection_info.redis.db
    }

    fn check_connection(&mut self) -> bool {
        self.get_connection()
            .map(|mut conn| conn.check_connection())
            .unwrap_or(false)
    }

    fn is_open(&self) -> bool {
        true
    }
}

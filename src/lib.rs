//! redsync is a synchronous Rust client library for Redis speaking the
//! RESP v2 protocol.  It covers the low-level building blocks of a
//! client: encoding commands, parsing replies into a typed value tree,
//! and sharing connections between threads through a bounded pool.
//!
//! The crate is called `redsync` and you can depend on it via cargo:
//!
//! ```ini
//! [dependencies.redsync]
//! version = "*"
//! ```
//!
//! # Basic Operation
//!
//! For connecting to redis you create a client object which then can
//! produce actual connections:
//!
//! ```rust,no_run
//! fn do_something() -> redsync::RedisResult<()> {
//!     let client = redsync::Client::open("redis://127.0.0.1/")?;
//!     let mut con = client.get_connection()?;
//!
//!     /* do something here */
//!
//!     Ok(())
//! }
//! ```
//!
//! To execute commands you can use the [cmd] function which builds
//! redis requests.  Once you have configured a command object to your
//! liking you can send a query into any [ConnectionLike] object:
//!
//! ```rust,no_run
//! fn do_something(con: &mut redsync::Connection) -> redsync::RedisResult<()> {
//!     redsync::cmd("SET").arg("my_key").arg(42).exec(con)?;
//!     Ok(())
//! }
//! ```
//!
//! The reply of a query is the raw [Value] tree.  Server-reported errors
//! (`-ERR ...` frames) are part of that tree as [Value::ServerError];
//! they do not fail the query and they do not invalidate the connection.
//! Transport problems, timeouts and malformed frames on the other hand
//! are real errors, and a connection that produced one must be thrown
//! away.
//!
//! ## Connection Pooling
//!
//! A single [Connection] must not be shared between threads.  The
//! [Pool] hands out exclusive access to a bounded set of connections
//! instead, creating them lazily and replacing the ones that fail:
//!
//! ```rust,no_run
//! # fn do_something() -> redsync::RedisResult<()> {
//! use redsync::Commands;
//!
//! let pool = redsync::Pool::open("redis://127.0.0.1/")?;
//! let reply = pool.with(|con| con.set("my_key", 42))?;
//! # Ok(()) }
//! ```
//!
//! ## Connection Parameters
//!
//! redsync knows different ways to define where a connection should go.
//! The parameter to [Client::open] needs to implement the
//! [IntoConnectionInfo] trait of which there are a few implementations:
//!
//! * string slices in `redis://` URL format.
//! * URL objects from the redis-url crate.
//! * `(host, port)` tuples.
//! * [ConnectionInfo] objects.
//!
//! The URL format is `redis://[<username>][:<password>@]<hostname>[:port][/<db>]`
//!
//! If Unix socket support is available you can use a unix URL in this
//! format:
//!
//! `redis+unix:///<path>[?db=<db>[&pass=<password>][&user=<username>]]`
//!
//! Query parameters other than the ones shown above are ignored.
//!
//! ## High-Level Commands
//!
//! The [Commands] trait adds a method per common redis command to every
//! [ConnectionLike] object.  The methods are thin builders over
//! [Cmd::query]; each returns the reply tree unchanged:
//!
//! ```rust,no_run
//! use redsync::Commands;
//!
//! fn do_something(con: &mut redsync::Connection) -> redsync::RedisResult<()> {
//!     con.set("my_key", 42)?;
//!     let _val = con.get("my_key")?;
//!     Ok(())
//! }
//! ```

#![deny(non_camel_case_types)]
#![warn(missing_docs)]

pub use crate::client::Client;
pub use crate::cmd::{cmd, pack_command, Cmd};
pub use crate::commands::Commands;
pub use crate::connection::{
    connect, parse_redis_url, Connection, ConnectionAddr, ConnectionInfo, ConnectionLike,
    IntoConnectionInfo, RedisConnectionInfo,
};
pub use crate::parser::{parse_redis_value, BufferedReader, Deadline, Parser, ReplySource};
pub use crate::pool::{Pool, PoolConfig, PoolStatus, PooledConnection};
pub use crate::types::{
    // error and result types
    ErrorKind,
    RedisError,
    RedisResult,

    // command argument helpers
    ExistenceCheck,
    RedisWrite,
    SetExpiry,
    SetOptions,
    ToRedisArgs,

    // low level values
    ServerError,
    Value,
};

mod macros;

mod client;
mod cmd;
mod commands;
mod connection;
mod parser;
mod pool;
mod types;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_send() {
        const fn assert_send<T: Send>() {}

        assert_send::<Connection>();
        assert_send::<Pool>();
    }
}

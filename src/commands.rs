use crate::cmd::{cmd, Cmd};
use crate::connection::ConnectionLike;
use crate::types::{RedisResult, SetOptions, ToRedisArgs, Value};

macro_rules! implement_commands {
    (
        $(
            $(#[$attr:meta])+
            fn $name:ident<$($tyargs:ident : $ty:ident),*>(
                $($argname:ident: $argty:ty),*) $body:block
        )*
    ) =>
    (
        /// Implements common redis commands for connection like objects.
        /// This allows you to send commands straight to a connection or
        /// client.
        ///
        /// Every method returns the raw [`Value`] tree, server error
        /// replies included; the catalogue never raises on a `-...`
        /// reply.  Use [`Value::extract_error`] or [`Cmd::exec`] where
        /// raising semantics are wanted.
        ///
        /// This allows you to use nicer syntax for some common
        /// operations.  For instance this code:
        ///
        /// ```rust,no_run
        /// # fn do_something() -> redsync::RedisResult<()> {
        /// let client = redsync::Client::open("redis://127.0.0.1/")?;
        /// let mut con = client.get_connection()?;
        /// redsync::cmd("SET").arg("my_key").arg(42).exec(&mut con)?;
        /// let val = redsync::cmd("GET").arg("my_key").query(&mut con)?;
        /// # Ok(()) }
        /// ```
        ///
        /// Will become this:
        ///
        /// ```rust,no_run
        /// # fn do_something() -> redsync::RedisResult<()> {
        /// use redsync::Commands;
        /// let client = redsync::Client::open("redis://127.0.0.1/")?;
        /// let mut con = client.get_connection()?;
        /// con.set("my_key", 42)?;
        /// let val = con.get("my_key")?;
        /// # Ok(()) }
        /// ```
        pub trait Commands : ConnectionLike + Sized {
            $(
                $(#[$attr])*
                #[inline]
                fn $name<$($tyargs: $ty),*>(
                    &mut self $(, $argname: $argty)*) -> RedisResult<Value>
                    { Cmd::$name($($argname),*).query(self) }
            )*
        }

        impl Cmd {
            $(
                $(#[$attr])*
                pub fn $name<$($tyargs: $ty),*>($($argname: $argty),*) -> Self {
                    ::std::mem::replace($body, Cmd::new())
                }
            )*
        }

        impl<T> Commands for T where T: ConnectionLike {}
    )
}

implement_commands! {
    // connection

    /// Ping the server.
    fn ping<>() {
        &mut cmd("PING")
    }

    /// Return `message` unchanged.
    fn echo<M: ToRedisArgs>(message: M) {
        cmd("ECHO").arg(message)
    }

    /// Authenticate with a password.
    ///
    /// A wrong password comes back as a server error *value*; the
    /// connect-time handshake raises it instead.
    fn auth<P: ToRedisArgs>(password: P) {
        cmd("AUTH").arg(password)
    }

    /// Switch to another logical database.
    fn select<>(db: i64) {
        cmd("SELECT").arg(db)
    }

    // most common operations

    /// Get the value of a key.
    fn get<K: ToRedisArgs>(key: K) {
        cmd("GET").arg(key)
    }

    /// Get the values of all given keys.
    fn mget<K: ToRedisArgs>(keys: K) {
        cmd("MGET").arg(keys)
    }

    /// Gets all keys matching a pattern.
    fn keys<P: ToRedisArgs>(pattern: P) {
        cmd("KEYS").arg(pattern)
    }

    /// Set the string value of a key.
    fn set<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V) {
        cmd("SET").arg(key).arg(value)
    }

    /// Set the string value of a key with options (`NX`/`XX`, `GET`,
    /// expiry).
    fn set_options<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V, options: SetOptions) {
        cmd("SET").arg(key).arg(value).arg(options)
    }

    /// Set the value and expiration of a key.
    fn set_ex<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V, seconds: u64) {
        cmd("SETEX").arg(key).arg(seconds).arg(value)
    }

    /// Set the value of a key, only if the key does not exist.
    fn set_nx<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V) {
        cmd("SETNX").arg(key).arg(value)
    }

    /// Set the string value of a key and return its old value.
    fn getset<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V) {
        cmd("GETSET").arg(key).arg(value)
    }

    /// Append a value to a key.
    fn append<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V) {
        cmd("APPEND").arg(key).arg(value)
    }

    /// Get the length of the value stored in a key.
    fn strlen<K: ToRedisArgs>(key: K) {
        cmd("STRLEN").arg(key)
    }

    /// Delete one or more keys.
    fn del<K: ToRedisArgs>(key: K) {
        cmd("DEL").arg(key)
    }

    /// Determine if one or more keys exist.
    fn exists<K: ToRedisArgs>(key: K) {
        cmd("EXISTS").arg(key)
    }

    /// Set a key's time to live in seconds.
    fn expire<K: ToRedisArgs>(key: K, seconds: i64) {
        cmd("EXPIRE").arg(key).arg(seconds)
    }

    /// Get the time to live for a key in seconds.
    fn ttl<K: ToRedisArgs>(key: K) {
        cmd("TTL").arg(key)
    }

    /// Remove the expiration from a key.
    fn persist<K: ToRedisArgs>(key: K) {
        cmd("PERSIST").arg(key)
    }

    /// Rename a key.
    fn rename<K: ToRedisArgs, N: ToRedisArgs>(key: K, new_key: N) {
        cmd("RENAME").arg(key).arg(new_key)
    }

    /// Increment the numeric value of a key by one.
    fn incr<K: ToRedisArgs>(key: K) {
        cmd("INCR").arg(key)
    }

    /// Increment the numeric value of a key by the given amount.
    fn incr_by<K: ToRedisArgs>(key: K, delta: i64) {
        cmd("INCRBY").arg(key).arg(delta)
    }

    /// Increment the float value of a key by the given amount.
    fn incr_by_float<K: ToRedisArgs>(key: K, delta: f64) {
        cmd("INCRBYFLOAT").arg(key).arg(delta)
    }

    /// Decrement the numeric value of a key by one.
    fn decr<K: ToRedisArgs>(key: K) {
        cmd("DECR").arg(key)
    }

    // hashes

    /// Get the value of a hash field.
    fn hget<K: ToRedisArgs, F: ToRedisArgs>(key: K, field: F) {
        cmd("HGET").arg(key).arg(field)
    }

    /// Set the value of a hash field.
    fn hset<K: ToRedisArgs, F: ToRedisArgs, V: ToRedisArgs>(key: K, field: F, value: V) {
        cmd("HSET").arg(key).arg(field).arg(value)
    }

    /// Delete one or more hash fields.
    fn hdel<K: ToRedisArgs, F: ToRedisArgs>(key: K, field: F) {
        cmd("HDEL").arg(key).arg(field)
    }

    /// Get all the fields and values in a hash.
    fn hgetall<K: ToRedisArgs>(key: K) {
        cmd("HGETALL").arg(key)
    }

    /// Get all the fields in a hash.
    fn hkeys<K: ToRedisArgs>(key: K) {
        cmd("HKEYS").arg(key)
    }

    /// Get the number of fields in a hash.
    fn hlen<K: ToRedisArgs>(key: K) {
        cmd("HLEN").arg(key)
    }

    // lists

    /// Get the length of a list.
    fn llen<K: ToRedisArgs>(key: K) {
        cmd("LLEN").arg(key)
    }

    /// Prepend one or more values to a list.
    fn lpush<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V) {
        cmd("LPUSH").arg(key).arg(value)
    }

    /// Append one or more values to a list.
    fn rpush<K: ToRedisArgs, V: ToRedisArgs>(key: K, value: V) {
        cmd("RPUSH").arg(key).arg(value)
    }

    /// Remove and return the first element of a list.
    fn lpop<K: ToRedisArgs>(key: K) {
        cmd("LPOP").arg(key)
    }

    /// Remove and return the last element of a list.
    fn rpop<K: ToRedisArgs>(key: K) {
        cmd("RPOP").arg(key)
    }

    /// Get a range of elements from a list.
    fn lrange<K: ToRedisArgs>(key: K, start: isize, stop: isize) {
        cmd("LRANGE").arg(key).arg(start).arg(stop)
    }

    // sets

    /// Add one or more members to a set.
    fn sadd<K: ToRedisArgs, M: ToRedisArgs>(key: K, member: M) {
        cmd("SADD").arg(key).arg(member)
    }

    /// Remove one or more members from a set.
    fn srem<K: ToRedisArgs, M: ToRedisArgs>(key: K, member: M) {
        cmd("SREM").arg(key).arg(member)
    }

    /// Get all the members of a set.
    fn smembers<K: ToRedisArgs>(key: K) {
        cmd("SMEMBERS").arg(key)
    }

    /// Determine if a given value is a member of a set.
    fn sismember<K: ToRedisArgs, M: ToRedisArgs>(key: K, member: M) {
        cmd("SISMEMBER").arg(key).arg(member)
    }

    /// Get the number of members in a set.
    fn scard<K: ToRedisArgs>(key: K) {
        cmd("SCARD").arg(key)
    }

    // sorted sets

    /// Add one member with a score to a sorted set.
    fn zadd<K: ToRedisArgs, M: ToRedisArgs>(key: K, member: M, score: f64) {
        cmd("ZADD").arg(key).arg(score).arg(member)
    }

    /// Add multiple `(score, member)` pairs to a sorted set.
    fn zadd_multiple<K: ToRedisArgs, M: ToRedisArgs>(key: K, items: Vec<(f64, M)>) {
        cmd("ZADD").arg(key).arg(items)
    }

    /// Get the number of members in a sorted set.
    fn zcard<K: ToRedisArgs>(key: K) {
        cmd("ZCARD").arg(key)
    }

    /// Get the score associated with the given member in a sorted set.
    fn zscore<K: ToRedisArgs, M: ToRedisArgs>(key: K, member: M) {
        cmd("ZSCORE").arg(key).arg(member)
    }

    /// Return a range of members in a sorted set, by index.
    fn zrange<K: ToRedisArgs>(key: K, start: isize, stop: isize) {
        cmd("ZRANGE").arg(key).arg(start).arg(stop)
    }

    /// Return a range of members in a sorted set, by index, with their
    /// scores interleaved.
    fn zrange_withscores<K: ToRedisArgs>(key: K, start: isize, stop: isize) {
        cmd("ZRANGE").arg(key).arg(start).arg(stop).arg("WITHSCORES")
    }

    /// Return members in a sorted set with scores within the given range.
    fn zrangebyscore<K: ToRedisArgs, L: ToRedisArgs, U: ToRedisArgs>(key: K, min: L, max: U) {
        cmd("ZRANGEBYSCORE").arg(key).arg(min).arg(max)
    }

    /// Like [`zrangebyscore`](Commands::zrangebyscore) with a
    /// `LIMIT offset count` window spliced in.
    fn zrangebyscore_limit<K: ToRedisArgs, L: ToRedisArgs, U: ToRedisArgs>(
        key: K, min: L, max: U, offset: isize, count: isize) {
        cmd("ZRANGEBYSCORE").arg(key).arg(min).arg(max)
            .arg("LIMIT").arg(offset).arg(count)
    }

    /// Remove one or more members from a sorted set.
    fn zrem<K: ToRedisArgs, M: ToRedisArgs>(key: K, member: M) {
        cmd("ZREM").arg(key).arg(member)
    }

    // server

    /// Return the number of keys in the current database.
    fn dbsize<>() {
        &mut cmd("DBSIZE")
    }

    /// Remove all keys from the current database.
    fn flushdb<>() {
        &mut cmd("FLUSHDB")
    }

    /// Remove all keys from all databases.
    fn flushall<>() {
        &mut cmd("FLUSHALL")
    }

    /// Return information and statistics about the server.
    fn info<>() {
        &mut cmd("INFO")
    }
}

use std::{fmt, io};

use crate::connection::ConnectionLike;
use crate::types::{RedisResult, RedisWrite, ToRedisArgs, Value};

fn count_digits(mut v: usize) -> usize {
    let mut result = 1;
    loop {
        if v < 10 {
            return result;
        }
        if v < 100 {
            return result + 1;
        }
        if v < 1000 {
            return result + 2;
        }
        if v < 10000 {
            return result + 3;
        }

        v /= 10000;
        result += 4;
    }
}

// `$<digits>\r\n<payload>\r\n`
#[inline]
fn bulk_len(len: usize) -> usize {
    1 + count_digits(len) + 2 + len + 2
}

fn args_len<'a, I>(args: I) -> usize
where
    I: Iterator<Item = &'a [u8]> + ExactSizeIterator,
{
    let mut totlen = 1 + count_digits(args.len()) + 2;
    for item in args {
        totlen += bulk_len(item.len());
    }
    totlen
}

fn write_command<'a, I>(out: &mut (impl ?Sized + io::Write), args: I) -> io::Result<()>
where
    I: Iterator<Item = &'a [u8]> + ExactSizeIterator,
{
    let mut buf = ::itoa::Buffer::new();

    out.write_all(b"*")?;
    out.write_all(buf.format(args.len()).as_bytes())?;
    out.write_all(b"\r\n")?;

    for item in args {
        out.write_all(b"$")?;
        out.write_all(buf.format(item.len()).as_bytes())?;
        out.write_all(b"\r\n")?;

        out.write_all(item)?;
        out.write_all(b"\r\n")?;
    }
    Ok(())
}

fn write_command_to_vec<'a, I>(out: &mut Vec<u8>, args: I)
where
    I: Iterator<Item = &'a [u8]> + ExactSizeIterator + Clone,
{
    let totlen = args_len(args.clone());
    out.reserve(totlen);
    // writing into a pre-sized Vec cannot fail
    write_command(out, args).unwrap()
}

/// A command acts as a builder interface to creating encoded redis
/// requests.  This allows you to easily assemble a packed command
/// by chaining arguments together.
///
/// Basic example:
///
/// ```rust
/// redsync::Cmd::new().arg("SET").arg("my_key").arg(42);
/// ```
///
/// There is also a helper function called `cmd` which makes it a
/// tiny bit shorter:
///
/// ```rust
/// redsync::cmd("SET").arg("my_key").arg(42);
/// ```
#[derive(Clone, Default)]
pub struct Cmd {
    data: Vec<u8>,
    // each entry is the offset into `data` that marks the end of the
    // corresponding argument
    args: Vec<usize>,
}

impl RedisWrite for Cmd {
    fn write_arg(&mut self, arg: &[u8]) {
        self.data.extend_from_slice(arg);
        self.args.push(self.data.len());
    }

    fn write_arg_fmt(&mut self, arg: impl fmt::Display) {
        use std::io::Write;
        write!(self.data, "{arg}").unwrap();
        self.args.push(self.data.len());
    }
}

impl Cmd {
    /// Creates a new empty command.
    pub fn new() -> Cmd {
        Cmd {
            data: vec![],
            args: vec![],
        }
    }

    /// Creates a new empty command with at least the requested capacity.
    pub fn with_capacity(arg_count: usize, size_of_data: usize) -> Cmd {
        Cmd {
            data: Vec::with_capacity(size_of_data),
            args: Vec::with_capacity(arg_count),
        }
    }

    /// Appends an argument to the command.  The argument passed must
    /// be a type that implements `ToRedisArgs`.  Most primitive types as
    /// well as vectors of primitive types implement it.
    ///
    /// For instance all of the following are valid:
    ///
    /// ```rust
    /// redsync::cmd("SET").arg(&["my_key", "my_value"]);
    /// redsync::cmd("SET").arg("my_key").arg(42);
    /// redsync::cmd("SET").arg("my_key").arg(b"my_value");
    /// ```
    #[inline]
    pub fn arg<T: ToRedisArgs>(&mut self, arg: T) -> &mut Cmd {
        arg.write_redis_args(self);
        self
    }

    /// Returns an iterator over the arguments in this command, the
    /// command name included.
    pub fn args_iter(&self) -> impl Iterator<Item = &[u8]> + ExactSizeIterator + Clone {
        let mut prev = 0;
        self.args.iter().map(move |&end| {
            let arg = &self.data[prev..end];
            prev = end;
            arg
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Returns the packed command as a byte vector, i.e. the unified
    /// request frame `*<N>\r\n($<len>\r\n<arg>\r\n)*`.
    ///
    /// The frame is built in one allocation whose size is computed from
    /// the argument lengths up front.  Argument bytes are passed through
    /// verbatim; nothing is escaped or validated.
    #[inline]
    pub fn get_packed_command(&self) -> Vec<u8> {
        let mut cmd = Vec::new();
        write_command_to_vec(&mut cmd, self.args_iter());
        cmd
    }

    /// Sends the command to the connection and returns the reply.
    ///
    /// Server error replies come back as `Ok(Value::ServerError(..))`;
    /// only transport and protocol failures produce `Err`.
    #[inline]
    pub fn query(&self, con: &mut dyn ConnectionLike) -> RedisResult<Value> {
        con.req_command(self)
    }

    /// Like [`query`](Cmd::query), but discards the reply and raises
    /// server error replies as failures.  Useful for commands like `SET`
    /// where only success matters.
    #[inline]
    pub fn exec(&self, con: &mut dyn ConnectionLike) -> RedisResult<()> {
        self.query(con)?.extract_error().map(|_| ())
    }
}

/// Shortcut function to creating a command with a single argument.
///
/// The first argument of a redis command is always the name of the command
/// which needs to be a string.  This is the recommended way to start a
/// command:
///
/// ```rust
/// redsync::cmd("PING");
/// ```
pub fn cmd(name: &str) -> Cmd {
    let mut rv = Cmd::new();
    rv.arg(name);
    rv
}

/// Packs a list of already formatted arguments into a request frame.
///
/// This is mostly useful to code that assembles argument lists without
/// going through the [`Cmd`] builder:
///
/// ```rust
/// # use redsync::ToRedisArgs;
/// let mut args = vec![];
/// args.extend("SET".to_redis_args());
/// args.extend("my_key".to_redis_args());
/// args.extend(42.to_redis_args());
/// let cmd = redsync::pack_command(&args);
/// assert_eq!(cmd, b"*3\r\n$3\r\nSET\r\n$6\r\nmy_key\r\n$2\r\n42\r\n".to_vec());
/// ```
pub fn pack_command(args: &[Vec<u8>]) -> Vec<u8> {
    let mut cmd = Vec::new();
    write_command_to_vec(&mut cmd, args.iter().map(|x| &x[..]));
    cmd
}

use std::error;
use std::fmt;
use std::io;
use std::str::from_utf8;

/// An enum of all error kinds.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Establishing a connection failed or timed out.
    ConnectError,
    /// An I/O failure on an established connection.
    IoError,
    /// A read or write did not complete before its deadline.
    Timeout,
    /// The server closed the connection while a reply was being read.
    Eof,
    /// The server sent a malformed reply frame.
    ProtocolError,
    /// No pooled connection became available within the acquisition timeout.
    PoolTimeout,
    /// An error reply from the server, converted into a failure on request.
    ResponseError,
    /// The authentication with the server failed.
    AuthenticationFailed,
    /// The parameters passed to the client were wrong.
    InvalidClientConfig,
    /// An error raised on the client before anything was sent.
    ClientError,
}

/// An error reply sent by the server (a `-...` frame).
///
/// This is a reply *value*, not a connection failure: the server answered,
/// the frame was well formed, and the connection remains usable.  Callers
/// that prefer raising semantics can convert it through
/// [`Value::extract_error`].
#[derive(PartialEq, Eq, Clone)]
pub struct ServerError {
    message: Vec<u8>,
}

impl ServerError {
    pub(crate) fn new(message: Vec<u8>) -> ServerError {
        ServerError { message }
    }

    /// The raw error line as sent by the server, without the leading `-`
    /// and the trailing CR/LF.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// The error code, i.e. the first word of the message (`ERR`,
    /// `WRONGTYPE`, ...).  `None` if the message is not valid UTF-8.
    pub fn code(&self) -> Option<&str> {
        from_utf8(&self.message).ok()?.split(' ').next()
    }

    /// Everything after the error code, if anything follows it.
    pub fn detail(&self) -> Option<&str> {
        from_utf8(&self.message).ok()?.split_once(' ').map(|(_, d)| d)
    }
}

impl fmt::Debug for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server-error({})", String::from_utf8_lossy(&self.message))
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        String::from_utf8_lossy(&self.message).fmt(f)
    }
}

/// Low-level reply value, mirroring the RESP v2 wire types one to one.
///
/// Replies form a tree: arrays may nest arbitrarily (bounded by the
/// parser's depth limit) but never share or cycle.  The null bulk string
/// and the null array are kept distinct from their empty counterparts.
#[derive(PartialEq, Eq, Clone)]
pub enum Value {
    /// A status line (`+OK`).  Never contains CR or LF.
    Status(Vec<u8>),
    /// An error reported by the server.  A value, not a failure.
    ServerError(ServerError),
    /// An integer reply.
    Int(i64),
    /// A bulk string payload.  `None` is the null bulk (`$-1`), which is
    /// distinct from the empty bulk `Some(vec![])`.
    Data(Option<Vec<u8>>),
    /// An array of replies.  `None` is the null array (`*-1`), distinct
    /// from the empty array.
    Bulk(Option<Vec<Value>>),
}

impl Value {
    /// True for the `+OK` status most write commands answer with.
    pub fn is_okay(&self) -> bool {
        matches!(self, Value::Status(s) if s == b"OK")
    }

    /// Returns `&[Value]` if `self` is a non-null array.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Bulk(Some(items)) => Some(&items[..]),
            _ => None,
        }
    }

    /// Returns the array elements, or `Err(self)` for any other variant.
    /// The null array converts to an empty vector.
    pub fn into_sequence(self) -> Result<Vec<Value>, Value> {
        match self {
            Value::Bulk(Some(items)) => Ok(items),
            Value::Bulk(None) => Ok(vec![]),
            other => Err(other),
        }
    }

    /// Converts a top-level [`Value::ServerError`] into a raised
    /// [`RedisError`] and passes every other reply through unchanged.
    ///
    /// Command wrappers do *not* call this; they hand the error value to
    /// the caller.  It exists for call sites with raising semantics, such
    /// as [`Cmd::exec`](crate::Cmd::exec) and the connect-time `AUTH`
    /// handshake.  Errors nested inside arrays are left in place.
    pub fn extract_error(self) -> RedisResult<Value> {
        match self {
            Value::ServerError(err) => Err(err.into()),
            other => Ok(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Status(ref s) => write!(fmt, "status({})", String::from_utf8_lossy(s)),
            Value::ServerError(ref err) => err.fmt(fmt),
            Value::Int(val) => write!(fmt, "int({val})"),
            Value::Data(None) => write!(fmt, "nil-data"),
            Value::Data(Some(ref val)) => match from_utf8(val) {
                Ok(x) => write!(fmt, "string-data({x:?})"),
                Err(_) => write!(fmt, "binary-data({val:?})"),
            },
            Value::Bulk(None) => write!(fmt, "nil-bulk"),
            Value::Bulk(Some(ref values)) => {
                write!(fmt, "bulk(")?;
                let mut is_first = true;
                for val in values.iter() {
                    if !is_first {
                        write!(fmt, ", ")?;
                    }
                    write!(fmt, "{val:?}")?;
                    is_first = false;
                }
                write!(fmt, ")")
            }
        }
    }
}

/// Represents a redis error.  For the most part you should be using
/// the Error trait to interact with this rather than the actual
/// struct.
pub struct RedisError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
    IoError(ErrorKind, io::Error),
}

impl PartialEq for RedisError {
    fn eq(&self, other: &RedisError) -> bool {
        self.kind() == other.kind()
    }
}

fn classify_io_error(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::Timeout,
        io::ErrorKind::UnexpectedEof => ErrorKind::Eof,
        _ => ErrorKind::IoError,
    }
}

impl From<io::Error> for RedisError {
    fn from(err: io::Error) -> RedisError {
        let kind = classify_io_error(&err);
        RedisError {
            repr: ErrorRepr::IoError(kind, err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for RedisError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> RedisError {
        RedisError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for RedisError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> RedisError {
        RedisError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

impl From<ServerError> for RedisError {
    fn from(err: ServerError) -> RedisError {
        let kind = match err.code() {
            Some("NOAUTH") | Some("WRONGPASS") => ErrorKind::AuthenticationFailed,
            _ => ErrorKind::ResponseError,
        };
        RedisError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                kind,
                "An error was signalled by the server",
                err.to_string(),
            ),
        }
    }
}

impl error::Error for RedisError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(_, ref err) => Some(err as &dyn error::Error),
            _ => None,
        }
    }
}

impl fmt::Display for RedisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => {
                desc.fmt(f)?;
                f.write_str(" - ")?;
                fmt::Debug::fmt(&kind, f)
            }
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                desc.fmt(f)?;
                f.write_str(" - ")?;
                fmt::Debug::fmt(&kind, f)?;
                f.write_str(": ")?;
                detail.fmt(f)
            }
            ErrorRepr::IoError(_, ref err) => err.fmt(f),
        }
    }
}

impl fmt::Debug for RedisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        fmt::Display::fmt(self, f)
    }
}

/// Indicates a general failure in the library.
impl RedisError {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _)
            | ErrorRepr::IoError(kind, _) => kind,
        }
    }

    /// Returns the error detail.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            _ => None,
        }
    }

    /// Returns the name of the error category for display purposes.
    pub fn category(&self) -> &str {
        match self.kind() {
            ErrorKind::ConnectError => "connect error",
            ErrorKind::IoError => "I/O error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Eof => "connection closed",
            ErrorKind::ProtocolError => "protocol error",
            ErrorKind::PoolTimeout => "pool timeout",
            ErrorKind::ResponseError => "response error",
            ErrorKind::AuthenticationFailed => "authentication failed",
            ErrorKind::InvalidClientConfig => "invalid client config",
            ErrorKind::ClientError => "client error",
        }
    }

    /// Indicates that this failure wraps an underlying I/O failure.
    pub fn is_io_error(&self) -> bool {
        matches!(self.repr, ErrorRepr::IoError(..))
    }

    pub(crate) fn as_io_error(&self) -> Option<&io::Error> {
        match self.repr {
            ErrorRepr::IoError(_, ref e) => Some(e),
            _ => None,
        }
    }

    /// Returns true if this error indicates that the connection was
    /// refused.  You should generally not rely much on this function
    /// unless you are writing unit tests that want to detect if a
    /// local server is available.
    pub fn is_connection_refusal(&self) -> bool {
        self.as_io_error().is_some_and(|err| {
            #[allow(clippy::match_like_matches_macro)]
            match err.kind() {
                io::ErrorKind::ConnectionRefused => true,
                // if we connect to a unix socket and the file does not
                // exist yet, then we want to treat this as if it was a
                // connection refusal.
                io::ErrorKind::NotFound => cfg!(unix),
                _ => false,
            }
        })
    }

    /// Returns true if the error was caused by a read or write deadline.
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Returns true if the error was caused by a dropped connection.
    pub fn is_connection_dropped(&self) -> bool {
        if self.kind() == ErrorKind::Eof {
            return true;
        }
        self.as_io_error().is_some_and(|err| {
            matches!(
                err.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            )
        })
    }

    pub(crate) fn connect_failure(err: io::Error) -> RedisError {
        RedisError {
            repr: ErrorRepr::IoError(ErrorKind::ConnectError, err),
        }
    }
}

/// Library generic result type.
pub type RedisResult<T> = Result<T, RedisError>;

/// Abstraction trait for redis command abstractions.
pub trait RedisWrite {
    /// Accepts a serialized redis command argument.
    fn write_arg(&mut self, arg: &[u8]);

    /// Accepts a displayable value as a single argument.
    fn write_arg_fmt(&mut self, arg: impl fmt::Display) {
        self.write_arg(arg.to_string().as_bytes())
    }
}

impl RedisWrite for Vec<Vec<u8>> {
    fn write_arg(&mut self, arg: &[u8]) {
        self.push(arg.to_owned());
    }

    fn write_arg_fmt(&mut self, arg: impl fmt::Display) {
        self.push(arg.to_string().into_bytes())
    }
}

/// Used to convert a value into one or multiple redis argument
/// strings.  Most values will produce exactly one item but in
/// some cases it might make sense to produce more than one.
pub trait ToRedisArgs: Sized {
    /// This converts the value into a vector of bytes.  Each item
    /// is a single argument.  Most items generate a vector of a
    /// single item.
    ///
    /// The exception to this rule currently are vectors of items.
    fn to_redis_args(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        self.write_redis_args(&mut out);
        out
    }

    /// This writes the value into a vector of bytes.  Each item
    /// is a single argument.  Most items generate a single item.
    ///
    /// The exception to this rule currently are vectors of items.
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite;

    /// This only exists internally as a workaround for the lack of
    /// specialization.
    #[doc(hidden)]
    fn write_args_from_slice<W>(items: &[Self], out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        Self::make_arg_iter_ref(items.iter(), out)
    }

    /// This only exists internally as a workaround for the lack of
    /// specialization.
    #[doc(hidden)]
    fn make_arg_iter_ref<'a, I, W>(items: I, out: &mut W)
    where
        W: ?Sized + RedisWrite,
        I: Iterator<Item = &'a Self>,
        Self: 'a,
    {
        for item in items {
            item.write_redis_args(out);
        }
    }
}

macro_rules! itoa_based_to_redis_impl {
    ($t:ty) => {
        impl ToRedisArgs for $t {
            fn write_redis_args<W>(&self, out: &mut W)
            where
                W: ?Sized + RedisWrite,
            {
                let mut buf = ::itoa::Buffer::new();
                let s = buf.format(*self);
                out.write_arg(s.as_bytes())
            }
        }
    };
}

macro_rules! ryu_based_to_redis_impl {
    ($t:ty) => {
        impl ToRedisArgs for $t {
            fn write_redis_args<W>(&self, out: &mut W)
            where
                W: ?Sized + RedisWrite,
            {
                let mut buf = ::ryu::Buffer::new();
                let s = buf.format(*self);
                out.write_arg(s.as_bytes())
            }
        }
    };
}

impl ToRedisArgs for u8 {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        let mut buf = ::itoa::Buffer::new();
        let s = buf.format(*self);
        out.write_arg(s.as_bytes())
    }

    // A slice of bytes is a single binary argument, not a list of
    // one-byte integers.
    fn write_args_from_slice<W>(items: &[u8], out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(items);
    }
}

itoa_based_to_redis_impl!(i8);
itoa_based_to_redis_impl!(i16);
itoa_based_to_redis_impl!(u16);
itoa_based_to_redis_impl!(i32);
itoa_based_to_redis_impl!(u32);
itoa_based_to_redis_impl!(i64);
itoa_based_to_redis_impl!(u64);
itoa_based_to_redis_impl!(isize);
itoa_based_to_redis_impl!(usize);

ryu_based_to_redis_impl!(f32);
ryu_based_to_redis_impl!(f64);

impl ToRedisArgs for bool {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(if *self { b"1" } else { b"0" })
    }
}

impl ToRedisArgs for String {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.as_bytes())
    }
}

impl<'a> ToRedisArgs for &'a str {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.as_bytes())
    }
}

impl<T: ToRedisArgs> ToRedisArgs for Vec<T> {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        ToRedisArgs::write_args_from_slice(self, out)
    }
}

impl<'a, T: ToRedisArgs> ToRedisArgs for &'a [T] {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        ToRedisArgs::write_args_from_slice(self, out)
    }
}

impl<T: ToRedisArgs, const N: usize> ToRedisArgs for &[T; N] {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        ToRedisArgs::write_args_from_slice(self.as_slice(), out)
    }
}

impl<T: ToRedisArgs> ToRedisArgs for Option<T> {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        if let Some(ref x) = *self {
            x.write_redis_args(out);
        }
    }
}

impl<T: ToRedisArgs> ToRedisArgs for &T {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        (*self).write_redis_args(out)
    }
}

macro_rules! to_redis_args_for_tuple {
    () => ();
    ($($name:ident,)+) => (
        #[doc(hidden)]
        impl<$($name: ToRedisArgs),*> ToRedisArgs for ($($name,)*) {
            // we have local variables named T1 as dummies and those
            // variables are unused.
            #[allow(non_snake_case, unused_variables)]
            fn write_redis_args<W>(&self, out: &mut W)
            where
                W: ?Sized + RedisWrite,
            {
                let ($(ref $name,)*) = *self;
                $($name.write_redis_args(out);)*
            }
        }
        to_redis_args_for_tuple_peel!($($name,)*);
    )
}

/// This chips of the leading one and recurses for the rest.  So if the
/// first ident is `A`, it will recurse to `(B, C)`.
macro_rules! to_redis_args_for_tuple_peel {
    ($name:ident, $($other:ident,)*) => (to_redis_args_for_tuple!($($other,)*);)
}

to_redis_args_for_tuple! { T1, T2, T3, T4, T5, T6, T7, T8, }

/// Helper enum that is used to define existence checks for `SET`.
#[derive(Clone, Copy)]
pub enum ExistenceCheck {
    /// NX -- Only set the key if it does not already exist.
    NX,
    /// XX -- Only set the key if it already exists.
    XX,
}

/// Helper enum that is used to define expiry time for `SET`.
#[derive(Clone, Copy)]
pub enum SetExpiry {
    /// EX seconds -- Set the specified expire time, in seconds.
    EX(u64),
    /// PX milliseconds -- Set the specified expire time, in milliseconds.
    PX(u64),
    /// KEEPTTL -- Retain the time to live associated with the key.
    KEEPTTL,
}

/// Options for the `SET` command, appended after the value in the wire
/// order redis expects.
///
/// ```rust
/// use redsync::{SetOptions, ExistenceCheck, SetExpiry};
///
/// let opts = SetOptions::default()
///     .conditional_set(ExistenceCheck::NX)
///     .with_expiration(SetExpiry::EX(60));
/// ```
#[derive(Clone, Copy, Default)]
pub struct SetOptions {
    conditional_set: Option<ExistenceCheck>,
    get: bool,
    expiration: Option<SetExpiry>,
}

impl SetOptions {
    /// Set the existence check for the SET command.
    pub fn conditional_set(mut self, existence_check: ExistenceCheck) -> Self {
        self.conditional_set = Some(existence_check);
        self
    }

    /// Return the old value stored at key, or the null bulk when the key
    /// did not exist.
    pub fn get(mut self, get: bool) -> Self {
        self.get = get;
        self
    }

    /// Set the expiration for the SET command.
    pub fn with_expiration(mut self, expiration: SetExpiry) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

impl ToRedisArgs for SetOptions {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        if let Some(ref conditional_set) = self.conditional_set {
            match conditional_set {
                ExistenceCheck::NX => out.write_arg(b"NX"),
                ExistenceCheck::XX => out.write_arg(b"XX"),
            }
        }
        if self.get {
            out.write_arg(b"GET");
        }
        if let Some(ref expiration) = self.expiration {
            match expiration {
                SetExpiry::EX(secs) => {
                    out.write_arg(b"EX");
                    secs.write_redis_args(out);
                }
                SetExpiry::PX(millis) => {
                    out.write_arg(b"PX");
                    millis.write_redis_args(out);
                }
                SetExpiry::KEEPTTL => out.write_arg(b"KEEPTTL"),
            }
        }
    }
}

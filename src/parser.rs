use std::io::{self, Read};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use crate::types::{ErrorKind, RedisResult, ServerError, Value};

/// Initial capacity of the reply buffer.  The buffer grows on demand and
/// never shrinks back below this.
const DEFAULT_BUF_CAPACITY: usize = 1024;

/// Maximum array nesting the parser will follow before treating the
/// reply as hostile.
const MAX_NESTING_DEPTH: usize = 64;

/// An optional absolute instant by which a read must complete.
///
/// The budget is distributed across however many raw reads one reply
/// frame needs: before each read the remaining time is installed as the
/// transport read timeout, and a spent deadline fails immediately with
/// [`ErrorKind::Timeout`].
#[derive(Clone, Copy, Debug)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never expires.
    pub fn none() -> Deadline {
        Deadline(None)
    }

    /// A deadline `timeout` from now, or no deadline for `None`.
    pub fn within(timeout: Option<Duration>) -> Deadline {
        Deadline(timeout.map(|t| Instant::now() + t))
    }

    fn remaining(&self) -> RedisResult<Option<Duration>> {
        match self.0 {
            None => Ok(None),
            Some(at) => {
                let left = at.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    fail!((ErrorKind::Timeout, "Read deadline elapsed"));
                }
                Ok(Some(left))
            }
        }
    }
}

/// A stream replies can be read from: a readable transport whose read
/// timeout can be adjusted between reads.
///
/// Implemented for the socket types the client connects over, and for
/// `&[u8]` so parsing code can be driven from byte slices in tests and
/// through [`parse_redis_value`].
pub trait ReplySource: Read {
    /// Installs the read timeout for the next raw read.  `None` blocks
    /// indefinitely.
    fn set_read_timeout(&mut self, dur: Option<Duration>) -> io::Result<()>;
}

impl ReplySource for TcpStream {
    fn set_read_timeout(&mut self, dur: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, dur)
    }
}

#[cfg(unix)]
impl ReplySource for UnixStream {
    fn set_read_timeout(&mut self, dur: Option<Duration>) -> io::Result<()> {
        UnixStream::set_read_timeout(self, dur)
    }
}

impl ReplySource for &[u8] {
    fn set_read_timeout(&mut self, _dur: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

/// A fixed-capacity read buffer over a reply stream.
///
/// Demand beyond the buffered bytes triggers a single raw read with the
/// remaining deadline budget.  Capacity doubles whenever one read demands
/// more than the buffer holds, consumed bytes are compacted away so the
/// capacity stays reusable, and bytes belonging to later frames are kept
/// for the next call.
#[derive(Debug)]
pub struct BufferedReader {
    buf: Vec<u8>,
    // consumed up to `start`, filled up to `end`
    start: usize,
    end: usize,
}

impl Default for BufferedReader {
    fn default() -> BufferedReader {
        BufferedReader::new()
    }
}

impl BufferedReader {
    /// Creates an empty reader with the default capacity.
    pub fn new() -> BufferedReader {
        BufferedReader {
            buf: vec![0; DEFAULT_BUF_CAPACITY],
            start: 0,
            end: 0,
        }
    }

    fn available(&self) -> usize {
        self.end - self.start
    }

    fn compact(&mut self) {
        self.buf.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }

    fn grow_to(&mut self, want: usize) {
        let mut cap = self.buf.len();
        while cap < want {
            cap *= 2;
        }
        self.buf.resize(cap, 0);
    }

    /// Issues one raw read against the source, honoring the deadline.
    fn fill<S: ReplySource>(&mut self, source: &mut S, deadline: Deadline) -> RedisResult<()> {
        if self.end == self.buf.len() {
            if self.start > 0 {
                self.compact();
            } else {
                let cap = self.buf.len() * 2;
                self.buf.resize(cap, 0);
            }
        }
        source.set_read_timeout(deadline.remaining()?)?;
        let n = source.read(&mut self.buf[self.end..])?;
        if n == 0 {
            fail!((ErrorKind::Eof, "Server closed the connection mid-reply"));
        }
        self.end += n;
        Ok(())
    }

    /// Returns exactly `n` bytes, refilling from the source as needed.
    pub fn read_exact<S: ReplySource>(
        &mut self,
        source: &mut S,
        n: usize,
        deadline: Deadline,
    ) -> RedisResult<&[u8]> {
        if self.available() < n {
            if self.start > 0 {
                self.compact();
            }
            if n > self.buf.len() {
                self.grow_to(n);
            }
            while self.available() < n {
                self.fill(source, deadline)?;
            }
        }
        let out_start = self.start;
        self.start += n;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        Ok(&self.buf[out_start..out_start + n])
    }

    /// Returns the next line including its CR/LF terminator.
    pub fn read_line<S: ReplySource>(
        &mut self,
        source: &mut S,
        deadline: Deadline,
    ) -> RedisResult<&[u8]> {
        // offset past `start` of the first byte not yet checked; survives
        // compaction because it is relative
        let mut scanned = 0;
        let at = loop {
            let haystack = &self.buf[self.start..self.end];
            let mut found = None;
            while scanned + 2 <= haystack.len() {
                if haystack[scanned] == b'\r' && haystack[scanned + 1] == b'\n' {
                    found = Some(scanned);
                    break;
                }
                scanned += 1;
            }
            if let Some(at) = found {
                break at;
            }
            self.fill(source, deadline)?;
        };
        let line_start = self.start;
        let line_end = self.start + at + 2;
        self.start = line_end;
        if self.start == self.end {
            self.start = 0;
            self.end = 0;
        }
        Ok(&self.buf[line_start..line_end])
    }
}

/// Parses a signed decimal integer the way the protocol defines it: an
/// optional leading `-`, then at least one ASCII digit and nothing else.
/// Values outside `i64` are rejected.
fn parse_int(bytes: &[u8]) -> RedisResult<i64> {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        fail!((ErrorKind::ProtocolError, "Expected integer, got garbage"));
    }
    // accumulate negatively so i64::MIN does not overflow on the way in
    let mut value: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            fail!((ErrorKind::ProtocolError, "Expected integer, got garbage"));
        }
        value = match value
            .checked_mul(10)
            .and_then(|v| v.checked_sub((b - b'0') as i64))
        {
            Some(v) => v,
            None => fail!((ErrorKind::ProtocolError, "Integer out of range")),
        };
    }
    if negative {
        Ok(value)
    } else {
        match value.checked_neg() {
            Some(v) => Ok(v),
            None => fail!((ErrorKind::ProtocolError, "Integer out of range")),
        }
    }
}

fn read_line_body<'a, S: ReplySource>(
    reader: &'a mut BufferedReader,
    source: &mut S,
    deadline: Deadline,
) -> RedisResult<&'a [u8]> {
    let line = reader.read_line(source, deadline)?;
    Ok(&line[..line.len() - 2])
}

fn parse_reply<S: ReplySource>(
    reader: &mut BufferedReader,
    source: &mut S,
    deadline: Deadline,
    depth: usize,
) -> RedisResult<Value> {
    if depth >= MAX_NESTING_DEPTH {
        fail!((ErrorKind::ProtocolError, "Array nesting too deep"));
    }
    let type_byte = reader.read_exact(source, 1, deadline)?[0];
    match type_byte {
        b'+' => {
            let line = read_line_body(reader, source, deadline)?;
            Ok(Value::Status(line.to_vec()))
        }
        b'-' => {
            let line = read_line_body(reader, source, deadline)?;
            Ok(Value::ServerError(ServerError::new(line.to_vec())))
        }
        b':' => {
            let line = read_line_body(reader, source, deadline)?;
            Ok(Value::Int(parse_int(line)?))
        }
        b'$' => {
            let len = {
                let line = read_line_body(reader, source, deadline)?;
                parse_int(line)?
            };
            if len == -1 {
                return Ok(Value::Data(None));
            }
            if len < 0 {
                fail!((ErrorKind::ProtocolError, "Invalid bulk length"));
            }
            let payload = reader.read_exact(source, len as usize, deadline)?.to_vec();
            let terminator = reader.read_exact(source, 2, deadline)?;
            if terminator != b"\r\n" {
                fail!((ErrorKind::ProtocolError, "Bulk string not terminated"));
            }
            Ok(Value::Data(Some(payload)))
        }
        b'*' => {
            let count = {
                let line = read_line_body(reader, source, deadline)?;
                parse_int(line)?
            };
            if count == -1 {
                return Ok(Value::Bulk(None));
            }
            if count < 0 {
                fail!((ErrorKind::ProtocolError, "Invalid array length"));
            }
            let mut items = Vec::with_capacity((count as usize).min(1024));
            for _ in 0..count {
                items.push(parse_reply(reader, source, deadline, depth + 1)?);
            }
            Ok(Value::Bulk(Some(items)))
        }
        other => fail!((
            ErrorKind::ProtocolError,
            "Unknown reply type byte",
            format!("{:?}", other as char),
        )),
    }
}

/// The redis response parser.
///
/// The parser holds the read buffer, so more than one reply can be behind
/// the same source: each [`parse_value`](Parser::parse_value) call
/// consumes exactly one frame and keeps whatever followed it buffered for
/// the next call.
#[derive(Debug)]
pub struct Parser {
    reader: BufferedReader,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser::new()
    }
}

impl Parser {
    /// Creates a new parser with an empty buffer.
    pub fn new() -> Parser {
        Parser {
            reader: BufferedReader::new(),
        }
    }

    /// Parses one reply frame from the source.
    ///
    /// `-...` frames are returned as [`Value::ServerError`]; an `Err` from
    /// this function always means the connection itself is no longer
    /// trustworthy (timeout, EOF, I/O failure, or a malformed frame).
    pub fn parse_value<S: ReplySource>(
        &mut self,
        source: &mut S,
        deadline: Deadline,
    ) -> RedisResult<Value> {
        parse_reply(&mut self.reader, source, deadline, 0)
    }
}

/// Parses bytes into a reply value.
///
/// This is the most straightforward way to parse something into a low
/// level redis value instead of having to use a whole parser.
pub fn parse_redis_value(bytes: &[u8]) -> RedisResult<Value> {
    let mut src = bytes;
    Parser::new().parse_value(&mut src, Deadline::none())
}

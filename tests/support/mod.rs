#![allow(dead_code)]

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A scripted in-process redis stand-in.
///
/// Accepts any number of connections and runs `handler` for each on its
/// own thread.  The handler decides what to read and what bytes to send
/// back, which makes misbehaving servers (stalls, partial frames, early
/// hangups) as easy to script as healthy ones.
pub struct MockServer {
    addr: String,
    accepted: Arc<AtomicUsize>,
}

impl MockServer {
    pub fn spawn<F>(handler: F) -> MockServer
    where
        F: Fn(usize, TcpStream) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        let handler = Arc::new(handler);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(_) => break,
                };
                let idx = counter.fetch_add(1, Ordering::SeqCst);
                let handler = Arc::clone(&handler);
                thread::spawn(move || handler(idx, stream));
            }
        });

        MockServer { addr, accepted }
    }

    /// A server that answers `+PONG` to every command it receives, on
    /// any number of connections.
    pub fn ponger() -> MockServer {
        MockServer::spawn(|_, mut stream| {
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            while read_command(&mut reader).is_ok() {
                write_simple(&mut stream, "PONG");
            }
        })
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub fn connections_accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// Reads one client request frame (`*N` of bulk strings) and returns the
/// argument list.
pub fn read_command<R: BufRead>(reader: &mut R) -> io::Result<Vec<Vec<u8>>> {
    let mut line = Vec::new();
    read_line(reader, &mut line)?;
    if line.first() != Some(&b'*') {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "expected array"));
    }
    let count = parse_usize(&line[1..])?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        read_line(reader, &mut line)?;
        if line.first() != Some(&b'$') {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "expected bulk"));
        }
        let len = parse_usize(&line[1..])?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
        if crlf != [b'\r', b'\n'] {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "missing crlf"));
        }
        args.push(data);
    }
    Ok(args)
}

fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<()> {
    buf.clear();
    let bytes = reader.read_until(b'\n', buf)?;
    if bytes == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
    }
    if buf.len() < 2 || buf[buf.len() - 2] != b'\r' {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid line"));
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

fn parse_usize(data: &[u8]) -> io::Result<usize> {
    if data.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "empty length"));
    }
    let mut value = 0usize;
    for &b in data {
        if !b.is_ascii_digit() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad digit"));
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as usize);
    }
    Ok(value)
}

pub fn write_simple<W: Write>(stream: &mut W, msg: &str) {
    let _ = stream.write_all(b"+");
    let _ = stream.write_all(msg.as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_error<W: Write>(stream: &mut W, msg: &str) {
    let _ = stream.write_all(b"-");
    let _ = stream.write_all(msg.as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_bulk<W: Write>(stream: &mut W, data: &[u8]) {
    let _ = stream.write_all(b"$");
    let _ = stream.write_all(data.len().to_string().as_bytes());
    let _ = stream.write_all(b"\r\n");
    let _ = stream.write_all(data);
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_raw<W: Write>(stream: &mut W, bytes: &[u8]) {
    let _ = stream.write_all(bytes);
    let _ = stream.flush();
}

pub fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

use std::io::BufReader;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use redsync::{Commands, ErrorKind, Pool, PoolConfig, Value};

mod support;
use support::*;

fn small_pool(server: &MockServer, size: usize, checkout_timeout: Duration) -> Pool {
    Pool::with_config(
        server.url().as_str(),
        PoolConfig {
            size,
            checkout_timeout,
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
        },
    )
    .unwrap()
}

#[test]
fn test_pool_reuses_connections() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 2, Duration::from_secs(1));

    for _ in 0..5 {
        let reply = pool.with(|con| con.ping()).unwrap();
        assert_eq!(reply, Value::Status(b"PONG".to_vec()));
    }

    // sequential use never needs a second connection
    assert_eq!(server.connections_accepted(), 1);
    let status = pool.status();
    assert_eq!(status.total, 1);
    assert_eq!(status.idle, 1);
}

#[test]
fn test_pool_creates_lazily_up_to_size() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 2, Duration::from_secs(1));

    let first = pool.get().unwrap();
    let second = pool.get().unwrap();
    assert_eq!(pool.status().total, 2);
    drop(first);
    drop(second);
    assert_eq!(pool.status(), redsync::PoolStatus { idle: 2, total: 2 });
}

#[test]
fn test_pool_checkout_times_out() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 1, Duration::from_millis(100));

    let held = pool.get().unwrap();
    let started = Instant::now();
    let err = pool.get().unwrap_err();
    let waited = started.elapsed();

    assert_eq!(err.kind(), ErrorKind::PoolTimeout);
    assert!(
        waited >= Duration::from_millis(100) && waited < Duration::from_millis(2_000),
        "waited {waited:?}"
    );
    drop(held);

    // a free connection ends the famine
    assert!(pool.get().is_ok());
}

#[test]
fn test_pool_recovers_after_poisoned_connection() {
    // first connection dies mid-reply, later ones behave
    let server = MockServer::spawn(|idx, mut stream| {
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        if idx == 0 {
            read_command(&mut reader).expect("command");
            write_raw(&mut stream, b"$10\r\nabc");
            // hang up mid-frame
        } else {
            while read_command(&mut reader).is_ok() {
                write_simple(&mut stream, "PONG");
            }
        }
    });
    let pool = small_pool(&server, 1, Duration::from_secs(1));

    let err = pool.with(|con| con.ping()).unwrap_err();
    assert!(err.is_connection_dropped(), "unexpected error: {err}");

    // the poisoned connection was discarded, its slot freed
    assert_eq!(pool.status(), redsync::PoolStatus { idle: 0, total: 0 });

    let reply = pool.with(|con| con.ping()).unwrap();
    assert_eq!(reply, Value::Status(b"PONG".to_vec()));
    assert_eq!(server.connections_accepted(), 2);
}

#[test]
fn test_waiters_are_served_in_fifo_order() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 1, Duration::from_secs(5));

    let order = Arc::new(Mutex::new(Vec::new()));
    let held = pool.get().unwrap();

    let mut handles = Vec::new();
    for i in 0..3 {
        let pool = pool.clone();
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let conn = pool.get().unwrap();
            order.lock().unwrap().push(i);
            sleep_ms(20);
            drop(conn);
        }));
        // stagger arrival so the queue order is deterministic
        sleep_ms(50);
    }

    drop(held);
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_no_waiter_starves_under_contention() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 1, Duration::from_secs(10));

    let barrier = Arc::new(Barrier::new(3));
    let completed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let pool = pool.clone();
        let barrier = Arc::clone(&barrier);
        let completed = Arc::clone(&completed);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..10 {
                let reply = pool.with(|con| con.ping()).unwrap();
                assert_eq!(reply, Value::Status(b"PONG".to_vec()));
                completed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 30);
    // one connection served everyone
    assert_eq!(pool.status().total, 1);
}

#[test]
fn test_concurrent_use_stays_within_size() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 3, Duration::from_secs(10));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..5 {
                pool.with(|con| {
                    sleep_ms(2);
                    con.ping()
                })
                .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(server.connections_accepted() <= 3);
    assert!(pool.status().total <= 3);
}

#[test]
fn test_with_returns_connection_on_closure_error() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 1, Duration::from_secs(1));

    let result: redsync::RedisResult<()> = pool.with(|_| {
        Err(redsync::RedisError::from((
            ErrorKind::ClientError,
            "application level failure",
        )))
    });
    assert!(result.is_err());

    // the connection was healthy, so it went back to idle
    assert_eq!(pool.status(), redsync::PoolStatus { idle: 1, total: 1 });
}

#[test]
fn test_checkin_on_panic() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 1, Duration::from_millis(500));

    let panicking_pool = pool.clone();
    let result = thread::spawn(move || {
        panicking_pool.with(|_| -> redsync::RedisResult<()> { panic!("boom") })
    })
    .join();
    assert!(result.is_err());

    // the guard returned the connection despite the unwind
    let reply = pool.with(|con| con.ping()).unwrap();
    assert_eq!(reply, Value::Status(b"PONG".to_vec()));
}

#[test]
fn test_shutdown_rejects_checkouts() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 2, Duration::from_secs(1));

    pool.with(|con| con.ping()).unwrap();
    pool.shutdown();

    let err = pool.get().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert_eq!(pool.status(), redsync::PoolStatus { idle: 0, total: 0 });
}

#[test]
fn test_shutdown_closes_outstanding_connections_on_checkin() {
    let server = MockServer::ponger();
    let pool = small_pool(&server, 1, Duration::from_secs(1));

    let held = pool.get().unwrap();
    pool.shutdown();
    assert_eq!(pool.status().total, 1);
    drop(held);
    assert_eq!(pool.status(), redsync::PoolStatus { idle: 0, total: 0 });
}

#[test]
fn test_failed_connect_releases_slot() {
    // nothing listening here
    let pool = Pool::with_config(
        "redis://127.0.0.1:1",
        PoolConfig {
            size: 1,
            checkout_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(100),
            read_timeout: Duration::from_secs(1),
        },
    )
    .unwrap();

    let err = pool.get().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectError);
    // the reserved slot was given back, a retry may create again
    assert_eq!(pool.status(), redsync::PoolStatus { idle: 0, total: 0 });
    assert_eq!(pool.get().unwrap_err().kind(), ErrorKind::ConnectError);
}

#[test]
fn test_zero_sized_pool_is_rejected() {
    let err = Pool::with_config(
        "redis://127.0.0.1/",
        PoolConfig {
            size: 0,
            ..PoolConfig::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidClientConfig);
}

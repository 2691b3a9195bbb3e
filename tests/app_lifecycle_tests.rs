//! Integration Tests for the Process Lifecycle
//!
//! Runs [`App`] against a real snapshot file: restore at start, drain on
//! shutdown, one final rewrite of the file.

use std::fs::{self, File};
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use minicached::{App, CacheEngine, Config, Shutdown};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

// == Helper Functions ==

fn test_config(snapshot_path: &Path, read_timeout: Duration) -> Config {
    Config {
        listen_addr: "127.0.0.1:0".to_string(),
        snapshot_path: snapshot_path.to_path_buf(),
        eviction_interval: Duration::from_secs(3600),
        accept_timeout: Duration::from_millis(100),
        read_timeout,
    }
}

/// Writes a snapshot holding `keys` entries to `path` and returns its bytes.
async fn seed_snapshot(path: &Path, keys: usize) -> Vec<u8> {
    let engine = CacheEngine::new();
    for i in 0..keys {
        engine
            .set(format!("key-{}", i), format!("value-{}", i), TimeDelta::hours(1))
            .await;
    }

    let mut bytes = Vec::new();
    engine.dump(&mut bytes).await.unwrap();
    fs::write(path, &bytes).unwrap();
    bytes
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn send(&mut self, command: &str) -> String {
        self.writer
            .write_all(format!("{}\n", command).as_bytes())
            .await
            .unwrap();
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(2), self.reader.read_line(&mut line))
            .await
            .expect("reply should arrive")
            .unwrap();
        line.trim_end().to_string()
    }

    async fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        matches!(
            tokio::time::timeout(Duration::from_secs(3), self.reader.read_line(&mut line)).await,
            Ok(Ok(0)) | Ok(Err(_))
        )
    }
}

// == Lifecycle Tests ==

#[tokio::test]
async fn test_snapshot_rewritten_after_idle_client_drains() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    let original = seed_snapshot(&path, 50).await;

    let app = App::start(test_config(&path, Duration::from_secs(1)))
        .await
        .unwrap();
    let engine = app.engine().clone();
    assert_eq!(engine.stats().await.size, 50);

    let addr = app.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(app.run(shutdown.clone()));

    let mut idle = Client::connect(addr).await;
    for i in 1..50 {
        assert_eq!(idle.send(&format!("del key-{}", i)).await, "OK");
    }
    assert_eq!(idle.send("get key-0").await, "value-0");

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // the idle session is still draining, so the old snapshot is untouched
    assert!(!handle.is_finished());
    assert_eq!(fs::read(&path).unwrap(), original);

    tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("App should finish after the idle client times out")
        .unwrap()
        .unwrap();
    assert!(idle.is_closed().await);

    let mut expected = Vec::new();
    engine.dump(&mut expected).await.unwrap();
    let written = fs::read(&path).unwrap();
    assert!(written.len() < original.len());
    assert_eq!(written, expected);

    let restored = CacheEngine::new();
    restored.restore(Cursor::new(written)).await.unwrap();
    assert_eq!(restored.get("key-0").await.unwrap(), "value-0");
    assert!(restored.get("key-1").await.is_err());
    assert_eq!(restored.stats().await.size, 1);
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty_and_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");

    // one index record whose only key claims 2^60 bytes
    let mut corrupt = Vec::new();
    corrupt.extend_from_slice(&1u64.to_le_bytes());
    corrupt.extend_from_slice(&0i64.to_le_bytes());
    corrupt.extend_from_slice(&1u64.to_le_bytes());
    corrupt.extend_from_slice(&(1u64 << 60).to_le_bytes());
    corrupt.extend_from_slice(b"abc");
    fs::write(&path, &corrupt).unwrap();

    let app = App::start(test_config(&path, Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(app.engine().stats().await.size, 0);

    let addr = app.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(app.run(shutdown.clone()));

    let mut client = Client::connect(addr).await;
    assert_eq!(client.send("set a 1 1h").await, "OK");
    assert_eq!(client.send("quit").await, "Bye");

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    let restored = CacheEngine::new();
    restored.restore(File::open(&path).unwrap()).await.unwrap();
    assert_eq!(restored.get("a").await.unwrap(), "1");
}

#[tokio::test]
async fn test_missing_snapshot_file_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");

    let app = App::start(test_config(&path, Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(app.engine().stats().await.size, 0);

    let shutdown = Shutdown::new();
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(1), app.run(shutdown))
        .await
        .expect("App should stop promptly without clients")
        .unwrap();

    let restored = CacheEngine::new();
    restored.restore(File::open(&path).unwrap()).await.unwrap();
    assert_eq!(restored.stats().await.size, 0);
}

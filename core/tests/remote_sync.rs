// core/tests/remote_sync.rs
//
// Remote dictionary monitor scenarios against a scripted loopback HTTP
// server: a 200 with a Last-Modified validator populates the store, a later
// 304 leaves it untouched, and network failures never panic the monitor.

use hanseg_core::{DictionaryStore, Nature, RemoteDictKind, RemoteDictionaryMonitor};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

const LAST_MODIFIED: &str = "Mon, 01 Jan 2024 00:00:00 GMT";

/// Minimal scripted HTTP responder. Conditional HEADs get a 304, fresh
/// HEADs advertise the validator, GETs serve `body`. Connections are closed
/// after each response so every request arrives on its own socket.
fn spawn_stub(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            handle_connection(stream, body);
        }
    });
    format!("http://{addr}/dict.txt")
}

fn handle_connection(mut stream: TcpStream, body: &str) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let is_head = head.starts_with("HEAD");
    let conditional = head
        .lines()
        .any(|line| line.to_ascii_lowercase().starts_with("if-modified-since"));

    let response = if is_head && conditional {
        format!(
            "HTTP/1.1 304 Not Modified\r\nLast-Modified: {LAST_MODIFIED}\r\nConnection: close\r\n\r\n"
        )
    } else if is_head {
        format!(
            "HTTP/1.1 200 OK\r\nLast-Modified: {LAST_MODIFIED}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        )
    } else {
        format!(
            "HTTP/1.1 200 OK\r\nLast-Modified: {LAST_MODIFIED}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[test]
fn fresh_fetch_populates_store_then_304_is_a_noop() {
    let url = spawn_stub("新词 n 2000\n");
    let dict = Arc::new(DictionaryStore::new());
    let monitor =
        RemoteDictionaryMonitor::new(&url, RemoteDictKind::Custom, dict.clone(), false)
            .expect("build monitor");

    // First run: HEAD sees a fresh Last-Modified, the GET body is applied.
    monitor.run();
    let entry = dict.lookup("新词").expect("entry from remote");
    assert_eq!(entry.nature, Nature::N);
    assert_eq!(entry.frequency, 2000);

    // Overwrite locally; a 304 on the next run must not re-apply the body.
    dict.upsert("新词", Nature::V, 1);
    monitor.run();
    let entry = dict.lookup("新词").expect("entry intact");
    assert_eq!(entry.nature, Nature::V);
    assert_eq!(entry.frequency, 1);
}

#[test]
fn default_tag_from_location_applies_to_untagged_lines() {
    let url = spawn_stub("裸词\n标注词 v 300\n");
    let dict = Arc::new(DictionaryStore::new());
    let location = format!("{url} nz");
    let monitor =
        RemoteDictionaryMonitor::new(&location, RemoteDictKind::Custom, dict.clone(), false)
            .expect("build monitor");
    monitor.run();

    let bare = dict.lookup("裸词").expect("untagged line");
    assert_eq!(bare.nature, Nature::Nz);
    assert_eq!(bare.frequency, 1000);
    let tagged = dict.lookup("标注词").expect("tagged line");
    assert_eq!(tagged.nature, Nature::V);
    assert_eq!(tagged.frequency, 300);
}

#[test]
fn stop_word_monitor_feeds_stop_set() {
    let url = spawn_stub("\u{feff}的\n了\n\n");
    let dict = Arc::new(DictionaryStore::new());
    let monitor = RemoteDictionaryMonitor::new(&url, RemoteDictKind::Stop, dict.clone(), false)
        .expect("build monitor");
    monitor.run();

    assert!(dict.is_stop_word("的"));
    assert!(dict.is_stop_word("了"));
    assert_eq!(dict.stop_word_count(), 2);
}

#[test]
fn unreachable_host_is_swallowed() {
    // Bind and immediately drop a listener so the port refuses connections.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        listener.local_addr().expect("local addr").port()
    };
    let dict = Arc::new(DictionaryStore::new());
    let monitor = RemoteDictionaryMonitor::new(
        &format!("http://127.0.0.1:{port}/dict.txt"),
        RemoteDictKind::Custom,
        dict.clone(),
        false,
    )
    .expect("build monitor");

    // The run logs the failure and returns; the next tick would retry.
    monitor.run();
    assert_eq!(dict.word_count(), 0);
}

#[test]
fn malformed_lines_skip_without_killing_the_fetch() {
    let url = spawn_stub("好词 n 10\n坏词 n 不是数字\n另词 v 20\n");
    let dict = Arc::new(DictionaryStore::new());
    let monitor =
        RemoteDictionaryMonitor::new(&url, RemoteDictKind::Custom, dict.clone(), false)
            .expect("build monitor");
    monitor.run();

    assert!(dict.lookup("好词").is_some());
    assert!(dict.lookup("坏词").is_none());
    assert!(dict.lookup("另词").is_some());
}

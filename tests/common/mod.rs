//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use rrdialer::observability::{DialEvent, Logger};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serve `hello {id}` on `listener` for `accepts` connections, then close it.
pub fn serve_hello(listener: TcpListener, id: usize, accepts: usize) {
    tokio::spawn(async move {
        for _ in 0..accepts {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = socket.write_all(format!("hello {}", id).as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

/// Start a `hello {id}` backend on an ephemeral port.
#[allow(dead_code)]
pub async fn start_hello_backend(id: usize, accepts: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    serve_hello(listener, id, accepts);
    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn refused_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

/// Start a minimal HTTP backend that always answers with `body`.
#[allow(dead_code)]
pub async fn start_mock_http_backend(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

#[allow(dead_code)]
pub async fn read_all(mut stream: TcpStream) -> String {
    let mut buf = String::new();
    stream.read_to_string(&mut buf).await.unwrap();
    buf
}

/// Logger that keeps `(kind, address, line)` for every event.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<(&'static str, String, String)>>,
}

#[allow(dead_code)]
impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|(k, _, _)| *k == kind).count()
    }

    pub fn count_for(&self, kind: &str, address: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, a, _)| *k == kind && a == address)
            .count()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.lock().unwrap().iter().map(|(_, _, line)| line.clone()).collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, event: &DialEvent<'_>) {
        let kind = match event {
            DialEvent::Ejected { .. } => "ejected",
            DialEvent::Recovered { .. } => "recovered",
            DialEvent::Fallback { .. } => "fallback",
            DialEvent::ConnectFailed { .. } => "connect_failed",
        };
        self.events
            .lock()
            .unwrap()
            .push((kind, event.address().to_string(), event.to_string()));
    }
}

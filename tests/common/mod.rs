//! Shared helpers for end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;

use falcon::config::Config;
use falcon::server::{ServiceContext, Shutdown, listener};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A running service over a temporary root.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: TempDir,
    #[allow(dead_code)]
    pub shutdown: Shutdown,
}

/// Parsed response: status code, headers in order, body.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[allow(dead_code)]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub async fn start_server() -> TestServer {
    start_server_with(|_| {}).await
}

pub async fn start_server_with(configure: impl FnOnce(&mut Config)) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    let mut cfg = Config::default();
    cfg.server.root_dir = root.path().to_path_buf();
    configure(&mut cfg);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let ctx = Arc::new(ServiceContext::from_config(&cfg, shutdown.clone()));

    tokio::spawn(async move {
        let _ = listener::serve(listener, ctx).await;
    });

    TestServer { addr, root, shutdown }
}

/// Sends `request`, half-closes, and reads until the server hangs up.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    out
}

pub async fn send(addr: SocketAddr, request: &[u8]) -> RawResponse {
    parse_response(&send_raw(addr, request).await)
}

pub fn parse_response(raw: &[u8]) -> RawResponse {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    let head = std::str::from_utf8(&raw[..end]).unwrap();
    let mut lines = head.split("\r\n");

    let status_line = lines.next().unwrap();
    assert!(status_line.starts_with("HTTP/1.0 "), "{status_line}");
    let status = status_line[9..12].parse().unwrap();

    let headers = lines
        .map(|line| {
            let (k, v) = line.split_once(": ").unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();

    RawResponse {
        status,
        headers,
        body: raw[end + 4..].to_vec(),
    }
}

#[allow(dead_code)]
pub async fn get(addr: SocketAddr, path: &str) -> RawResponse {
    send(addr, format!("GET {path} HTTP/1.0\r\n\r\n").as_bytes()).await
}

#[allow(dead_code)]
pub async fn put(addr: SocketAddr, path: &str, body: &[u8]) -> RawResponse {
    let mut req = format!("PUT {path} HTTP/1.0\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
    req.extend_from_slice(body);
    send(addr, &req).await
}

#[allow(dead_code)]
pub async fn exec(addr: SocketAddr, command: &str) -> RawResponse {
    let req = format!(
        "POST /exec HTTP/1.0\r\nContent-Length: {}\r\n\r\n{command}",
        command.len()
    );
    send(addr, req.as_bytes()).await
}

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use spa_webserver::config::{AppState, Config};
use spa_webserver::server::{self, SignalHandler};

const INDEX: &str = "<!doctype html><div id=\"root\"></div>";

struct TestServer {
    addr: SocketAddr,
    signals: Arc<SignalHandler>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    async fn start_with(tweak: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), INDEX).unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/app.js"), "console.log('app')").unwrap();

        let mut cfg = Config::default();
        cfg.spa.static_dir = dir.path().to_str().unwrap().to_string();
        cfg.logging.access_log = false;
        cfg.performance.shutdown_timeout = 2;
        tweak(&mut cfg);

        let listener = server::create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(cfg).unwrap());
        let signals = Arc::new(SignalHandler::new());
        let handle = tokio::spawn(server::start_server_loop(
            listener,
            state,
            Arc::clone(&signals),
        ));

        Self {
            addr,
            signals,
            handle,
            _dir: dir,
        }
    }

    /// Send one request and return (status line, body)
    async fn request(&self, method: &str, path: &str) -> (String, String) {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        let request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let raw = String::from_utf8(raw).unwrap();

        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let status_line = head.lines().next().unwrap().to_string();
        (status_line, body.to_string())
    }

    /// Open a keep-alive connection that has been served one request
    async fn keep_alive_connection(&self) -> TcpStream {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream
            .write_all(b"GET /dashboard HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let (status, body) = read_response(&mut stream).await;
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(body, INDEX);
        stream
    }

    async fn stop(self) {
        self.signals.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Read one response off a connection that stays open, using Content-Length
async fn read_response(stream: &mut TcpStream) -> (String, String) {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-response");
        raw.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let length: usize = head
                .lines()
                .find_map(|line| {
                    let line = line.to_ascii_lowercase();
                    let value = line.strip_prefix("content-length:")?;
                    Some(value.trim().parse().unwrap())
                })
                .unwrap_or(0);
            if body.len() >= length {
                let status_line = head.lines().next().unwrap().to_string();
                return (status_line, body[..length].to_string());
            }
        }
    }
}

#[tokio::test]
async fn client_routes_receive_index() {
    let server = TestServer::start().await;

    for path in ["/dashboard", "/dashboard/settings", "/users/42/edit/"] {
        let (status, body) = server.request("GET", path).await;
        assert_eq!(status, "HTTP/1.1 200 OK", "{path}");
        assert_eq!(body, INDEX, "{path}");
    }

    server.stop().await;
}

#[tokio::test]
async fn api_paths_are_not_intercepted() {
    let server = TestServer::start().await;

    let (status, body) = server.request("GET", "/api/users").await;
    assert_eq!(status, "HTTP/1.1 404 Not Found");
    assert_ne!(body, INDEX);
    assert!(body.contains("\"path\":\"/api/users\""));

    let (status, body) = server.request("GET", "/api/health").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, r#"{"status":"ok"}"#);

    server.stop().await;
}

#[tokio::test]
async fn static_assets_are_served_directly() {
    let server = TestServer::start().await;

    let (status, body) = server.request("GET", "/static/app.js").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, "console.log('app')");

    // a missing asset is not papered over with the index document
    let (status, _) = server.request("GET", "/static/missing.js").await;
    assert_eq!(status, "HTTP/1.1 404 Not Found");

    let (status, body) = server.request("GET", "/").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert_eq!(body, INDEX);

    server.stop().await;
}

#[tokio::test]
async fn head_and_disallowed_methods() {
    let server = TestServer::start().await;

    let (status, body) = server.request("HEAD", "/dashboard").await;
    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(body.is_empty());

    let (status, _) = server.request("DELETE", "/dashboard").await;
    assert_eq!(status, "HTTP/1.1 405 Method Not Allowed");

    server.stop().await;
}

#[tokio::test]
async fn connections_over_the_limit_are_dropped() {
    let server = TestServer::start_with(|cfg| cfg.performance.max_connections = Some(1)).await;
    let held = server.keep_alive_connection().await;

    let mut extra = TcpStream::connect(server.addr).await.unwrap();
    let _ = extra
        .write_all(b"GET /dashboard HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await;
    let mut raw = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), extra.read_to_end(&mut raw))
        .await
        .unwrap();
    assert!(matches!(read, Ok(0) | Err(_)), "second connection was served");

    // the slot frees up once the first connection goes away
    drop(held);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let (status, _) = server.request("GET", "/dashboard").await;
    assert_eq!(status, "HTTP/1.1 200 OK");

    server.stop().await;
}

#[tokio::test]
async fn shutdown_finishes_in_flight_request_then_closes() {
    let server = TestServer::start().await;

    // idle keep-alive connection
    let mut idle = server.keep_alive_connection().await;

    // request head arrives in two parts around the shutdown signal
    let mut busy = TcpStream::connect(server.addr).await.unwrap();
    busy.write_all(b"GET /dashboard/settings HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.signals.trigger();
    tokio::time::sleep(Duration::from_millis(50)).await;
    busy.write_all(b"\r\n").await.unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), busy.read_to_end(&mut raw))
        .await
        .unwrap()
        .unwrap();
    let raw = String::from_utf8(raw).unwrap();
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert!(raw.ends_with(INDEX));

    let mut rest = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(5), idle.read_to_end(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);

    // both connections closed on their own, well inside shutdown_timeout
    tokio::time::timeout(Duration::from_secs(1), server.handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

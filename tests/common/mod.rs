//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use api_trace_proxy::config::ProxyConfig;
use api_trace_proxy::net::Listener;
use api_trace_proxy::observability::MemorySink;
use api_trace_proxy::{ProxyServer, Shutdown};

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What the mock upstream answers with.
#[derive(Clone)]
pub enum Reply {
    /// Fixed status, content type and body.
    Fixed {
        status: StatusCode,
        content_type: &'static str,
        body: &'static str,
    },
    /// Echo the request body back with status 200.
    Echo,
    /// Sleep, then echo.
    Delayed(Duration),
}

#[derive(Clone)]
struct MockState {
    reply: Reply,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Handle on a running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockUpstream {
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn mock_handler(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    state.captured.lock().unwrap().push(CapturedRequest {
        method,
        uri,
        headers,
        body: body.clone(),
    });

    match state.reply {
        Reply::Fixed {
            status,
            content_type,
            body,
        } => (status, [("content-type", content_type)], body).into_response(),
        Reply::Echo => (StatusCode::OK, body).into_response(),
        Reply::Delayed(delay) => {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, body).into_response()
        }
    }
}

/// Start a mock upstream on an ephemeral loopback port.
pub async fn start_mock_upstream(reply: Reply) -> MockUpstream {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        reply,
        captured: captured.clone(),
    };
    let router = Router::new()
        .route("/", any(mock_handler))
        .route("/{*path}", any(mock_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    MockUpstream { addr, captured }
}

/// Start an upstream that reads the request and then never answers.
pub async fn start_stalling_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start an upstream that answers every request with a chunked 200 carrying `body`.
pub async fn start_chunked_upstream(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let (head, tail) = body.split_at(body.len() / 2);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
                     {:x}\r\n{}\r\n{:x}\r\n{}\r\n0\r\n\r\n",
                    head.len(),
                    head,
                    tail.len(),
                    tail
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// A loopback port with nothing listening on it.
pub async fn refused_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Default config bound to an ephemeral loopback port.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.scheme = "http".to_string();
    config
}

/// A running proxy whose traces land in `sink`.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub sink: MemorySink,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let sink = MemorySink::new();
    let server = ProxyServer::with_sink(&config, Arc::new(sink.clone())).unwrap();
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, receiver));

    RunningProxy {
        addr,
        sink,
        shutdown,
        handle,
    }
}

/// A client that sends every plain-HTTP request through the proxy.
pub fn proxied_client(proxy: SocketAddr) -> reqwest::Client {
    reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{proxy}")).unwrap())
        .build()
        .unwrap()
}

/// Like [`proxied_client`], but also sends `Proxy-Authorization`.
pub fn proxied_client_with_auth(proxy: SocketAddr, user: &str, password: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .proxy(
            reqwest::Proxy::http(format!("http://{proxy}"))
                .unwrap()
                .basic_auth(user, password),
        )
        .build()
        .unwrap()
}

/// Rendered text of every event, in emission order.
pub fn rendered(sink: &MemorySink) -> Vec<String> {
    sink.events().iter().map(ToString::to_string).collect()
}

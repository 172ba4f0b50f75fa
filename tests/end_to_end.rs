//! End-to-end exchanges through a live proxy and a mock upstream.

use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

use common::{Reply, CapturedRequest};

const TOKEN: &str = "Bearer abcdefghijklmnopqrstuvwxyz0123456789";
const MASKED: &str = "Bearer abcdefghijklmnopqr...56789";

fn single(captured: Vec<CapturedRequest>) -> CapturedRequest {
    assert_eq!(captured.len(), 1, "upstream saw {} requests", captured.len());
    captured.into_iter().next().unwrap()
}

#[tokio::test]
async fn chat_completion_is_relayed_and_traced_redacted() {
    let upstream = common::start_mock_upstream(Reply::Fixed {
        status: StatusCode::OK,
        content_type: "application/json",
        body: r#"{"model":"x"}"#,
    })
    .await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client(proxy.addr);

    let request_body = r#"{"messages":[{"role":"user","content":"hi"}],"model":"gpt-4o"}"#;
    let response = client
        .post(upstream.url("/v1/chat/completions"))
        .header("authorization", TOKEN)
        .header("content-type", "application/json")
        .body(request_body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"model":"x"}"#);

    let seen = single(upstream.captured());
    assert_eq!(seen.method, axum::http::Method::POST);
    assert_eq!(seen.uri.path(), "/v1/chat/completions");
    assert_eq!(seen.headers.get("authorization").unwrap(), TOKEN);
    assert_eq!(&seen.body[..], request_body.as_bytes());

    let traces = common::rendered(&proxy.sink);
    assert_eq!(traces.len(), 2);

    let inbound = &traces[0];
    assert!(inbound.starts_with(">>> "));
    assert!(inbound.contains("POST"));
    assert!(inbound.contains("/v1/chat/completions"));
    assert!(inbound.contains(&format!("Authorization: {MASKED}")));
    assert!(!inbound.contains(TOKEN));
    assert!(inbound.contains("Body (json):"));
    assert!(inbound.contains(r#""role": "user""#));

    let outbound = &traces[1];
    assert!(outbound.starts_with("<<< "));
    assert!(outbound.contains("200 OK"));
    assert!(outbound.contains(r#""model": "x""#));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn upstream_client_error_is_relayed_verbatim() {
    let upstream = common::start_mock_upstream(Reply::Fixed {
        status: StatusCode::NOT_FOUND,
        content_type: "application/json",
        body: r#"{"error":"no such model"}"#,
    })
    .await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client(proxy.addr);

    let response = client
        .get(upstream.url("/v1/models/missing"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), r#"{"error":"no such model"}"#);

    let events = proxy.sink.events();
    assert_eq!(events.len(), 2);
    assert!(!events[1].is_failure());
    assert!(events[1].to_string().contains("404 Not Found"));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn get_is_forwarded_without_body() {
    let upstream = common::start_mock_upstream(Reply::Echo).await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client(proxy.addr);

    let response = client
        .get(upstream.url("/models?limit=5"))
        .header("x-request-id", "abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let seen = single(upstream.captured());
    assert_eq!(seen.method, axum::http::Method::GET);
    assert_eq!(seen.uri.path_and_query().unwrap().as_str(), "/models?limit=5");
    assert_eq!(seen.headers.get("x-request-id").unwrap(), "abc");
    assert!(seen.body.is_empty());

    let traces = common::rendered(&proxy.sink);
    assert!(traces[0].contains("X-Request-Id: abc"));
    assert!(!traces[0].contains("Body (json):"));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn proxy_authorization_is_not_forwarded() {
    let upstream = common::start_mock_upstream(Reply::Echo).await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client_with_auth(proxy.addr, "user", "secret-password");

    let response = client
        .post(upstream.url("/v1/echo"))
        .body("ping")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ping");

    let seen = single(upstream.captured());
    assert!(seen.headers.get("proxy-authorization").is_none());
    assert!(seen.headers.get("proxy-connection").is_none());

    let traces = common::rendered(&proxy.sink);
    assert!(traces.iter().all(|t| !t.contains("secret-password")));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn non_json_body_is_traced_raw() {
    let upstream = common::start_mock_upstream(Reply::Echo).await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client(proxy.addr);

    client
        .post(upstream.url("/upload"))
        .header("content-type", "text/plain")
        .body("not json at all")
        .send()
        .await
        .unwrap();

    let traces = common::rendered(&proxy.sink);
    assert_eq!(traces.len(), 2);
    assert!(traces[0].contains("Body (raw):"));
    assert!(traces[0].contains("not json at all"));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_lets_in_flight_exchange_finish() {
    let upstream = common::start_mock_upstream(Reply::Delayed(Duration::from_millis(300))).await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client(proxy.addr);

    let url = upstream.url("/slow");
    let request = tokio::spawn(async move { client.post(url).body("late").send().await });

    // Let the exchange reach the upstream before asking to stop.
    tokio::time::sleep(Duration::from_millis(100)).await;
    proxy.shutdown.trigger();

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "late");

    let result = tokio::time::timeout(Duration::from_secs(5), proxy.handle)
        .await
        .expect("server did not stop after draining")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(proxy.sink.events().len(), 2);
}

#[tokio::test]
async fn chunked_upstream_reply_is_relayed_in_full() {
    let upstream = common::start_chunked_upstream(r#"{"a":1}"#).await;
    let proxy = common::start_proxy(common::test_config()).await;
    let client = common::proxied_client(proxy.addr);

    let response = client
        .get(format!("http://{upstream}/v1/models"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"a":1}"#);

    // Same exchange over a bare socket: the reply must carry the body.
    let mut socket = TcpStream::connect(proxy.addr).await.unwrap();
    let request = format!(
        "GET http://{upstream}/v1/models HTTP/1.1\r\nHost: {upstream}\r\nConnection: close\r\n\r\n"
    );
    socket.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    socket.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);
    assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
    assert!(raw.ends_with(r#"{"a":1}"#), "{raw}");

    let traces = common::rendered(&proxy.sink);
    assert_eq!(traces.len(), 4);
    assert!(traces[1].contains(r#""a": 1"#));

    proxy.shutdown.trigger();
}

#[tokio::test]
async fn client_disconnect_does_not_abandon_the_exchange() {
    let upstream = common::start_mock_upstream(Reply::Delayed(Duration::from_millis(500))).await;
    let proxy = common::start_proxy(common::test_config()).await;

    let mut socket = TcpStream::connect(proxy.addr).await.unwrap();
    let url = upstream.url("/v1/slow");
    let request = format!(
        "POST {url} HTTP/1.1\r\nHost: {}\r\nContent-Length: 4\r\n\r\nlate",
        upstream.addr
    );
    socket.write_all(request.as_bytes()).await.unwrap();

    // Hang up while the upstream is still working.
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(socket);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let events = proxy.sink.events();
    assert_eq!(events.len(), 2, "inbound trace left without its outbound partner");
    assert!(events[0].is_inbound());
    assert!(!events[1].is_inbound());
    assert!(!events[1].is_failure());
    assert_eq!(upstream.captured().len(), 1);

    proxy.shutdown.trigger();
}

//! Executor behaviour over real sockets.
//!
//! # Design
//! A small axum router records every request it receives (method, URI,
//! headers and body) into a channel and answers based on the path, so the
//! tests can assert on exactly what went over the wire. The timeout and
//! refused-connection cases use bare sockets because no HTTP server can
//! produce them.

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use petstore_core::{
    ExecutorConfig, HttpMethod, HttpRequestExecutor, HttpRequestInput, NetworkError, VarLayout,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Debug)]
struct Captured {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

async fn record(
    State(tx): State<mpsc::UnboundedSender<Captured>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let _ = tx.send(Captured {
        method,
        uri,
        headers,
        body,
    });
    match path.as_str() {
        "/missing" => (StatusCode::NOT_FOUND, "missing").into_response(),
        "/large" => "x".repeat(100).into_response(),
        _ => ([(header::CONTENT_TYPE, "application/json")], r#"{"id":7}"#).into_response(),
    }
}

async fn capture_server() -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new().fallback(record).with_state(tx);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    (addr, rx)
}

#[tokio::test]
async fn address_layout_sends_query_string() {
    let (addr, mut rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let mut input = HttpRequestInput::new(format!("http://{addr}/pet/findByStatus"), HttpMethod::Get)
        .with_layout(VarLayout::Address);
    input.add_var("status", "available,sold");
    input.add_var("x y", "a&b");

    let outcome = executor.execute(input).await;
    assert_eq!(outcome.error, NetworkError::NoError, "{}", outcome.error_str);
    assert_eq!(outcome.status, Some(200));
    assert_eq!(outcome.body, br#"{"id":7}"#);
    assert_eq!(outcome.header("content-type"), Some("application/json"));

    let captured = rx.recv().await.unwrap();
    assert_eq!(captured.method, Method::GET);
    assert_eq!(
        captured.uri.path_and_query().unwrap().as_str(),
        "/pet/findByStatus?status=available%2Csold&x%20y=a%26b"
    );
    assert!(captured.body.is_empty());
}

#[tokio::test]
async fn urlencoded_layout_sends_form_body() {
    let (addr, mut rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let mut input = HttpRequestInput::new(format!("http://{addr}/pet/9"), HttpMethod::Post)
        .with_layout(VarLayout::UrlEncoded);
    input.add_var("name", "Rex the dog");
    input.add_var("status", "sold");

    let outcome = executor.execute(input).await;
    assert!(outcome.is_success(), "{}", outcome.error_str);

    let captured = rx.recv().await.unwrap();
    assert_eq!(captured.method, Method::POST);
    assert_eq!(captured.uri.path(), "/pet/9");
    assert_eq!(
        captured.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(&captured.body[..], b"name=Rex%20the%20dog&status=sold");
}

#[tokio::test]
async fn multipart_layout_sends_vars_and_file() {
    let path = std::env::temp_dir().join(format!("petstore-exec-{}.bin", std::process::id()));
    std::fs::write(&path, b"\x89PNG").unwrap();

    let (addr, mut rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let mut input = HttpRequestInput::new(format!("http://{addr}/pet/9/uploadImage"), HttpMethod::Post)
        .with_layout(VarLayout::Multipart);
    input.add_var("additionalMetadata", "front");
    input.add_file("file", &path, "dog.png", "image/png");

    let outcome = executor.execute(input).await;
    std::fs::remove_file(&path).unwrap();
    assert!(outcome.is_success(), "{}", outcome.error_str);

    let captured = rx.recv().await.unwrap();
    let boundary = captured
        .header("content-type")
        .and_then(|ct| ct.strip_prefix("multipart/form-data; boundary="))
        .unwrap()
        .to_string();
    let body = String::from_utf8_lossy(&captured.body).into_owned();
    assert!(body.starts_with(&format!("--{boundary}\r\n")));
    assert!(body.contains("name=\"additionalMetadata\"\r\nContent-Type: text/plain\r\n\r\nfront\r\n"));
    assert!(body.contains("name=\"file\"; filename=\"dog.png\"\r\nContent-Type: image/png\r\n"));
    assert!(body.ends_with(&format!("--{boundary}--")));
}

#[tokio::test]
async fn raw_body_and_headers_are_sent() {
    let (addr, mut rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let mut input = HttpRequestInput::new(format!("http://{addr}/pet"), HttpMethod::Put)
        .with_body(r#"{"name":"Rex"}"#);
    input.add_header("Content-Type", "application/json");
    input.add_header("api_key", "special-key");

    let outcome = executor.execute(input).await;
    assert!(outcome.is_success(), "{}", outcome.error_str);

    let captured = rx.recv().await.unwrap();
    assert_eq!(captured.method, Method::PUT);
    assert_eq!(captured.header("api_key"), Some("special-key"));
    assert_eq!(captured.header("content-type"), Some("application/json"));
    assert!(captured.header("user-agent").unwrap().starts_with("petstore-core/"));
    assert_eq!(&captured.body[..], br#"{"name":"Rex"}"#);
}

#[tokio::test]
async fn delete_keeps_its_raw_body() {
    let (addr, mut rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let input = HttpRequestInput::new(format!("http://{addr}/store/order/5"), HttpMethod::Delete)
        .with_body("reason=duplicate");
    let outcome = executor.execute(input).await;
    assert!(outcome.is_success(), "{}", outcome.error_str);

    let captured = rx.recv().await.unwrap();
    assert_eq!(captured.method, Method::DELETE);
    assert_eq!(&captured.body[..], b"reason=duplicate");
}

#[tokio::test]
async fn error_status_is_not_a_transport_error() {
    let (addr, _rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let outcome = executor
        .execute(HttpRequestInput::new(format!("http://{addr}/missing"), HttpMethod::Get))
        .await;
    assert_eq!(outcome.error, NetworkError::NoError);
    assert_eq!(outcome.status, Some(404));
    assert_eq!(outcome.text(), "missing");
}

#[tokio::test]
async fn oversized_response_is_a_protocol_error() {
    let (addr, _rx) = capture_server().await;
    let executor = HttpRequestExecutor::new(ExecutorConfig {
        max_response_bytes: 10,
        ..ExecutorConfig::default()
    });

    let outcome = executor
        .execute(HttpRequestInput::new(format!("http://{addr}/large"), HttpMethod::Get))
        .await;
    assert_eq!(outcome.error, NetworkError::Protocol, "{}", outcome.error_str);
    assert_eq!(outcome.status, Some(200));
    assert!(outcome.body.is_empty());
    assert!(!outcome.error_str.is_empty());
}

#[tokio::test]
async fn unreachable_host_reports_connection_failure() {
    let port = {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let executor = HttpRequestExecutor::default();

    let outcome = executor
        .execute(HttpRequestInput::new(format!("http://127.0.0.1:{port}/pet"), HttpMethod::Get))
        .await;
    assert!(
        matches!(outcome.error, NetworkError::ConnectionRefused | NetworkError::Timeout),
        "unexpected classification {:?}: {}",
        outcome.error,
        outcome.error_str
    );
    assert!(outcome.body.is_empty());
    assert_eq!(outcome.status, None);
    assert!(!outcome.error_str.is_empty());
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (release_tx, release_rx) = std_mpsc::channel::<()>();
    thread::spawn(move || {
        let (_stream, _) = listener.accept().unwrap();
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
    });

    let executor = HttpRequestExecutor::new(ExecutorConfig {
        timeout: Some(Duration::from_millis(300)),
        ..ExecutorConfig::default()
    });
    let outcome = executor
        .execute(HttpRequestInput::new(format!("http://{addr}/slow"), HttpMethod::Get))
        .await;
    let _ = release_tx.send(());

    assert_eq!(outcome.error, NetworkError::Timeout, "{}", outcome.error_str);
    assert!(outcome.body.is_empty());
}

#[tokio::test]
async fn concurrent_executions_keep_separate_buffers() {
    let (addr, _rx) = capture_server().await;
    let executor = HttpRequestExecutor::default();

    let first = executor.execute(HttpRequestInput::new(format!("http://{addr}/a"), HttpMethod::Get));
    let second =
        executor.execute(HttpRequestInput::new(format!("http://{addr}/missing"), HttpMethod::Get));
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.status, Some(200));
    assert_eq!(first.text(), r#"{"id":7}"#);
    assert_eq!(second.status, Some(404));
    assert_eq!(second.text(), "missing");
}

#[test]
fn execute_without_runtime_completes_inline() {
    let server_runtime = tokio::runtime::Runtime::new().unwrap();
    let (addr, mut rx) = server_runtime.block_on(capture_server());
    let executor = HttpRequestExecutor::default();

    let execution = executor.execute(HttpRequestInput::new(
        format!("http://{addr}/pet/7"),
        HttpMethod::Get,
    ));
    let outcome = futures::executor::block_on(execution);
    assert_eq!(outcome.status, Some(200));
    assert_eq!(outcome.body, br#"{"id":7}"#);
    assert_eq!(rx.try_recv().unwrap().uri.path(), "/pet/7");
}

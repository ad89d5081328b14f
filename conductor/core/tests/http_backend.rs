//! HTTP backend tests against a local canned server

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use triage_conductor::{AskBackend, AskRequest, BackendError, HttpBackend};

/// What the server saw
struct Captured {
    request_line: String,
    body: serde_json::Value,
}

/// Serve exactly one request with the given status and body
async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> (String, oneshot::Receiver<Captured>) {
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    serve_raw(response, Duration::ZERO).await
}

/// Serve exactly one request with raw response bytes, keeping the
/// connection open for `hold` afterwards
async fn serve_raw(response: String, hold: Duration) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        // Read headers, then as much body as Content-Length says
        let (head_end, content_length) = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (pos + 4, length);
            }
        };
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let request_line = head.lines().next().unwrap_or_default().to_string();
        let request_body = serde_json::from_slice(&buf[head_end..head_end + content_length])
            .unwrap_or(serde_json::Value::Null);
        let _ = tx.send(Captured {
            request_line,
            body: request_body,
        });

        socket.write_all(response.as_bytes()).await.unwrap();
        tokio::time::sleep(hold).await;
        socket.shutdown().await.ok();
    });

    (format!("http://{addr}"), rx)
}

#[tokio::test]
async fn test_posts_question_and_topk() {
    let (url, captured) = serve_once(
        "200 OK",
        r#"{"answer": "The late fee is $25.", "retrieved_docs": ["policy_fees.pdf", "faq.md"]}"#,
    )
    .await;
    let backend = HttpBackend::new(format!("{url}/")).unwrap();

    let response = backend
        .ask(&AskRequest::new("What is the late fee?", 4))
        .await
        .unwrap();

    assert_eq!(response.answer.as_deref(), Some("The late fee is $25."));
    assert_eq!(response.retrieved_docs, vec!["policy_fees.pdf", "faq.md"]);

    let captured = captured.await.unwrap();
    assert!(captured.request_line.starts_with("POST /api/ask "));
    assert_eq!(
        captured.body,
        serde_json::json!({"question": "What is the late fee?", "topk": 4})
    );
}

#[tokio::test]
async fn test_server_error_status() {
    let (url, _captured) = serve_once("500 Internal Server Error", r#"{"detail": "boom"}"#).await;
    let backend = HttpBackend::new(url).unwrap();

    let err = backend.ask(&AskRequest::new("q", 4)).await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 500, .. }));
    assert_eq!(err.to_string(), "Server 500");
}

#[tokio::test]
async fn test_empty_object_is_not_an_error() {
    let (url, _captured) = serve_once("200 OK", "{}").await;
    let backend = HttpBackend::new(url).unwrap();

    let response = backend.ask(&AskRequest::new("q", 4)).await.unwrap();
    assert!(response.answer.is_none());
    assert!(response.retrieved_docs.is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let (url, _captured) = serve_once("200 OK", "<html>oops</html>").await;
    let backend = HttpBackend::new(url).unwrap();

    let err = backend.ask(&AskRequest::new("q", 4)).await.unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend =
        HttpBackend::with_timeout(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
    let err = backend.ask(&AskRequest::new("q", 4)).await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let backend =
        HttpBackend::with_timeout(format!("http://{addr}"), Duration::from_millis(100)).unwrap();
    let err = backend.ask(&AskRequest::new("q", 4)).await.unwrap_err();
    assert_eq!(err, BackendError::Timeout(Duration::from_millis(100)));
}

#[tokio::test]
async fn test_error_status_wins_over_truncated_body() {
    let (url, _captured) = serve_raw(
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\nconnection: close\r\n\r\nshort"
            .to_string(),
        Duration::ZERO,
    )
    .await;
    let backend = HttpBackend::new(url).unwrap();

    let err = backend.ask(&AskRequest::new("q", 4)).await.unwrap_err();

    assert!(matches!(err, BackendError::Status { status: 500, .. }));
    assert_eq!(format!("Error: {err}"), "Error: Server 500");
}

#[tokio::test]
async fn test_error_status_not_held_up_by_stalled_body() {
    let (url, _captured) = serve_raw(
        "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\npartial".to_string(),
        Duration::from_secs(30),
    )
    .await;
    let backend = HttpBackend::with_timeout(url, Duration::from_secs(20)).unwrap();

    let started = std::time::Instant::now();
    let err = backend.ask(&AskRequest::new("q", 4)).await.unwrap_err();

    assert!(matches!(err, BackendError::Status { status: 503, .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

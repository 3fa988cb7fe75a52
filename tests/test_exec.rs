use std::time::Duration;

use bytes::Bytes;
use falcon::config::ExecConfig;
use falcon::exec::{CommandBridge, ExecError, TIMEOUT_MARKER, TRUNCATION_MARKER};
use falcon::http::body::BodyError;
use falcon::http::response::{Body, StatusCode};
use falcon::server::Shutdown;

fn bridge() -> CommandBridge {
    CommandBridge::new(&ExecConfig::default())
}

#[tokio::test]
async fn test_exec_small_output() {
    let shutdown = Shutdown::new();

    let out = bridge().run(b"printf hello", shutdown.subscribe()).await.unwrap();

    assert_eq!(out.stdout, b"hello");
    assert!(!out.truncated);
    assert!(!out.timed_out);
    assert_eq!(out.into_body(), b"hello");
}

#[tokio::test]
async fn test_exec_stderr_is_not_captured() {
    let shutdown = Shutdown::new();

    let out = bridge()
        .run(b"echo visible; echo hidden 1>&2", shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(out.stdout, b"visible\n");
}

#[tokio::test]
async fn test_exec_output_at_limit_is_not_truncated() {
    let shutdown = Shutdown::new();

    let out = bridge()
        .run(b"head -c 65536 /dev/zero", shutdown.subscribe())
        .await
        .unwrap();

    assert_eq!(out.stdout.len(), 65536);
    assert!(!out.truncated);
    assert_eq!(out.into_body().len(), 65536);
}

#[tokio::test]
async fn test_exec_output_over_limit_is_truncated() {
    let shutdown = Shutdown::new();

    let out = bridge()
        .run(b"head -c 70000 /dev/zero", shutdown.subscribe())
        .await
        .unwrap();

    assert!(out.truncated);
    let body = out.into_body();
    assert_eq!(body.len(), 65536 + TRUNCATION_MARKER.len());
    assert!(body.ends_with(TRUNCATION_MARKER));
}

#[tokio::test]
async fn test_exec_endless_output_is_cut_and_killed() {
    let shutdown = Shutdown::new();

    let out = tokio::time::timeout(
        Duration::from_secs(10),
        bridge().run(b"yes", shutdown.subscribe()),
    )
    .await
    .expect("endless command must not hang")
    .unwrap();

    assert!(out.truncated);
    assert_eq!(out.stdout.len(), 65536);
}

#[tokio::test]
async fn test_exec_timeout_keeps_partial_output() {
    let shutdown = Shutdown::new();
    let bridge = bridge().with_timeout(Some(Duration::from_millis(300)));

    let out = bridge
        .run(b"echo early; sleep 5; echo late", shutdown.subscribe())
        .await
        .unwrap();

    assert!(out.timed_out);
    assert_eq!(out.stdout, b"early\n");
    assert_eq!(out.into_body(), b"early\n\n[timed out]");
}

#[tokio::test]
async fn test_exec_timeout_without_trailing_newline() {
    let shutdown = Shutdown::new();
    let bridge = bridge().with_timeout(Some(Duration::from_millis(300)));

    let out = bridge
        .run(b"printf start; sleep 5", shutdown.subscribe())
        .await
        .unwrap();

    let body = out.into_body();
    assert_eq!(body.len(), 5 + TIMEOUT_MARKER.len());
    assert_eq!(body, b"start\n[timed out]");
}

#[tokio::test]
async fn test_exec_cancelled_by_shutdown() {
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let bridge = bridge();

    let task = tokio::spawn(async move { bridge.run(b"sleep 5", rx).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.trigger();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(ExecError::Cancelled)));
}

#[tokio::test]
async fn test_read_command_stops_at_nul() {
    let mut stream: &[u8] = b"\0ignored";

    let command = bridge()
        .read_command(Bytes::from_static(b"echo hi"), 9, &mut stream)
        .await
        .unwrap();

    assert_eq!(command, b"echo hi");
}

#[tokio::test]
async fn test_read_command_in_small_chunks() {
    let mut stream: &[u8] = b" hi there";

    let command = bridge()
        .with_chunk_size(2)
        .read_command(Bytes::from_static(b"echo"), 13, &mut stream)
        .await
        .unwrap();

    assert_eq!(command, b"echo hi there");
}

#[tokio::test]
async fn test_read_command_overflow() {
    let bridge = CommandBridge::new(&ExecConfig {
        max_command_bytes: 4,
        ..ExecConfig::default()
    });
    let mut stream: &[u8] = b"";

    let err = bridge
        .read_command(Bytes::from_static(b"echo hi"), 7, &mut stream)
        .await
        .unwrap_err();

    assert!(matches!(err, BodyError::Overflow(_)));
}

#[tokio::test]
async fn test_handle_rejects_missing_or_oversized_length() {
    let shutdown = Shutdown::new();
    let bridge = bridge();

    for declared in [None, Some(bridge.max_command() as u64 + 1)] {
        let mut stream: &[u8] = b"";
        let response = bridge
            .handle(declared, Bytes::new(), &mut stream, shutdown.subscribe())
            .await;
        assert_eq!(response.status, StatusCode::BadRequest);
    }
}

#[tokio::test]
async fn test_handle_zero_length_runs_empty_command() {
    let shutdown = Shutdown::new();
    let mut stream: &[u8] = b"";

    let response = bridge()
        .handle(Some(0), Bytes::new(), &mut stream, shutdown.subscribe())
        .await;

    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_handle_short_body_is_server_error() {
    let shutdown = Shutdown::new();
    let mut stream: &[u8] = b"ho";

    let response = bridge()
        .handle(Some(10), Bytes::from_static(b"ec"), &mut stream, shutdown.subscribe())
        .await;

    assert_eq!(response.status, StatusCode::InternalServerError);
}

#[tokio::test]
async fn test_handle_reads_body_from_stream() {
    let shutdown = Shutdown::new();
    let mut stream: &[u8] = b" 42";

    let response = bridge()
        .handle(Some(7), Bytes::from_static(b"echo"), &mut stream, shutdown.subscribe())
        .await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    match response.body {
        Body::Bytes(bytes) => assert_eq!(bytes, b"42\n"),
        Body::File { .. } => panic!("expected captured output"),
    }
}

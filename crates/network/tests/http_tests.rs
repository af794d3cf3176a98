// crates/network/tests/http_tests.rs
//! HTTP transport tests against a local mock server

use netaction::{
    ClientConfig, FailureReason, Fetch, HttpTransport, NetAction, SharedTransport, Task,
    TaskStatus, TransportError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> SharedTransport {
    let config = ClientConfig {
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    };
    Arc::new(HttpTransport::with_config(config).expect("transport"))
}

fn fetch(server: &MockServer, route: &str, behavior: Fetch) -> NetAction<Fetch> {
    NetAction::parse(&format!("{}{}", server.uri(), route), behavior).expect("valid url")
}

#[tokio::test]
async fn test_get_succeeds() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
        .mount(&server)
        .await;

    let mut action = fetch(&server, "/index.json", Fetch::new());
    action.start(transport()).expect("start");
    let status = action.run().await;

    assert_eq!(status, TaskStatus::Succeeded);
    assert_eq!(action.behavior().text().unwrap(), "{\"ok\":true}");
    assert_eq!(action.bytes_received(), 11);
    assert_eq!(action.bytes_total(), Some(11));
}

#[tokio::test]
async fn test_http_status_becomes_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut action = fetch(&server, "/missing", Fetch::new());
    action.start(transport()).expect("start");
    let status = action.run().await;

    assert_eq!(
        status,
        TaskStatus::Failed(FailureReason::Transport(TransportError::HttpStatus(404)))
    );
    assert_eq!(action.behavior().error(), Some(&TransportError::HttpStatus(404)));
}

#[tokio::test]
async fn test_head_request() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/probe"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut action = fetch(&server, "/probe", Fetch::head());
    action.start(transport()).expect("start");

    assert_eq!(action.run().await, TaskStatus::Succeeded);
    assert!(action.behavior().is_empty());
}

#[tokio::test]
async fn test_cancel_during_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut action = fetch(&server, "/slow", Fetch::new());
    action.start(transport()).expect("start");
    let handle = action.cancel_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    assert_eq!(action.run().await, TaskStatus::Cancelled);
    assert!(action.behavior().is_empty());
}

#[tokio::test]
async fn test_connection_refused() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let mut action = Fetch::action(&format!("http://127.0.0.1:{}/", port)).expect("valid url");
    action.start(transport()).expect("start");

    match action.run().await {
        TaskStatus::Failed(FailureReason::Transport(error)) => assert!(error.is_retryable()),
        other => panic!("unexpected status: {}", other),
    }
}

#[tokio::test]
async fn test_max_bytes_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
        .mount(&server)
        .await;

    let mut action = fetch(&server, "/big", Fetch::new().with_max_bytes(1024));
    action.start(transport()).expect("start");

    assert_eq!(action.run().await, TaskStatus::Succeeded);
    assert_eq!(action.behavior().len(), 1024);
    assert!(action.behavior().overflowed());
    assert!(action.is_finished());
}

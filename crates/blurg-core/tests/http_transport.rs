use std::net::TcpListener;
use std::sync::Arc;

use blurg_core::api::RemoteClient;
use blurg_core::transport::HttpTransport;
use blurg_core::{DiaryError, Verification};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Basic credentials for key `abc123` with an empty password.
const AUTH: &str = "Basic YWJjMTIzOg==";

fn client(base_url: String) -> RemoteClient {
    let transport = HttpTransport::new().expect("http client should build");
    RemoteClient::new(base_url, Arc::new(transport))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_init_posts_form_without_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/init"))
        .and(body_string_contains("diaryname=new_diary"))
        .and(body_string_contains("username=test_user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let key = tokio::task::spawn_blocking(move || client(uri).init("new_diary", "test_user"))
        .await
        .unwrap()
        .expect("init should succeed");
    assert_eq!(key, "abc123");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_log_and_list_send_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/log"))
        .and(header("authorization", AUTH))
        .and(body_string_contains("text=hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/list"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                { "id": 2, "text": "second", "date": "2024-01-02T08:00:00Z" },
                { "id": 1, "text": "hello", "date": "2024-01-01T08:00:00Z" },
            ]
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let entries = tokio::task::spawn_blocking(move || {
        let client = client(uri);
        assert_eq!(client.log("abc123", "hello")?, None);
        client.list("abc123")
    })
    .await
    .unwrap()
    .expect("log and list should succeed");

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, 1);
    assert_eq!(entries[0].date_str(), "01-01-2024 08:00");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rm_404_is_entry_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/rm/7/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || client(uri).remove("abc123", 7))
        .await
        .unwrap();
    assert!(matches!(result, Err(DiaryError::EntryNotFound(7))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_unknown_key_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "error" })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let verification = tokio::task::spawn_blocking(move || client(uri).verify("abc123"))
        .await
        .unwrap()
        .expect("verify should not fail on a bad key");
    assert_eq!(verification, Verification::Invalid);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/wipe"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "result": "error", "message": "boom" })),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || client(uri).wipe("abc123"))
        .await
        .unwrap();
    assert!(matches!(result, Err(DiaryError::Rejected(_))));
}

#[test]
fn test_closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(format!("http://{addr}")).init("new_diary", "test_user");
    assert!(matches!(result, Err(DiaryError::Unreachable(_))));
}

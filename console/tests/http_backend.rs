use std::time::Duration;

use common_auth::{SessionBlob, TokenStore};
use common_money::Amount;
use fee_console::models::{Credentials, DebitRequest, SignInKind};
use fee_console::scan::TransactionError;
use fee_console::{Backend, BackendError, HttpBackend};
use httpmock::prelude::*;
use serde_json::json;

fn backend_for(server: &MockServer, store: TokenStore) -> HttpBackend {
    HttpBackend::new(server.base_url(), Duration::from_secs(5), store).expect("client")
}

fn signed_in_store() -> TokenStore {
    let store = TokenStore::in_memory();
    store.write(&SessionBlob::new("header.payload.sig")).expect("write");
    store
}

fn debit_request() -> DebitRequest {
    DebitRequest {
        student_id: "K-001-002".into(),
        student_name: "Jeffery Bukuroh".into(),
        class: "Class 1".into(),
        terminal: "Canteen".into(),
        amount: Amount::from_minor(500),
    }
}

#[tokio::test]
async fn list_calls_send_bearer_token_from_session() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/terminals/SCH-1")
                .header("authorization", "Bearer header.payload.sig");
            then.status(200)
                .json_body(json!([{ "name": "Canteen", "price": 5 }, { "id": "Bus", "price": "12.5" }]));
        })
        .await;

    let terminals = backend_for(&server, signed_in_store())
        .terminals("SCH-1")
        .await
        .expect("terminals");
    mock.assert_async().await;
    assert_eq!(terminals.len(), 2);
    assert_eq!(terminals[1].name, "Bus");
    assert_eq!(terminals[1].price, Amount::from_minor(1250));
}

#[tokio::test]
async fn students_by_class_level_escape_path_segments() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/students/SCH-1/Class%201");
            then.status(200).json_body(json!([]));
        })
        .await;

    let students = backend_for(&server, signed_in_store())
        .students("SCH-1", Some("Class 1"))
        .await
        .expect("students");
    mock.assert_async().await;
    assert!(students.is_empty());
}

#[tokio::test]
async fn calls_without_session_fail_before_sending() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!([]));
        })
        .await;

    let err = backend_for(&server, TokenStore::in_memory())
        .entries("SCH-1")
        .await
        .expect_err("no session");
    assert!(matches!(err, BackendError::MissingSession));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn login_returns_session_blob_without_bearer() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/teacher-login")
                .json_body(json!({ "email": "t@school.test", "password": "pw" }));
            then.status(200).json_body(json!({
                "token": "a.b.c",
                "user": { "name": "Ama", "role": "teacher", "school_id": 7 }
            }));
        })
        .await;

    let credentials = Credentials {
        email: "t@school.test".into(),
        password: "pw".into(),
    };
    let blob = backend_for(&server, TokenStore::in_memory())
        .login(SignInKind::Teacher, &credentials)
        .await
        .expect("login");
    mock.assert_async().await;
    assert_eq!(blob.token, "a.b.c");
    let user = blob.user.expect("user");
    assert_eq!(user.school_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn debit_rejection_body_maps_to_transaction_error() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/debit")
                .header("authorization", "Bearer header.payload.sig")
                .json_body_partial(r#"{"student_id":"K-001-002","class":"Class 1","terminal":"Canteen"}"#);
            then.status(400).json_body(json!({ "error": "Low balance" }));
        })
        .await;

    let err = backend_for(&server, signed_in_store())
        .debit(&debit_request())
        .await
        .expect_err("rejected");
    mock.assert_async().await;
    assert!(matches!(err, BackendError::Rejected { status: 400, ref message } if message == "Low balance"));
    assert_eq!(TransactionError::from_backend(&err), TransactionError::LowBalance);
}

#[tokio::test]
async fn debit_ok_status_with_error_field_is_still_a_rejection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/debit");
            then.status(200)
                .json_body(json!({ "success": false, "error": "Duplicate transaction" }));
        })
        .await;

    let err = backend_for(&server, signed_in_store())
        .debit(&debit_request())
        .await
        .expect_err("rejected");
    assert_eq!(TransactionError::from_backend(&err), TransactionError::Duplicate);
}

#[tokio::test]
async fn debit_success_echoes_details() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/debit");
            then.status(200).json_body(json!({
                "success": true,
                "details": { "name": "Jeffery Bukuroh", "amount": 5, "terminal": "Canteen" }
            }));
        })
        .await;

    let receipt = backend_for(&server, signed_in_store())
        .debit(&debit_request())
        .await
        .expect("receipt");
    assert_eq!(receipt.name, "Jeffery Bukuroh");
    assert_eq!(receipt.amount, Amount::from_minor(500));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let store = signed_in_store();
    let backend = HttpBackend::new("http://127.0.0.1:1", Duration::from_secs(2), store).expect("client");
    let err = backend.debit(&debit_request()).await.expect_err("offline");
    assert!(matches!(err, BackendError::Network(_)));
    assert_eq!(TransactionError::from_backend(&err), TransactionError::Network);
}

#[tokio::test]
async fn terminal_rows_with_numeric_ids_still_load() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/terminals/SCH-1");
            then.status(200).json_body(json!([
                { "id": 3, "name": "Bus", "price": 5 },
                { "id": "t4", "terminal": "Canteen", "price": "2.5" }
            ]));
        })
        .await;

    let terminals = backend_for(&server, signed_in_store())
        .terminals("SCH-1")
        .await
        .expect("terminals");
    let names: Vec<&str> = terminals.iter().map(|terminal| terminal.name.as_str()).collect();
    assert_eq!(names, ["Bus", "Canteen"]);
}

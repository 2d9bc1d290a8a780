mod support;

use std::sync::Arc;

use bloodlink::auth::{Credential, CredentialStore};
use bloodlink::error::ErrorKind;
use bloodlink::session::{Role, SessionObserver};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{client_for, error_body, RecordingStore, StoreWrite};

#[tokio::test]
async fn login_stores_tokens_and_returns_role_details() {
    let server = MockServer::start().await;
    let form = json!({ "email": "nurse@centralbank.org", "password": "pw" });
    Mock::given(method("POST"))
        .and(path("/api/facility-login"))
        .and(body_json(form.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "accessToken": "A1",
                "refreshToken": "R1",
                "facilityDetails": { "id": "f-1", "name": "Central Blood Bank" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::new());
    let client = client_for(&server, store.clone());
    let session = SessionObserver::attach(&client);
    let outcome = client.login(Role::Facility, &form).await.expect("login");

    assert_eq!(outcome.role, Role::Facility);
    assert_eq!(outcome.details, json!({ "id": "f-1", "name": "Central Blood Bank" }));
    assert_eq!(store.get(), Some(Credential::new("A1", "R1")));

    let state = session.snapshot();
    assert!(state.is_authenticated);
    assert_eq!(state.role, Some(Role::Facility));
    assert_eq!(state.user, Some(outcome.details));
}

#[tokio::test]
async fn login_sends_no_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "accessToken": "A1", "refreshToken": "R1", "adminDetails": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::seeded("old", "old-refresh"));
    let client = client_for(&server, store.clone());
    client
        .login(Role::Admin, &json!({ "username": "root", "password": "pw" }))
        .await
        .expect("login");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
    assert_eq!(store.get(), Some(Credential::new("A1", "R1")));
}

#[tokio::test]
async fn failed_login_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user-login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("INCORRECT_PASSWORD", "l")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::new());
    let client = client_for(&server, store.clone());
    let result = client
        .login(Role::User, &json!({ "email": "donor@example.org", "password": "nope" }))
        .await;

    assert_eq!(result, Err(ErrorKind::IncorrectPassword));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn login_without_tokens_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/organiser-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "organiserDetails": { "id": "o-1" } }
        })))
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::new());
    let client = client_for(&server, store.clone());
    let result = client.login(Role::Organiser, &json!({})).await;

    assert_eq!(result, Err(ErrorKind::UnknownError));
    assert!(store.get().is_none());
}

#[tokio::test]
async fn register_reports_duplicate_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/user-register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "DUPLICATE_RECORD",
                "data": { "req_uuid": "r", "detail": "email" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::new());
    let client = client_for(&server, store);
    let result = client
        .register(Role::User, &json!({ "email": "taken@example.org" }))
        .await;

    assert_eq!(
        result,
        Err(ErrorKind::DuplicateRecord {
            detail: Some("email".to_string())
        })
    );
}

#[tokio::test]
async fn register_returns_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/organiser-register"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "data": { "organiserId": "o-9" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::new());
    let client = client_for(&server, store.clone());
    let data = client
        .register(Role::Organiser, &json!({ "name": "Red Drive" }))
        .await
        .expect("register");

    assert_eq!(data, json!({ "organiserId": "o-9" }));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn logout_clears_store_and_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(json!({ "refreshToken": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::seeded("A1", "R1"));
    let client = client_for(&server, store.clone());
    let session = SessionObserver::attach(&client);
    session.mark_authenticated(Role::User, json!({ "id": "u-1" }));

    client.logout().await.expect("logout");

    assert!(store.get().is_none());
    assert_eq!(store.writes(), vec![StoreWrite::Clear]);
    let state = session.snapshot();
    assert!(!state.is_authenticated);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn logout_all_uses_its_own_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout-all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::seeded("A1", "R1"));
    let client = client_for(&server, store.clone());
    client.logout_all().await.expect("logout all");

    assert!(store.get().is_none());
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn logout_without_credential_is_no_auth() {
    let server = MockServer::start().await;
    let store = Arc::new(RecordingStore::new());
    let client = client_for(&server, store.clone());

    let result = client.logout().await;

    assert_eq!(result, Err(ErrorKind::NoAuth));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn failed_logout_keeps_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("SERVICE_ERROR", "o")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(RecordingStore::seeded("A1", "R1"));
    let client = client_for(&server, store.clone());
    let result = client.logout().await;

    assert_eq!(result, Err(ErrorKind::ServiceError));
    assert_eq!(store.get(), Some(Credential::new("A1", "R1")));
}

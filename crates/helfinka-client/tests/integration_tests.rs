//! Integration tests for helfinka-client.
//!
//! Each test runs the client against a wiremock server standing in for the
//! Helfinka API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use helfinka_client::{
    ClientConfig, ClientError, Credential, CredentialSource, HttpClient, StaticToken,
    UnauthorizedHandler,
};
use helfinka_types::{
    stored_item, BpData, DateRange, EntryData, EntryType, LoginRequest, NoteData, PasswordChange,
    ProfileUpdate, UserId, WeightData, WeightUnit,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TS: &str = "2024-01-02T03:04:05.000Z";

fn client_for(server: &MockServer) -> HttpClient {
    let config = ClientConfig::new(server.uri()).unwrap();
    HttpClient::new(config).unwrap()
}

fn january() -> DateRange {
    DateRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(),
    )
    .unwrap()
}

fn bp() -> EntryData {
    EntryData::Bp(BpData {
        systolic: 120,
        diastolic: 80,
        heart_rate: 60,
        context: None,
    })
}

#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
}

impl UnauthorizedHandler for CountingHandler {
    fn on_unauthorized(&self, _epoch: Option<u64>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct FixedCredential;

impl CredentialSource for FixedCredential {
    fn credential(&self) -> Option<Credential> {
        Some(Credential::new("live-token", 4))
    }
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ann@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc",
            "user": {"id": "u-1", "email": "ann@example.com", "displayName": "Ann", "plan": "free"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .auth()
        .login(LoginRequest::new(" ann@example.com ", "secret"))
        .await
        .unwrap();

    assert_eq!(response.token, "abc");
    assert_eq!(response.user.display_name, "Ann");
    assert_eq!(response.user.extra.get("plan"), Some(&json!("free")));
}

#[tokio::test]
async fn test_login_rejected_is_invalid_credentials_without_teardown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handler = Arc::new(CountingHandler::default());
    client.set_credential_source(Arc::new(FixedCredential));
    client.set_unauthorized_handler(handler.clone());

    let err = client
        .auth()
        .login(LoginRequest::new("ann@example.com", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidCredentials));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_validation_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .auth()
        .login(LoginRequest::new("", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_logout_swallows_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth().logout().await;
}

#[tokio::test]
async fn test_hello_and_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hi"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "1.4.2",
            "environment": "dev",
            "built": "2024-05-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let auth = client_for(&server).auth();
    assert_eq!(auth.hello().await.unwrap().message, "hi");
    assert_eq!(auth.version().await.unwrap().version, "1.4.2");
}

// =============================================================================
// Entries
// =============================================================================

#[tokio::test]
async fn test_list_sends_bearer_and_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entries"))
        .and(header("authorization", "Bearer abc"))
        .and(header_exists("x-request-id"))
        .and(query_param("from", "2024-01-01T00:00:00.000Z"))
        .and(query_param("to", "2024-01-31T23:59:59.000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [stored_item("USER#u-1", TS, &bp())]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.set_credential_source(Arc::new(StaticToken("abc".to_string())));

    let entries = client.entries().list(&january()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type(), EntryType::Bp);
    assert_eq!(entries[0].timestamp, TS);
    assert_eq!(entries[0].data, bp());
}

#[tokio::test]
async fn test_list_drops_corrupt_items_in_order() {
    let weight = EntryData::Weight(WeightData {
        value: 72.5,
        unit: WeightUnit::Kg,
    });
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                stored_item("USER#u-1", "2024-01-01T08:00:00.000Z", &bp()),
                {"PK": "USER#u-1", "SK": "HELF#2024-01-01T09:00:00.000Z#BP", "Type": "BP",
                 "Data": {"systolic": 500, "diastolic": 80, "heartRate": 60}},
                {"PK": "USER#u-1", "SK": "OTHER#2024-01-01T10:00:00.000Z#BP", "Type": "BP",
                 "Data": {"systolic": 120, "diastolic": 80, "heartRate": 60}},
                "not an object",
                stored_item("USER#u-1", "2024-01-01T11:00:00.000Z", &weight),
            ]
        })))
        .mount(&server)
        .await;

    let entries = client_for(&server).entries().list(&january()).await.unwrap();
    let timestamps: Vec<&str> = entries.iter().map(|e| e.timestamp.as_str()).collect();
    assert_eq!(
        timestamps,
        ["2024-01-01T08:00:00.000Z", "2024-01-01T11:00:00.000Z"]
    );
}

#[tokio::test]
async fn test_list_missing_items_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let entries = client_for(&server).entries().list(&january()).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_list_by_type_uses_stats_path_and_prefix() {
    let server = MockServer::start().await;
    let note = EntryData::Note(NoteData {
        text: "slept badly".to_string(),
        tags: vec!["INSOMNIA".to_string()],
    });
    Mock::given(method("GET"))
        .and(path("/helfinka/stats/NOTE"))
        .and(query_param("from", "2024-01-01T00:00:00.000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [stored_item("USER#u-1", TS, &note)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .entries_prefix("/helfinka")
        .build()
        .unwrap();
    let client = HttpClient::new(config).unwrap();

    let entries = client
        .entries()
        .list_by_type(EntryType::Note, &january())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data, note);
}

#[tokio::test]
async fn test_create_posts_validated_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/entries"))
        .and(body_json(json!({
            "timestamp": TS,
            "type": "BP",
            "data": {"systolic": 120, "diastolic": 80, "heartRate": 60, "context": "after walk"}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let data = EntryData::Bp(BpData {
        systolic: 120,
        diastolic: 80,
        heart_rate: 60,
        context: Some("  after walk ".to_string()),
    });
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

    client_for(&server)
        .entries()
        .create(data, timestamp)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_invalid_payload_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let data = EntryData::Bp(BpData {
        systolic: 10,
        diastolic: 80,
        heart_rate: 60,
        context: None,
    });

    let err = client_for(&server)
        .entries()
        .create(data, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_delete_sends_timestamp_and_type() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/entries"))
        .and(query_param("timestamp", TS))
        .and(query_param("type", "WEIGHT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .entries()
        .delete(TS, EntryType::Weight)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unauthorized_invokes_handler_with_epoch() {
    struct EpochRecorder(parking_lot::Mutex<Vec<Option<u64>>>);

    impl UnauthorizedHandler for EpochRecorder {
        fn on_unauthorized(&self, epoch: Option<u64>) {
            self.0.lock().push(epoch);
        }
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let recorder = Arc::new(EpochRecorder(parking_lot::Mutex::new(Vec::new())));
    client.set_credential_source(Arc::new(FixedCredential));
    client.set_unauthorized_handler(recorder.clone());

    let err = client.entries().list(&january()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(*recorder.0.lock(), vec![Some(4)]);
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entries"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let handler = Arc::new(CountingHandler::default());
    client.set_unauthorized_handler(handler.clone());

    let err = client.entries().list(&january()).await.unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected Status, got: {:?}", other),
    }
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:1").unwrap();
    let client = HttpClient::new(config).unwrap();

    let err = client.auth().hello().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_update_profile_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/users/u-1"))
        .and(body_json(json!({"displayName": "Annie"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "u-1", "email": "ann@example.com", "displayName": "Annie"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProfileUpdate {
        email: None,
        display_name: Some("Annie".to_string()),
    };
    let user = client_for(&server)
        .users()
        .update_profile(&UserId::from("u-1"), update)
        .await
        .unwrap();
    assert_eq!(user.display_name, "Annie");
}

#[tokio::test]
async fn test_update_profile_requires_a_field() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .users()
        .update_profile(&UserId::from("u-1"), ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_update_password_escapes_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/users/a%2Fb"))
        .and(body_json(json!({"oldPassword": "old-secret", "password": "new-secret"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .users()
        .update_password(
            &UserId::from("a/b"),
            PasswordChange::new("old-secret", "new-secret"),
        )
        .await
        .unwrap();
}

//! End-to-end tests of the credentials HTTP surface.
//!
//! Our server runs on an ephemeral port and registers against a mock
//! counterpart; requests go through reqwest like a real OCPI peer would.
//! Routing-only checks use `tower::ServiceExt::oneshot` without a socket.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{Behaviour, MockCounterpart};
use ocpi::{
    config::Config,
    server::{create_router, AppState, ServerConfig},
    storage::CounterpartCredentials,
    versions::Endpoint,
    Adapter, AdapterError, EndpointSet, HttpCounterpartClient, MemoryStorage, ObjectKind,
    RegistrationHandshake, SchemaAdapter, StorageGateway, TcpTransport, VersionNumber,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

fn state(base_url: &str, registration_tokens: Vec<String>) -> Arc<AppState> {
    let mut config = Config::default();
    config.server.base_url = base_url.to_string();

    let handshake = RegistrationHandshake::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(HttpCounterpartClient::new(Duration::from_secs(5)).unwrap()),
        Arc::new(SchemaAdapter::new()),
        config.identity(),
    );
    let server = ServerConfig::default()
        .with_base_url(base_url)
        .with_registration_tokens(registration_tokens)
        .without_logging();

    Arc::new(AppState::new(server, handshake))
}

/// Start our server; returns its `/ocpi` base URL.
async fn spawn_server(registration_tokens: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/ocpi", listener.local_addr().unwrap());
    let app = create_router(state(&base, registration_tokens));

    tokio::spawn(async move {
        let _ = TcpTransport::serve_listener(listener, app).await;
    });
    base
}

async fn send(
    method: reqwest::Method,
    url: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let client = reqwest::Client::new();
    let mut request = client.request(method, url);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let body: Value = response.json().await.unwrap();
    (status, body)
}

fn credentials_body(counterpart: &MockCounterpart, token: &str) -> Value {
    json!({"token": token, "url": counterpart.versions_url()})
}

#[tokio::test]
async fn test_register_success_envelope() {
    let counterpart = MockCounterpart::spawn(Behaviour::default()).await;
    let base = spawn_server(Vec::new()).await;

    let (status, body) = send(
        reqwest::Method::POST,
        &format!("{base}/credentials"),
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 1000);
    let token = body["data"][0]["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(body["data"][0]["url"], format!("{base}/versions"));
    assert_eq!(body["data"][0]["roles"][0]["role"], "CPO");
    assert_eq!(counterpart.paths(), vec!["/versions", "/2.2.1"]);

    // The issued token now authenticates GET /credentials
    let (status, body) = send(
        reqwest::Method::GET,
        &format!("{base}/credentials"),
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 1000);
    assert_eq!(body["data"][0]["token"], token);
}

#[tokio::test]
async fn test_register_twice_is_405() {
    let counterpart = MockCounterpart::spawn(Behaviour::default()).await;
    let base = spawn_server(Vec::new()).await;
    let url = format!("{base}/credentials");

    let (status, _) = send(
        reqwest::Method::POST,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        reqwest::Method::POST,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["data"], json!([]));
    // Rejected before any further outbound call
    assert_eq!(counterpart.paths().len(), 2);
}

#[tokio::test]
async fn test_unsupported_version_is_3002() {
    let counterpart = MockCounterpart::spawn(Behaviour {
        catalog: vec!["2.1.1"],
        ..Default::default()
    })
    .await;
    let base = spawn_server(Vec::new()).await;
    let url = format!("{base}/credentials");

    let (status, body) = send(
        reqwest::Method::POST,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 3002);
    assert_eq!(body["data"], json!([]));
    assert_eq!(counterpart.paths(), vec!["/versions"]);

    // Nothing was persisted: re-registration finds no record
    let (status, _) = send(
        reqwest::Method::PUT,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_counterpart_500_is_3001() {
    let counterpart = MockCounterpart::spawn(Behaviour {
        versions_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Default::default()
    })
    .await;
    let base = spawn_server(Vec::new()).await;
    let url = format!("{base}/credentials");

    let (status, body) = send(
        reqwest::Method::POST,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 3001);
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(
        reqwest::Method::PUT,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_put_unregistered_is_405() {
    let counterpart = MockCounterpart::spawn(Behaviour::default()).await;
    let base = spawn_server(Vec::new()).await;

    let (status, body) = send(
        reqwest::Method::PUT,
        &format!("{base}/credentials"),
        Some("whatever"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status_code"], 2000);
    assert!(counterpart.paths().is_empty());
}

#[tokio::test]
async fn test_put_rotates_issued_token() {
    let counterpart = MockCounterpart::spawn(Behaviour::default()).await;
    let base = spawn_server(Vec::new()).await;
    let url = format!("{base}/credentials");

    let (_, body) = send(
        reqwest::Method::POST,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    let first = body["data"][0]["token"].as_str().unwrap().to_string();

    // Only the holder of the issued token may refresh
    let (status, _) = send(
        reqwest::Method::PUT,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        reqwest::Method::PUT,
        &url,
        Some(&first),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 1000);
    let second = body["data"][0]["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let (status, _) = send(reqwest::Method::GET, &url, Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(reqwest::Method::GET, &url, Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["token"], second.as_str());
}

#[tokio::test]
async fn test_registration_token_policy() {
    let counterpart = MockCounterpart::spawn(Behaviour::default()).await;
    let base = spawn_server(vec!["token-a".to_string()]).await;
    let url = format!("{base}/credentials");

    let (status, _) = send(
        reqwest::Method::POST,
        &url,
        Some("token-x"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(counterpart.paths().is_empty());

    let (status, _) = send(
        reqwest::Method::POST,
        &url,
        None,
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        reqwest::Method::POST,
        &url,
        Some("token-a"),
        Some(credentials_body(&counterpart, "tok-b")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 1000);
}

async fn oneshot(uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let app = create_router(state("https://cpo.example/ocpi", Vec::new()));
    oneshot_app(app, uri, token).await
}

async fn oneshot_app(app: axum::Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Token {token}"));
    }

    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_versions_listing() {
    let (status, body) = oneshot("/ocpi/versions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 1000);
    assert_eq!(body["data"][0]["version"], VersionNumber::V2_2_1.as_str());
    assert_eq!(
        body["data"][0]["url"],
        "https://cpo.example/ocpi/versions/2.2.1"
    );
}

#[tokio::test]
async fn test_version_details() {
    let (status, body) = oneshot("/ocpi/versions/2.2.1", None).await;
    assert_eq!(status, StatusCode::OK);
    let endpoints = body["data"][0]["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    assert!(endpoints
        .iter()
        .all(|e| e["url"] == "https://cpo.example/ocpi/credentials"));

    let (_, body) = oneshot("/ocpi/versions/2.0", None).await;
    assert_eq!(body["status_code"], 3002);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_get_credentials_requires_known_token() {
    let (status, body) = oneshot("/ocpi/credentials", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status_code"], 2000);

    let (status, _) = oneshot("/ocpi/credentials", Some("never-issued")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_outside_prefix() {
    let (status, body) = oneshot("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptime_secs"].is_u64());
}

/// Rejects every credentials object.
struct RejectCredentials;

impl Adapter for RejectCredentials {
    fn adapt(
        &self,
        kind: ObjectKind,
        data: &Value,
        version: VersionNumber,
    ) -> Result<Value, AdapterError> {
        match kind {
            ObjectKind::Credentials => Err(AdapterError::SchemaValidation {
                kind,
                version,
                reason: "unsupported shape".to_string(),
            }),
            _ => Ok(data.clone()),
        }
    }
}

#[tokio::test]
async fn test_get_credentials_unadaptable_record_is_3001() {
    let storage = MemoryStorage::new();
    let endpoints = EndpointSet::new(
        VersionNumber::V2_2_1,
        vec![Endpoint {
            identifier: "credentials".to_string(),
            role: None,
            url: "https://emsp.example/ocpi/2.2.1/credentials".to_string(),
        }],
    )
    .unwrap();
    storage
        .create(CounterpartCredentials::new("tok-b", endpoints))
        .await
        .unwrap();
    storage
        .issue_token("tok-b", None, "issued-c".to_string())
        .await
        .unwrap();

    let config = Config::default();
    let handshake = RegistrationHandshake::new(
        Arc::new(storage),
        Arc::new(HttpCounterpartClient::new(Duration::from_secs(5)).unwrap()),
        Arc::new(RejectCredentials),
        config.identity(),
    );
    let server = ServerConfig::default()
        .with_base_url("https://cpo.example/ocpi")
        .without_logging();
    let app = create_router(Arc::new(AppState::new(server, handshake)));

    let (status, body) = oneshot_app(app, "/ocpi/credentials", Some("issued-c")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 3001);
    assert_eq!(body["data"], json!([]));
}

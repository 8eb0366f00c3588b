//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::auth::bearer_token;
use super::envelope::OcpiResponse;
use super::state::AppState;
use crate::credentials::{redact, Credentials};
use crate::handshake::{HandshakeError, HandshakeOutcome};
use crate::status::OcpiStatus;
use crate::versions::{Endpoint, InterfaceRole, VersionEntry, VersionNumber};

/// Create the API router, mounted under the path of the configured base URL
pub fn create_router(state: Arc<AppState>) -> Router {
    let prefix = state.config.path_prefix().unwrap_or_default();
    let max_body_size = state.config.max_body_size;
    let logging = state.config.logging;
    let cors = state.config.cors_enabled;

    let ocpi = Router::new()
        // Version discovery
        .route("/versions", get(get_versions))
        .route("/versions/:version", get(get_version_details))
        // Credentials & registration
        .route(
            "/credentials",
            get(get_credentials)
                .post(post_credentials)
                .put(put_credentials),
        );

    let mounted = if prefix.is_empty() {
        ocpi
    } else {
        Router::new().nest(&prefix, ocpi)
    };

    let mut router = mounted
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state);

    if logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Seconds since the server started
    pub uptime_secs: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime().as_secs(),
    })
}

/// `GET /versions`: the version we speak and where its details live
async fn get_versions(State(state): State<Arc<AppState>>) -> Response {
    let version = state.config.version;
    let entry = VersionEntry::new(
        version,
        format!("{}/versions/{version}", state.config.base()),
    );
    OcpiResponse::success(vec![json!(entry)]).into_response()
}

/// `GET /versions/:version`: our endpoints for that version
async fn get_version_details(
    State(state): State<Arc<AppState>>,
    Path(version): Path<String>,
) -> Response {
    let supported = state.config.version;
    if version.parse::<VersionNumber>().ok() != Some(supported) {
        return OcpiResponse::failure(
            OcpiStatus::UnsupportedVersion,
            format!("Version {version} is not supported"),
        )
        .into_response();
    }

    let credentials_url = format!("{}/credentials", state.config.base());
    // Interface roles only exist from 2.2 on
    let roles: &[Option<InterfaceRole>] = if supported.has_roles() {
        &[Some(InterfaceRole::Sender), Some(InterfaceRole::Receiver)]
    } else {
        &[None]
    };
    let endpoints: Vec<Endpoint> = roles
        .iter()
        .map(|role| Endpoint {
            identifier: "credentials".to_string(),
            role: *role,
            url: credentials_url.clone(),
        })
        .collect();

    OcpiResponse::success(vec![json!({
        "version": supported,
        "endpoints": endpoints,
    })])
    .into_response()
}

/// `GET /credentials`: our credentials for the caller's relationship
async fn get_credentials(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized("Missing or malformed Authorization header");
    };

    let record = match state.handshake.resolve_issued(token).await {
        Ok(Some(record)) => record,
        Ok(None) => return unauthorized("Unknown token"),
        Err(e) => return handshake_failure(&e),
    };

    match state.handshake.credentials_for(&record) {
        Ok(credentials) => OcpiResponse::success(vec![credentials]).into_response(),
        Err(e) => {
            tracing::warn!(
                counterpart = %redact(&record.counterpart_token),
                "Stored credentials unusable: {e}"
            );
            OcpiResponse::failure(
                OcpiStatus::UnableToUseClientsApi,
                OcpiStatus::UnableToUseClientsApi.message(),
            )
            .into_response()
        },
    }
}

/// `POST /credentials`: first-time registration
async fn post_credentials(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized("Missing or malformed Authorization header");
    };
    if !state.config.accepts_registration(token) {
        return unauthorized("Token is not a registration token");
    }

    let result = state
        .handshake
        .register(&credentials.token, &credentials.url, state.config.version)
        .await;
    handshake_response(result)
}

/// `PUT /credentials`: credential refresh for a registered counterpart
async fn put_credentials(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized("Missing or malformed Authorization header");
    };

    // Only the holder of the currently issued token may refresh
    match state.handshake.fetch_credentials(&credentials.token).await {
        Ok(Some(record)) if record.self_token.as_deref() != Some(token) => {
            return unauthorized("Token does not belong to this registration");
        },
        Ok(_) => {},
        Err(e) => return handshake_failure(&e),
    }

    let result = state
        .handshake
        .reregister(&credentials.token, &credentials.url, state.config.version)
        .await;
    handshake_response(result)
}

fn handshake_response(result: Result<HandshakeOutcome, HandshakeError>) -> Response {
    match result {
        Ok(outcome) => OcpiResponse::success(vec![outcome.credentials]).into_response(),
        Err(e) => handshake_failure(&e),
    }
}

fn handshake_failure(err: &HandshakeError) -> Response {
    OcpiResponse::failure(err.ocpi_status(), err.to_string()).with_http(err.http_status())
}

fn unauthorized(message: &str) -> Response {
    OcpiResponse::failure(OcpiStatus::GenericClientError, message)
        .with_http(StatusCode::UNAUTHORIZED)
}

//! OCPI response envelope.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::status::OcpiStatus;

/// `{data, status_code, status_message, timestamp}` wrapper used by every
/// OCPI endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OcpiResponse {
    /// Payload objects
    pub data: Vec<Value>,
    /// OCPI status code
    pub status_code: OcpiStatus,
    /// Human-readable status
    pub status_message: String,
    /// Response generation time
    pub timestamp: DateTime<Utc>,
}

impl OcpiResponse {
    /// Build an envelope with an explicit status and message
    pub fn new(status: OcpiStatus, message: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            data,
            status_code: status,
            status_message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// 1000 with the given data
    pub fn success(data: Vec<Value>) -> Self {
        let status = OcpiStatus::GenericSuccess;
        Self::new(status, status.message(), data)
    }

    /// Empty-data envelope carrying `status`
    pub fn failure(status: OcpiStatus, message: impl Into<String>) -> Self {
        Self::new(status, message, Vec::new())
    }

    /// Pair with an HTTP status
    pub fn with_http(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for OcpiResponse {
    fn into_response(self) -> Response {
        self.with_http(StatusCode::OK)
    }
}

//! Mock OCPI counterpart served over real TCP.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A recorded inbound call: path and Authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub path: String,
    pub authorization: Option<String>,
}

/// How the mock counterpart behaves.
#[derive(Debug, Clone)]
pub struct Behaviour {
    /// HTTP status of the versions listing
    pub versions_status: StatusCode,
    /// Versions advertised, each served at `/<version>`
    pub catalog: Vec<&'static str>,
    /// Delay before answering any request
    pub delay: Duration,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            versions_status: StatusCode::OK,
            catalog: vec!["2.2.1"],
            delay: Duration::ZERO,
        }
    }
}

/// Running mock counterpart.
pub struct MockCounterpart {
    pub base: String,
    hits: Arc<Mutex<Vec<Hit>>>,
    handle: JoinHandle<()>,
}

impl MockCounterpart {
    pub async fn spawn(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(Mutex::new(Vec::new()));

        let versions: Vec<Value> = behaviour
            .catalog
            .iter()
            .map(|v| json!({"version": v, "url": format!("{base}/{v}")}))
            .collect();
        let details = json!({
            "version": "2.2.1",
            "endpoints": [
                {"identifier": "credentials", "role": "RECEIVER", "url": format!("{base}/2.2.1/credentials")},
                {"identifier": "locations", "role": "SENDER", "url": format!("{base}/2.2.1/locations")}
            ]
        });

        let versions_route = {
            let hits = hits.clone();
            let behaviour = behaviour.clone();
            move |headers: HeaderMap| {
                let hits = hits.clone();
                let versions = versions.clone();
                let behaviour = behaviour.clone();
                async move {
                    record(&hits, "/versions", &headers);
                    tokio::time::sleep(behaviour.delay).await;
                    (
                        behaviour.versions_status,
                        Json(json!({"data": versions, "status_code": 1000})),
                    )
                }
            }
        };

        let details_route = {
            let hits = hits.clone();
            move |Path(version): Path<String>, headers: HeaderMap| {
                let hits = hits.clone();
                let details = details.clone();
                async move {
                    record(&hits, &format!("/{version}"), &headers);
                    if version == "2.2.1" {
                        (StatusCode::OK, Json(json!({"data": [details], "status_code": 1000})))
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"data": [], "status_code": 2000})))
                    }
                }
            }
        };

        let router = Router::new()
            .route("/versions", get(versions_route))
            .route("/:version", get(details_route));

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Self { base, hits, handle }
    }

    pub fn versions_url(&self) -> String {
        format!("{}/versions", self.base)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.hits().into_iter().map(|h| h.path).collect()
    }
}

impl Drop for MockCounterpart {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record(hits: &Arc<Mutex<Vec<Hit>>>, path: &str, headers: &HeaderMap) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    hits.lock().unwrap().push(Hit {
        path: path.to_string(),
        authorization,
    });
}

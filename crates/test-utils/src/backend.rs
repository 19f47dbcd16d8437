//! In-process HTTP backend serving canned responses.
//!
//! Routes are matched on the request path plus its query string with the
//! `nocache` parameter removed, so a raster route registered as
//! `/compare/2023-01-05/CHE/lj` answers `/compare/2023-01-05/CHE/lj?nocache=true`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fixtures::{admin_area_collection, dates, italy_feature, liechtenstein_feature, switzerland_feature};

/// A fixed response for one route.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

impl CannedResponse {
    pub fn json(value: Value) -> Self {
        Self {
            status: 200,
            body: value.to_string().into_bytes(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
        }
    }

    pub fn tiff(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            headers: vec![("content-type".to_string(), "image/tiff".to_string())],
        }
    }

    /// Raster payload with percentile headers.
    pub fn tiff_with_stats(body: Vec<u8>, p02: &str, p98: &str) -> Self {
        Self::tiff(body)
            .header("x-raster-p02", p02)
            .header("x-raster-p98", p98)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Route table for a test backend.
#[derive(Debug, Clone, Default)]
pub struct FixtureBackend {
    routes: HashMap<String, CannedResponse>,
}

impl FixtureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dates, admin areas and per-region dates for the fixture regions, at the
    /// default endpoint paths.
    pub fn with_defaults() -> Self {
        Self::new()
            .route("/explore/dates", CannedResponse::json(serde_json::json!(dates::GLOBAL)))
            .route("/explore/dates/CHE", CannedResponse::json(serde_json::json!(dates::SWITZERLAND)))
            .route("/explore/dates/LIE", CannedResponse::json(serde_json::json!(dates::LIECHTENSTEIN)))
            .route("/explore/admin-areas?resolution=50m", CannedResponse::json(admin_area_collection()))
            .route("/explore/admin-areas/CHE?resolution=50m", CannedResponse::json(switzerland_feature()))
            .route("/explore/admin-areas/LIE?resolution=50m", CannedResponse::json(liechtenstein_feature()))
            .route("/explore/admin-areas/ITA?resolution=50m", CannedResponse::json(italy_feature()))
    }

    pub fn route(mut self, path: &str, response: CannedResponse) -> Self {
        self.routes.insert(path.to_string(), response);
        self
    }

    /// Bind to an ephemeral localhost port and serve in the background.
    pub async fn spawn(self) -> std::io::Result<RunningBackend> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = Arc::new(BackendState {
            routes: self.routes,
            requests: requests.clone(),
        });
        let app = Router::new().fallback(serve_canned).with_state(state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(RunningBackend {
            base_url,
            requests,
            handle,
        })
    }
}

struct BackendState {
    routes: HashMap<String, CannedResponse>,
    requests: Arc<Mutex<Vec<String>>>,
}

/// Handle to a running backend; the server stops when dropped.
pub struct RunningBackend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl RunningBackend {
    /// Every request URI received, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of requests whose path equals `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|uri| uri.split('?').next() == Some(path))
            .count()
    }
}

impl Drop for RunningBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn route_key(uri: &Uri) -> String {
    let query: Vec<&str> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("nocache="))
        .collect();
    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query.join("&"))
    }
}

async fn serve_canned(State(state): State<Arc<BackendState>>, uri: Uri) -> Response {
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(uri.to_string());
    }

    let Some(canned) = state.routes.get(&route_key(&uri)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &canned.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, headers, canned.body.clone()).into_response()
}

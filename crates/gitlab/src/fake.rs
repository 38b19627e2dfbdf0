//! Scripted in-memory [`Transport`] for tests.
//!
//! Responses are keyed by method and percent-encoded URL path (as returned by
//! [`url::Url::path`]), optionally narrowed to one `page` query value. A
//! scripted response stays in place until replaced. Unscripted requests get a
//! GitLab-style 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::transport::{ApiRequest, HttpMethod, RawResponse, Transport, TransportError};

type Script = Result<RawResponse, TransportError>;
type Route = (HttpMethod, String, Option<String>);

#[derive(Default)]
struct FakeState {
    routes: HashMap<Route, Script>,
    requests: Vec<ApiRequest>,
}

/// Fake transport; clones share the same script and request log.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method path` with `response` from now on.
    pub fn respond(&self, method: HttpMethod, path: &str, response: RawResponse) {
        self.lock()
            .routes
            .insert((method, path.to_string(), None), Ok(response));
    }

    /// Answers `method path` with JSON `body` only for `?page=<page>`. Takes
    /// precedence over an unpaged script for the same route.
    pub fn respond_page(&self, method: HttpMethod, path: &str, page: u32, body: Value) {
        self.lock().routes.insert(
            (method, path.to_string(), Some(page.to_string())),
            Ok(RawResponse::json(200, body)),
        );
    }

    /// Answers `method path` with status `status` and JSON `body`.
    pub fn respond_json(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.respond(method, path, RawResponse::json(status, body));
    }

    /// Makes `method path` fail at the transport level.
    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.lock()
            .routes
            .insert((method, path.to_string(), None), Err(error));
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Requests sent to `method path`.
    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<ApiRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.url.path() == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        let path = request.url.path().to_string();
        let page = request
            .query
            .iter()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.clone());
        let script = page
            .and_then(|page| state.routes.get(&(request.method, path.clone(), Some(page))))
            .or_else(|| state.routes.get(&(request.method, path, None)));
        match script {
            Some(script) => script.clone(),
            None => Ok(RawResponse::json(404, json!({ "message": "404 Not Found" }))),
        }
    }
}

#![allow(dead_code)]

//! Shared test doubles for the integration suites.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode, header};
use bytes::Bytes;
use tavola::infra::net::{Fetch, FetchError, FetchedResponse};

/// Programmable in-process stand-in for the site origin.
///
/// Routes are keyed by the exact URL the worker requests. Unrouted URLs
/// answer 404; flipping `set_offline` makes every call fail the way a dead
/// network does. Calls are counted and logged for assertions.
#[derive(Default)]
pub struct MockOrigin {
    routes: Mutex<HashMap<String, FetchedResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Bytes>>,
}

impl MockOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a same-origin 200 response with the given content type.
    pub fn route(&self, url: &str, content_type: &'static str, body: &str) {
        self.route_with(url, ok_response(content_type, body));
    }

    /// Register an arbitrary response.
    pub fn route_with(&self, url: &str, response: FetchedResponse) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(url.to_string(), response);
    }

    pub fn remove_route(&self, url: &str) {
        self.routes.lock().expect("routes lock").remove(url);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total number of fetches that reached this origin.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Request log, one `METHOD url` entry per call.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Request bodies in arrival order.
    pub fn bodies(&self) -> Vec<Bytes> {
        self.bodies.lock().expect("bodies lock").clone()
    }

    fn dispatch(&self, method: &Method, url: &str, body: Bytes) -> Result<FetchedResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(format!("{method} {url}"));
        self.bodies.lock().expect("bodies lock").push(body);

        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network("connection refused".to_string()));
        }

        let routes = self.routes.lock().expect("routes lock");
        Ok(routes.get(url).cloned().unwrap_or_else(|| FetchedResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            same_origin: true,
        }))
    }
}

#[async_trait]
impl Fetch for MockOrigin {
    async fn get(&self, url: &str, _headers: &HeaderMap) -> Result<FetchedResponse, FetchError> {
        self.dispatch(&Method::GET, url, Bytes::new())
    }

    async fn forward(
        &self,
        method: Method,
        url: &str,
        _headers: &HeaderMap,
        body: Bytes,
    ) -> Result<FetchedResponse, FetchError> {
        self.dispatch(&method, url, body)
    }
}

/// A same-origin 200 response.
pub fn ok_response(content_type: &'static str, body: &str) -> FetchedResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type.parse().expect("header value"));
    FetchedResponse {
        status: StatusCode::OK,
        headers,
        body: Bytes::from(body.to_string()),
        same_origin: true,
    }
}

/// Register the whole default site shell on the mock origin.
pub fn seed_site_shell(origin: &MockOrigin) {
    origin.route("/", "text/html", "<html>tavola root</html>");
    origin.route("/index.html", "text/html", "<html>tavola shell</html>");
    origin.route("/assets/css/critical.css", "text/css", "body{margin:0}");
    origin.route("/assets/css/main.css", "text/css", "main{display:grid}");
    origin.route("/assets/css/extras.css", "text/css", ".extra{opacity:.8}");
    origin.route("/assets/js/main.js", "text/javascript", "init();");
}

//! Request interception.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode, Uri, header},
    response::Response,
};
use bytes::Bytes;
use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::infra::net::{
    Fetch, FetchError, FetchedResponse, MAX_BUFFERED_BODY_BYTES,
};
use crate::infra::telemetry::{METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_WRITE};

use super::{
    lifecycle::{OfflineWorker, WorkerPhase},
    store::StoredResponse,
};

/// What kind of resource a request is after.
///
/// Browsers state this in the fetch metadata headers on every request; the
/// `Accept` header is the heuristic for clients that omit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RequestProfile {
    Navigation,
    Image,
    Other,
}

impl RequestProfile {
    pub(super) fn of(request: &Request<Body>) -> Self {
        if let Some(mode) = header_str(request, "sec-fetch-mode") {
            if mode.eq_ignore_ascii_case("navigate") {
                return Self::Navigation;
            }
        }
        if let Some(dest) = header_str(request, "sec-fetch-dest") {
            if dest.eq_ignore_ascii_case("image") {
                return Self::Image;
            }
            if dest.eq_ignore_ascii_case("document") {
                return Self::Navigation;
            }
        }
        match header_str(request, "accept") {
            Some(accept) if accept.contains("text/html") => Self::Navigation,
            Some(accept) if accept.starts_with("image/") => Self::Image,
            _ => Self::Other,
        }
    }
}

fn header_str<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|value| value.to_str().ok())
}

/// Cache keys are origin-relative: path plus query. Absolute cross-origin
/// URIs keep their full form and therefore never collide with stored keys.
fn request_key(uri: &Uri) -> String {
    if uri.scheme().is_some() {
        return uri.to_string();
    }
    match uri.path_and_query() {
        Some(path_and_query) => path_and_query.as_str().to_string(),
        None => uri.path().to_string(),
    }
}

fn is_http_scheme(uri: &Uri) -> bool {
    matches!(uri.scheme_str(), None | Some("http") | Some("https"))
}

impl OfflineWorker {
    /// Answer one intercepted request.
    ///
    /// Never fails: every failure mode resolves to a response, through the
    /// offline fallback ladder when necessary.
    #[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        if !self.intercepts(&request) {
            return self.pass_through(request).await;
        }

        let profile = RequestProfile::of(&request);
        let key = request_key(request.uri());

        if let Some(hit) = self.store.lookup(&self.names.lookup_order(), &key) {
            counter!(METRIC_CACHE_HIT).increment(1);
            debug!(target: "tavola::worker", key = %key, outcome = "hit", "serving cached response");
            return hit.into_response();
        }
        counter!(METRIC_CACHE_MISS).increment(1);

        match self.origin.get(&key, request.headers()).await {
            Ok(fetched) => {
                if fetched.is_cacheable() {
                    self.write_through(&key, &fetched);
                }
                fetched.into_response()
            }
            Err(error) => {
                warn!(
                    target: "tavola::worker",
                    key = %key,
                    error = %error,
                    "origin fetch failed; applying offline fallback"
                );
                self.offline_fallback(profile)
            }
        }
    }

    /// Whether the interception contract applies to this request.
    ///
    /// Non-GET methods and non-http(s) schemes never touch the cache, and an
    /// instance that has not finished activating does not intercept at all.
    fn intercepts(&self, request: &Request<Body>) -> bool {
        self.phase() == WorkerPhase::Active
            && request.method() == Method::GET
            && is_http_scheme(request.uri())
    }

    /// Copy a cacheable response into the namespace the rules pick, if any.
    ///
    /// Caching is a side effect of answering the request and never blocks or
    /// fails it.
    fn write_through(&self, key: &str, fetched: &FetchedResponse) {
        let path = key.split('?').next().unwrap_or(key);
        if let Some(kind) = self.classifier.classify(path) {
            let namespace = self.names.for_kind(kind);
            self.store
                .put(namespace, key.to_string(), StoredResponse::from(fetched));
            counter!(METRIC_CACHE_WRITE).increment(1);
            debug!(
                target: "tavola::worker",
                key = %key,
                namespace = %namespace,
                "cached response copy"
            );
        }
    }

    /// Forward a bypassed request to the origin without cache involvement.
    async fn pass_through(&self, request: Request<Body>) -> Response<Body> {
        let (parts, body) = request.into_parts();
        let bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(target: "tavola::worker", error = %error, "failed to read request body");
                return status_response(StatusCode::BAD_REQUEST, "Unreadable request body");
            }
        };

        let target = request_key(&parts.uri);
        match self
            .origin
            .forward(parts.method.clone(), &target, &parts.headers, bytes)
            .await
        {
            Ok(fetched) => fetched.into_response(),
            Err(error) => {
                warn!(
                    target: "tavola::worker",
                    method = %parts.method,
                    target_url = %target,
                    error = %error,
                    "pass-through failed"
                );
                status_response(StatusCode::BAD_GATEWAY, "Upstream origin unreachable")
            }
        }
    }
}

fn status_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Routes library-level fetches through the worker, the way page traffic is
/// intercepted at the network layer. The menu loader uses this in the serve
/// path so its feed request participates in dynamic caching like any other
/// asset request.
pub struct InterceptedFetch {
    worker: Arc<OfflineWorker>,
}

impl InterceptedFetch {
    pub fn new(worker: Arc<OfflineWorker>) -> Self {
        Self { worker }
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        headers: &axum::http::HeaderMap,
        body: Bytes,
    ) -> Result<FetchedResponse, FetchError> {
        let mut builder = Request::builder().method(method).uri(url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(Body::from(body))
            .map_err(|err| FetchError::InvalidUrl(err.to_string()))?;

        let response = self.worker.handle(request).await;
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BUFFERED_BODY_BYTES)
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        Ok(FetchedResponse {
            status: parts.status,
            headers: parts.headers,
            body: bytes,
            same_origin: true,
        })
    }
}

#[async_trait]
impl Fetch for InterceptedFetch {
    async fn get(
        &self,
        url: &str,
        headers: &axum::http::HeaderMap,
    ) -> Result<FetchedResponse, FetchError> {
        self.dispatch(Method::GET, url, headers, Bytes::new()).await
    }

    async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: &axum::http::HeaderMap,
        body: Bytes,
    ) -> Result<FetchedResponse, FetchError> {
        self.dispatch(method, url, headers, body).await
    }
}

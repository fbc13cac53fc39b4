//! The offline fallback ladder.
//!
//! When both cache and network fail, the worker still answers: navigations
//! get the cached offline document, images get a synthesized placeholder
//! graphic, everything else gets a deterministic 503 so callers can detect
//! offline-without-cache. A raw network error never escapes to the client.

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use metrics::counter;
use tracing::debug;

use crate::infra::telemetry::METRIC_OFFLINE_FALLBACK;

use super::{handler::RequestProfile, lifecycle::OfflineWorker};

/// Inline placeholder rendered for images that are neither cached nor
/// reachable.
pub(super) const PLACEHOLDER_SVG: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="200" viewBox="0 0 300 200" role="img" aria-label="Image unavailable offline">"#,
    r##"<rect width="100%" height="100%" fill="#f0f0f0"/>"##,
    r##"<text x="50%" y="50%" text-anchor="middle" dy=".3em" fill="#666" font-family="sans-serif" font-size="14">Image unavailable offline</text>"##,
    "</svg>"
);

pub(super) const UNAVAILABLE_BODY: &str = "Content unavailable offline";

impl OfflineWorker {
    /// Synthesize a response for a request the origin could not answer.
    pub(super) fn offline_fallback(&self, profile: RequestProfile) -> Response<Body> {
        counter!(METRIC_OFFLINE_FALLBACK).increment(1);
        match profile {
            RequestProfile::Navigation => {
                match self
                    .store
                    .lookup(&self.names.lookup_order(), &self.offline_document)
                {
                    Some(document) => {
                        debug!(
                            target: "tavola::worker",
                            document = %self.offline_document,
                            "serving cached offline document"
                        );
                        document.into_response()
                    }
                    None => unavailable_response(),
                }
            }
            RequestProfile::Image => placeholder_image_response(),
            RequestProfile::Other => unavailable_response(),
        }
    }
}

pub(super) fn placeholder_image_response() -> Response<Body> {
    let mut response = Response::new(Body::from(PLACEHOLDER_SVG));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("image/svg+xml"),
    );
    response
}

pub(super) fn unavailable_response() -> Response<Body> {
    let mut response = Response::new(Body::from(UNAVAILABLE_BODY));
    *response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

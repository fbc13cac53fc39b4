//! Outbound HTTP: the fetch seam between the worker and the network.
//!
//! Everything that leaves the process goes through the [`Fetch`] trait, so
//! tests can substitute an in-process double and count calls. The production
//! implementation, [`HttpOrigin`], resolves origin-relative URLs against the
//! configured site origin and never follows redirects: a redirect must reach
//! the cache layer as a 3xx, not as someone else's body.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use metrics::histogram;
use thiserror::Error;
use url::Url;

use super::{error::InfraError, telemetry::METRIC_ORIGIN_FETCH_MS};

/// Upper bound when buffering a body for forwarding or inspection.
pub(crate) const MAX_BUFFERED_BODY_BYTES: usize = 32 * 1024 * 1024;

/// A fully-buffered HTTP response from the network.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// False for cross-origin URLs. Such responses are opaque to the cache.
    pub same_origin: bool,
}

impl FetchedResponse {
    /// Whether a copy of this response may be written to a cache namespace.
    ///
    /// The status check excludes redirects and error responses in one go;
    /// cross-origin (opaque) responses are excluded explicitly.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.same_origin
    }

    /// Rebuild an HTTP response for the caller.
    pub fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        // The body is already decoded and buffered.
        headers.remove(header::TRANSFER_ENCODING);
        headers.remove(header::CONNECTION);

        response
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network fetch failed: {0}")]
    Network(String),
    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

/// Boundary through which all outbound HTTP flows.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issue a GET for the given origin-relative or absolute URL.
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<FetchedResponse, FetchError>;

    /// Forward a request verbatim, any method, without cache involvement.
    async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<FetchedResponse, FetchError>;
}

/// Production [`Fetch`] implementation over the configured site origin.
pub struct HttpOrigin {
    client: reqwest::Client,
    base: Url,
}

impl HttpOrigin {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, InfraError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::http(err.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, url: &str) -> Result<(Url, bool), FetchError> {
        let resolved = self
            .base
            .join(url)
            .map_err(|err| FetchError::InvalidUrl(format!("`{url}`: {err}")))?;
        match resolved.scheme() {
            "http" | "https" => {}
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }
        let same_origin = resolved.origin() == self.base.origin();
        Ok((resolved, same_origin))
    }
}

#[async_trait]
impl Fetch for HttpOrigin {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<FetchedResponse, FetchError> {
        self.forward(Method::GET, url, headers, Bytes::new()).await
    }

    async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<FetchedResponse, FetchError> {
        let (resolved, same_origin) = self.resolve(url)?;
        let started = Instant::now();

        let response = self
            .client
            .request(method, resolved)
            .headers(forwardable_headers(headers))
            .body(body)
            .send()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        histogram!(METRIC_ORIGIN_FETCH_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        Ok(FetchedResponse {
            status,
            headers: response_headers,
            body: bytes,
            same_origin,
        })
    }
}

/// Drop connection-scoped headers the client computes itself.
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = headers.clone();
    out.remove(header::HOST);
    out.remove(header::CONTENT_LENGTH);
    out.remove(header::CONNECTION);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> HttpOrigin {
        let base = Url::parse("http://origin.test:9000").expect("valid base url");
        HttpOrigin::new(base, Duration::from_secs(5)).expect("client builds")
    }

    #[test]
    fn resolve_joins_relative_paths_against_the_base() {
        let (resolved, same_origin) = origin().resolve("/assets/css/main.css").expect("resolves");
        assert_eq!(
            resolved.as_str(),
            "http://origin.test:9000/assets/css/main.css"
        );
        assert!(same_origin);
    }

    #[test]
    fn resolve_marks_cross_origin_urls() {
        let (_, same_origin) = origin().resolve("https://cdn.example/font.woff2").expect("resolves");
        assert!(!same_origin);
    }

    #[test]
    fn resolve_rejects_non_http_schemes() {
        let err = origin().resolve("ftp://origin.test/file").expect_err("rejected");
        assert!(matches!(err, FetchError::UnsupportedScheme(scheme) if scheme == "ftp"));
    }

    #[test]
    fn cacheable_requires_ok_and_same_origin() {
        let ok = FetchedResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"body"),
            same_origin: true,
        };
        assert!(ok.is_cacheable());

        let redirect = FetchedResponse {
            status: StatusCode::MOVED_PERMANENTLY,
            ..ok.clone()
        };
        assert!(!redirect.is_cacheable());

        let opaque = FetchedResponse {
            same_origin: false,
            ..ok
        };
        assert!(!opaque.is_cacheable());
    }

    #[test]
    fn forwardable_headers_drop_connection_scoped_names() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "gateway.test".parse().expect("value"));
        headers.insert(header::CONTENT_LENGTH, "12".parse().expect("value"));
        headers.insert(header::ACCEPT, "text/html".parse().expect("value"));

        let out = forwardable_headers(&headers);
        assert!(!out.contains_key(header::HOST));
        assert!(!out.contains_key(header::CONTENT_LENGTH));
        assert_eq!(out.get(header::ACCEPT).map(|v| v.as_bytes()), Some(&b"text/html"[..]));
    }
}

//! Namespaced response storage.
//!
//! Two-level concurrent map: namespace name → request key → stored response.
//! Per-key atomicity comes from the underlying concurrent map, so the worker
//! layers no locking on top; concurrent interceptions racing on the same key
//! both write the same value and self-correct.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use dashmap::DashMap;

use crate::infra::net::FetchedResponse;

/// A cached response payload: status, headers, and buffered body.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl StoredResponse {
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        let mut stored_headers = Vec::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            stored_headers.push((name.clone(), value.clone()));
        }

        Self {
            status,
            headers: stored_headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Rebuild an HTTP response for the caller.
    pub fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.clear();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

impl From<&FetchedResponse> for StoredResponse {
    fn from(fetched: &FetchedResponse) -> Self {
        Self::new(fetched.status, &fetched.headers, fetched.body.clone())
    }
}

/// The namespaced cache store.
#[derive(Default)]
pub struct CacheStore {
    namespaces: DashMap<String, DashMap<String, StoredResponse>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the namespace if it does not exist yet.
    pub fn open(&self, name: &str) {
        self.namespaces.entry(name.to_string()).or_default();
    }

    /// Names of every namespace currently in storage.
    pub fn names(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Delete a namespace and all its entries. Returns whether it existed.
    pub fn delete(&self, name: &str) -> bool {
        self.namespaces.remove(name).is_some()
    }

    /// Store one entry, opening the namespace implicitly.
    pub fn put(&self, namespace: &str, key: String, response: StoredResponse) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key, response);
    }

    /// Commit a prepared batch of entries in one pass.
    pub fn put_all(&self, namespace: &str, entries: Vec<(String, StoredResponse)>) {
        let bucket = self.namespaces.entry(namespace.to_string()).or_default();
        for (key, response) in entries {
            bucket.insert(key, response);
        }
    }

    /// Look up a key within one namespace.
    pub fn get(&self, namespace: &str, key: &str) -> Option<StoredResponse> {
        self.namespaces
            .get(namespace)
            .and_then(|bucket| bucket.get(key).map(|entry| entry.value().clone()))
    }

    /// Look up a key across namespaces in the given order; first hit wins.
    pub fn lookup(&self, order: &[&str], key: &str) -> Option<StoredResponse> {
        order.iter().find_map(|namespace| self.get(namespace, key))
    }

    /// Number of entries in a namespace; zero if it does not exist.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .get(namespace)
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }
}

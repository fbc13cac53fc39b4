//! Offline cache worker.
//!
//! The worker keeps the storefront shell and previously-viewed assets
//! available without connectivity while keeping dynamic content reasonably
//! fresh, and never serves a broken experience when both cache and network
//! fail.
//!
//! ## Lifecycle
//!
//! - **install**: precache every [`StaticManifest`] entry into the static
//!   namespace as one atomic batch. Any unreachable entry fails the whole
//!   install. A successful install requests immediate activation (no
//!   grace period for a superseded instance).
//! - **activate**: delete every stored cache namespace whose name is not one
//!   of the two current names, then claim traffic.
//! - **active**: answer intercepted requests through [`OfflineWorker::handle`]
//!   until superseded.
//!
//! ## Interception
//!
//! GET requests are answered cache-first (static namespace before dynamic, no
//! revalidation; static asset URLs are versioned by deployment). Misses go to
//! the origin, and cacheable responses are copied into the namespace chosen
//! by the ordered [`Classifier`] rules as a side effect. When the origin is
//! unreachable the fallback ladder applies: cached root document for
//! navigations, a synthesized SVG placeholder for images, a synthetic 503 for
//! everything else.

mod classify;
mod config;
mod fallback;
mod handler;
mod lifecycle;
mod manifest;
mod namespace;
mod store;

pub use classify::{Classifier, NamespaceKind, RouteRule};
pub use config::WorkerConfig;
pub use handler::InterceptedFetch;
pub use lifecycle::{OfflineWorker, WorkerError, WorkerPhase};
pub use manifest::StaticManifest;
pub use namespace::CacheNames;
pub use store::{CacheStore, StoredResponse};

//! Worker lifecycle: the install and activate gates.

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use axum::http::{HeaderMap, StatusCode};
use futures::future;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::error::DomainError;
use crate::infra::net::{Fetch, FetchError};

use super::{
    classify::Classifier,
    config::WorkerConfig,
    manifest::StaticManifest,
    namespace::CacheNames,
    store::{CacheStore, StoredResponse},
};

/// Lifecycle phase of a worker instance.
///
/// Phases are strictly sequential gates: the interception contract is only
/// honored once the worker is `Active`; before that, traffic passes through
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Installing,
    Activating,
    Active,
}

impl WorkerPhase {
    fn as_u8(self) -> u8 {
        match self {
            Self::Installing => 0,
            Self::Activating => 1,
            Self::Active => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Installing,
            1 => Self::Activating,
            _ => Self::Active,
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("precache of `{path}` failed: {source}")]
    Precache {
        path: String,
        #[source]
        source: FetchError,
    },
    #[error("precache of `{path}` returned status {status}")]
    PrecacheStatus { path: String, status: StatusCode },
}

/// The offline cache worker.
///
/// One instance per process, shared behind `Arc` across request tasks. The
/// host drives `install` and `activate` to completion, in that order, before
/// serving traffic; both are deferred-completion operations in the sense that
/// the lifecycle step is not done until the returned future settles.
pub struct OfflineWorker {
    pub(super) store: CacheStore,
    pub(super) origin: Arc<dyn Fetch>,
    pub(super) manifest: StaticManifest,
    pub(super) classifier: Classifier,
    pub(super) names: CacheNames,
    pub(super) offline_document: String,
    phase: AtomicU8,
}

impl OfflineWorker {
    pub fn new(config: WorkerConfig, origin: Arc<dyn Fetch>) -> Result<Self, DomainError> {
        let manifest = StaticManifest::new(config.manifest)?;
        let classifier =
            Classifier::for_site(&manifest, &config.dynamic_prefixes, &config.assets_root);
        let names = CacheNames::new(config.static_name, config.dynamic_name);

        if !manifest.contains(&config.offline_document) {
            warn!(
                target: "tavola::worker",
                document = %config.offline_document,
                "offline document is not in the precache manifest; offline navigations will degrade to 503"
            );
        }

        Ok(Self {
            store: CacheStore::new(),
            origin,
            manifest,
            classifier,
            names,
            offline_document: config.offline_document,
            phase: AtomicU8::new(WorkerPhase::Installing.as_u8()),
        })
    }

    pub fn phase(&self) -> WorkerPhase {
        WorkerPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: WorkerPhase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    pub fn manifest(&self) -> &StaticManifest {
        &self.manifest
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Install: precache the manifest into the static namespace.
    ///
    /// Entries are fetched concurrently and committed as one batch; if any
    /// entry is unreachable or non-200, nothing is committed and the install
    /// fails (the manifest must list only URLs reachable at deploy time).
    /// On success the worker moves straight to `Activating` with no grace
    /// period for a superseded instance, trading zero-downtime swap for
    /// freshness.
    pub async fn install(&self) -> Result<(), WorkerError> {
        info!(
            target: "tavola::worker",
            namespace = %self.names.static_name(),
            entries = self.manifest.len(),
            "installing: precaching manifest"
        );

        self.store.open(self.names.static_name());

        let fetches = self.manifest.paths().iter().map(|path| self.precache(path));
        let entries = future::try_join_all(fetches).await?;
        self.store.put_all(self.names.static_name(), entries);

        self.set_phase(WorkerPhase::Activating);
        info!(
            target: "tavola::worker",
            "install complete; skipping waiting"
        );
        Ok(())
    }

    async fn precache(&self, path: &str) -> Result<(String, StoredResponse), WorkerError> {
        let response = self
            .origin
            .get(path, &HeaderMap::new())
            .await
            .map_err(|source| WorkerError::Precache {
                path: path.to_string(),
                source,
            })?;

        if response.status != StatusCode::OK {
            return Err(WorkerError::PrecacheStatus {
                path: path.to_string(),
                status: response.status,
            });
        }

        Ok((path.to_string(), StoredResponse::from(&response)))
    }

    /// Activate: purge stale namespaces, then claim traffic.
    ///
    /// Every stored namespace whose name is not one of the two current names
    /// is deleted. Afterwards the worker is `Active` and interception applies
    /// to already-open clients immediately.
    pub async fn activate(&self) {
        for name in self.store.names() {
            if !self.names.is_current(&name) {
                info!(
                    target: "tavola::worker",
                    namespace = %name,
                    "activating: deleting stale cache namespace"
                );
                self.store.delete(&name);
            }
        }
        self.store.open(self.names.dynamic_name());

        self.set_phase(WorkerPhase::Active);
        info!(target: "tavola::worker", "activated; claiming open clients");
    }
}

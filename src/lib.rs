//! Tavola offline delivery core.
//!
//! Two cooperating pieces keep the Tavola storefront usable without network
//! connectivity:
//!
//! - [`worker`]: the offline cache worker. It precaches the site shell from a
//!   fixed manifest during install, purges stale cache namespaces during
//!   activation, and answers intercepted GET traffic cache-first with an
//!   offline fallback ladder.
//! - [`application::menu`]: the menu feed loader. It fetches the published
//!   menu JSON once per process and substitutes an embedded fallback list on
//!   any failure, so consumers never see an empty menu.
//!
//! The [`infra::gateway`] module hosts the worker behind an HTTP listener;
//! [`config`] resolves deployment settings with file → env → CLI precedence.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod worker;

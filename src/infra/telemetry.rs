use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub(crate) const METRIC_CACHE_HIT: &str = "tavola_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "tavola_cache_miss_total";
pub(crate) const METRIC_CACHE_WRITE: &str = "tavola_cache_write_total";
pub(crate) const METRIC_OFFLINE_FALLBACK: &str = "tavola_offline_fallback_total";
pub(crate) const METRIC_MENU_FALLBACK: &str = "tavola_menu_fallback_total";
pub(crate) const METRIC_ORIGIN_FETCH_MS: &str = "tavola_origin_fetch_ms";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of intercepted requests served from the cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of intercepted requests that went to the origin."
        );
        describe_counter!(
            METRIC_CACHE_WRITE,
            Unit::Count,
            "Total number of response copies written through to a cache namespace."
        );
        describe_counter!(
            METRIC_OFFLINE_FALLBACK,
            Unit::Count,
            "Total number of responses synthesized by the offline fallback ladder."
        );
        describe_counter!(
            METRIC_MENU_FALLBACK,
            Unit::Count,
            "Total number of menu loads that substituted the embedded fallback list."
        );
        describe_histogram!(
            METRIC_ORIGIN_FETCH_MS,
            Unit::Milliseconds,
            "Origin fetch latency in milliseconds."
        );
    });
}

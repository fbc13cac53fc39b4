//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;


const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tavola";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORIGIN_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_ORIGIN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STATIC_NAME: &str = "static-v1";
const DEFAULT_DYNAMIC_NAME: &str = "dynamic-v1";
const DEFAULT_ASSETS_ROOT: &str = "/assets/";
const DEFAULT_OFFLINE_DOCUMENT: &str = "/index.html";
const DEFAULT_MENU_FEED_PATH: &str = "/assets/data/menu.json";

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/assets/css/critical.css",
        "/assets/css/main.css",
        "/assets/css/extras.css",
        "/assets/js/main.js",
    ]
    .iter()
    .map(|path| path.to_string())
    .collect()
}

fn default_dynamic_prefixes() -> Vec<String> {
    vec!["/assets/images/".to_string()]
}

/// Command-line arguments for the Tavola binary.
#[derive(Debug, Parser)]
#[command(name = "tavola", version, about = "Tavola offline delivery gateway")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TAVOLA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the offline gateway.
    Serve(Box<ServeArgs>),
    /// Verify that every precache manifest entry is reachable at the origin.
    #[command(name = "check")]
    CheckManifest(CheckArgs),
    /// Fetch the menu feed and print the resolved item list.
    #[command(name = "menu")]
    Menu(MenuArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub origin: OriginOverride,

    /// Override the gateway listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the gateway listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct OriginOverride {
    /// Override the site origin the worker fetches from.
    #[arg(long = "origin-url", value_name = "URL")]
    pub origin_url: Option<String>,

    /// Override the origin fetch timeout.
    #[arg(long = "origin-timeout-seconds", value_name = "SECONDS")]
    pub origin_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub origin: OriginOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MenuArgs {
    #[command(flatten)]
    pub origin: OriginOverride,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub origin: OriginSettings,
    pub cache: CacheSettings,
    pub menu: MenuSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct OriginSettings {
    pub url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub static_name: String,
    pub dynamic_name: String,
    pub manifest: Vec<String>,
    pub dynamic_prefixes: Vec<String>,
    pub assets_root: String,
    pub offline_document: String,
}

#[derive(Debug, Clone)]
pub struct MenuSettings {
    pub feed_path: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TAVOLA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CheckManifest(args)) => raw.apply_origin_override(&args.origin),
        Some(Command::Menu(args)) => raw.apply_origin_override(&args.origin),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    origin: RawOriginSettings,
    cache: RawCacheSettings,
    menu: RawMenuSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOriginSettings {
    url: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    static_name: Option<String>,
    dynamic_name: Option<String>,
    manifest: Option<Vec<String>>,
    dynamic_prefixes: Option<Vec<String>>,
    assets_root: Option<String>,
    offline_document: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMenuSettings {
    feed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        self.apply_origin_override(&overrides.origin);
    }

    fn apply_origin_override(&mut self, overrides: &OriginOverride) {
        if let Some(url) = overrides.origin_url.as_ref() {
            self.origin.url = Some(url.clone());
        }
        if let Some(seconds) = overrides.origin_timeout_seconds {
            self.origin.timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            origin,
            cache,
            menu,
            logging,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            origin: build_origin_settings(origin)?,
            cache: build_cache_settings(cache)?,
            menu: build_menu_settings(menu)?,
            logging: build_logging_settings(logging)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let listen_addr = format!("{host}:{port}")
        .parse()
        .map_err(|err| LoadError::invalid("server.host", format!("failed to parse: {err}")))?;

    Ok(ServerSettings { listen_addr })
}

fn build_origin_settings(origin: RawOriginSettings) -> Result<OriginSettings, LoadError> {
    let raw_url = origin.url.unwrap_or_else(|| DEFAULT_ORIGIN_URL.to_string());
    let url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("origin.url", format!("failed to parse: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(LoadError::invalid(
                "origin.url",
                format!("unsupported scheme `{other}`"),
            ));
        }
    }

    let timeout_seconds = origin
        .timeout_seconds
        .unwrap_or(DEFAULT_ORIGIN_TIMEOUT_SECS);
    if timeout_seconds == 0 {
        return Err(LoadError::invalid(
            "origin.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(OriginSettings {
        url,
        timeout: Duration::from_secs(timeout_seconds),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let static_name = non_empty(cache.static_name, DEFAULT_STATIC_NAME, "cache.static_name")?;
    let dynamic_name = non_empty(
        cache.dynamic_name,
        DEFAULT_DYNAMIC_NAME,
        "cache.dynamic_name",
    )?;
    if static_name == dynamic_name {
        return Err(LoadError::invalid(
            "cache.dynamic_name",
            "static and dynamic namespace names must differ",
        ));
    }

    let manifest = cache.manifest.unwrap_or_else(default_manifest);
    let dynamic_prefixes = cache.dynamic_prefixes.unwrap_or_else(default_dynamic_prefixes);
    let assets_root = non_empty(cache.assets_root, DEFAULT_ASSETS_ROOT, "cache.assets_root")?;
    let offline_document = non_empty(
        cache.offline_document,
        DEFAULT_OFFLINE_DOCUMENT,
        "cache.offline_document",
    )?;

    Ok(CacheSettings {
        static_name,
        dynamic_name,
        manifest,
        dynamic_prefixes,
        assets_root,
        offline_document,
    })
}

fn build_menu_settings(menu: RawMenuSettings) -> Result<MenuSettings, LoadError> {
    let feed_path = non_empty(menu.feed_path, DEFAULT_MENU_FEED_PATH, "menu.feed_path")?;
    Ok(MenuSettings { feed_path })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn non_empty(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let resolved = value.unwrap_or_else(|| default.to_string());
    if resolved.trim().is_empty() {
        return Err(LoadError::invalid(key, "must not be empty"));
    }
    Ok(resolved)
}

//! Worker configuration.

/// Deploy-time configuration for the offline worker.
///
/// Defaults describe the Tavola storefront shell; deployments override them
/// through the `[cache]` section of `tavola.toml`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Current static namespace name, versioned by deployment.
    pub static_name: String,
    /// Current dynamic namespace name, versioned by deployment.
    pub dynamic_name: String,
    /// Paths precached during install.
    pub manifest: Vec<String>,
    /// Prefixes cached opportunistically into the dynamic namespace.
    pub dynamic_prefixes: Vec<String>,
    /// Generic catch-all prefix for dynamic caching.
    pub assets_root: String,
    /// Document served to navigations when the origin is unreachable.
    pub offline_document: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            static_name: "static-v1".to_string(),
            dynamic_name: "dynamic-v1".to_string(),
            manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/assets/css/critical.css".to_string(),
                "/assets/css/main.css".to_string(),
                "/assets/css/extras.css".to_string(),
                "/assets/js/main.js".to_string(),
            ],
            dynamic_prefixes: vec!["/assets/images/".to_string()],
            assets_root: "/assets/".to_string(),
            offline_document: "/index.html".to_string(),
        }
    }
}

impl From<&crate::config::CacheSettings> for WorkerConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            static_name: settings.static_name.clone(),
            dynamic_name: settings.dynamic_name.clone(),
            manifest: settings.manifest.clone(),
            dynamic_prefixes: settings.dynamic_prefixes.clone(),
            assets_root: settings.assets_root.clone(),
            offline_document: settings.offline_document.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_covers_the_site_shell() {
        let config = WorkerConfig::default();
        assert!(config.manifest.contains(&"/".to_string()));
        assert!(config.manifest.contains(&"/index.html".to_string()));
        assert!(config.manifest.iter().any(|path| path.ends_with(".css")));
        assert!(config.manifest.iter().any(|path| path.ends_with(".js")));
        assert_eq!(config.offline_document, "/index.html");
    }

    #[test]
    fn default_names_are_versioned() {
        let config = WorkerConfig::default();
        assert_eq!(config.static_name, "static-v1");
        assert_eq!(config.dynamic_name, "dynamic-v1");
    }
}

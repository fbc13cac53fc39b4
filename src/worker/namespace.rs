//! Versioned cache namespace names.

use super::classify::NamespaceKind;

/// The two namespace names that are current for this worker version.
///
/// Any other name found in storage is stale and is purged on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    static_name: String,
    dynamic_name: String,
}

impl CacheNames {
    pub fn new(static_name: impl Into<String>, dynamic_name: impl Into<String>) -> Self {
        Self {
            static_name: static_name.into(),
            dynamic_name: dynamic_name.into(),
        }
    }

    pub fn static_name(&self) -> &str {
        &self.static_name
    }

    pub fn dynamic_name(&self) -> &str {
        &self.dynamic_name
    }

    /// Lookup order for cache matches: static wins over dynamic.
    pub fn lookup_order(&self) -> [&str; 2] {
        [&self.static_name, &self.dynamic_name]
    }

    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name || name == self.dynamic_name
    }

    pub fn for_kind(&self, kind: NamespaceKind) -> &str {
        match kind {
            NamespaceKind::Static => &self.static_name,
            NamespaceKind::Dynamic => &self.dynamic_name,
        }
    }
}

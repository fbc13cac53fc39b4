//! Deterministic URL classification.
//!
//! An ordered list of exact-or-prefix rules decides which namespace a
//! cacheable URL belongs to; the first matching rule wins. Manifest paths are
//! installed as exact rules ahead of every prefix rule, so a shell file that
//! happens to live under a dynamic prefix still classifies static.

use super::manifest::StaticManifest;

/// Which namespace a cacheable URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoutePattern {
    Exact(String),
    Prefix(String),
}

/// A single classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pattern: RoutePattern,
    kind: NamespaceKind,
}

impl RouteRule {
    pub fn exact(path: impl Into<String>, kind: NamespaceKind) -> Self {
        Self {
            pattern: RoutePattern::Exact(path.into()),
            kind,
        }
    }

    pub fn prefix(path: impl Into<String>, kind: NamespaceKind) -> Self {
        Self {
            pattern: RoutePattern::Prefix(path.into()),
            kind,
        }
    }

    fn matches(&self, path: &str) -> bool {
        match &self.pattern {
            RoutePattern::Exact(exact) => path == exact,
            RoutePattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Ordered, first-match-wins rule list.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<RouteRule>,
}

impl Classifier {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Build the site rule list: manifest paths exactly, then the configured
    /// dynamic prefixes, then the assets root as the generic dynamic
    /// catch-all.
    pub fn for_site(
        manifest: &StaticManifest,
        dynamic_prefixes: &[String],
        assets_root: &str,
    ) -> Self {
        let mut rules = Vec::with_capacity(manifest.len() + dynamic_prefixes.len() + 1);
        for path in manifest.paths() {
            rules.push(RouteRule::exact(path.clone(), NamespaceKind::Static));
        }
        for prefix in dynamic_prefixes {
            rules.push(RouteRule::prefix(prefix.clone(), NamespaceKind::Dynamic));
        }
        rules.push(RouteRule::prefix(assets_root, NamespaceKind::Dynamic));
        Self::new(rules)
    }

    /// Classify a URL path. The query string plays no part in classification.
    pub fn classify(&self, path: &str) -> Option<NamespaceKind> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.kind)
    }
}

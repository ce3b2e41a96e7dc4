/// Adapter construction and kind detection
///
/// The factory owns a registry of constructors keyed by adapter kind. The
/// built-in kinds are registered up front; callers may add their own under
/// a custom identifier. Unregistered kinds fall back to the generic
/// constructor rather than failing the whole config.
use crate::adapters::site::{AdapterKind, SiteAdapter};
use crate::config::SiteConfig;
use crate::TideError;
use std::collections::HashMap;

/// Builds one adapter from a site config
pub type AdapterConstructor =
    Box<dyn Fn(&SiteConfig) -> Result<SiteAdapter, TideError> + Send + Sync>;

pub struct AdapterFactory {
    constructors: HashMap<AdapterKind, AdapterConstructor>,
}

impl AdapterFactory {
    /// Creates a factory with the built-in kinds registered
    pub fn new() -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
        };
        for kind in [
            AdapterKind::Generic,
            AdapterKind::Torrent,
            AdapterKind::Magnet,
            AdapterKind::Index,
            AdapterKind::Directory,
        ] {
            let for_closure = kind.clone();
            factory.register(
                kind,
                Box::new(move |config| SiteAdapter::with_kind(for_closure.clone(), config)),
            );
        }
        factory
    }

    /// Registers a constructor, replacing any existing one for the kind
    pub fn register(&mut self, kind: AdapterKind, constructor: AdapterConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Resolves the kind for a site config.
    ///
    /// An explicit `adapter` field wins; otherwise keywords in the URL
    /// pattern decide.
    pub fn detect_kind(&self, config: &SiteConfig) -> AdapterKind {
        match &config.adapter {
            Some(explicit) => AdapterKind::from_config_str(explicit),
            None => AdapterKind::detect_from_pattern(&config.url_pattern),
        }
    }

    /// Builds the adapter for a site config.
    ///
    /// A kind with no registered constructor gets the generic treatment.
    pub fn create(&self, config: &SiteConfig) -> Result<SiteAdapter, TideError> {
        let kind = self.detect_kind(config);
        match self.constructors.get(&kind) {
            Some(constructor) => {
                tracing::debug!("Building {} adapter for site '{}'", kind, config.name);
                constructor(config)
            }
            None => {
                tracing::debug!(
                    "No constructor for adapter kind '{}', site '{}' gets the generic one",
                    kind,
                    config.name
                );
                SiteAdapter::with_kind(AdapterKind::Generic, config)
            }
        }
    }

    /// Registered kind names, sorted for stable output
    pub fn available_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .constructors
            .keys()
            .map(|k| k.name().to_string())
            .collect();
        kinds.sort();
        kinds
    }
}

impl Default for AdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

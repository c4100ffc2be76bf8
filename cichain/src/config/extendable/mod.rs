//! `extends` resolution for CI configuration documents.
//!
//! Every top-level key whose value is a mapping with an `extends` key is
//! replaced by the deep merge of its bases and its own value. Other keys pass
//! through untouched. The caller's document is only read.
//!
//! ```
//! use cichain::config::extendable::Collection;
//! use serde_json::json;
//!
//! let document = json!({
//!     ".template": {"script": ["p1"], "image": "ruby"},
//!     "rspec": {"extends": ".template", "script": ["c1"]}
//! });
//! let resolved = Collection::new(document.as_object().unwrap()).unwrap().into_hash();
//!
//! assert_eq!(resolved["rspec"], json!({"script": ["c1"], "image": "ruby"}));
//! ```

mod entry;
mod merge;

pub use entry::{Entry, ResolutionCache};
pub use merge::deep_merge;

use super::{ChainConfig, ExtendsConfig};
use crate::errors::ExtensionError;
use serde_json::{Map, Value};
use tracing::debug;

/// A fully resolved configuration document.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    context: &'a Map<String, Value>,
    resolved: Map<String, Value>,
}

impl<'a> Collection<'a> {
    /// Resolves `document` with the default nesting limit.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExtensionError`] hit, in document order.
    pub fn new(document: &'a Map<String, Value>) -> Result<Self, ExtensionError> {
        Self::with_config(document, &ExtendsConfig::default())
    }

    /// Resolves `document` with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExtensionError`] hit, in document order.
    pub fn with_config(
        document: &'a Map<String, Value>,
        config: &ExtendsConfig,
    ) -> Result<Self, ExtensionError> {
        let mut cache = ResolutionCache::new();
        let mut resolved = Map::with_capacity(document.len());

        for (key, value) in document {
            let entry = Entry::new(key, value, document);
            resolved.insert(key.clone(), entry.extend(&mut cache, config.max_nesting_levels)?);
        }

        debug!(
            keys = document.len(),
            extended = cache.len(),
            "Resolved `extends` in configuration"
        );

        Ok(Self {
            context: document,
            resolved,
        })
    }

    /// Resolves `document` with the `extends` settings of a chain
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ExtensionError`] hit, in document order.
    pub fn with_chain_config(
        document: &'a Map<String, Value>,
        config: &ChainConfig,
    ) -> Result<Self, ExtensionError> {
        Self::with_config(document, &config.extends)
    }

    /// Entries of the original document, in document order.
    pub fn iter(&self) -> impl Iterator<Item = Entry<'a>> + '_ {
        self.context
            .iter()
            .map(|(key, value)| Entry::new(key, value, self.context))
    }

    /// The resolved document.
    #[must_use]
    pub fn to_hash(&self) -> Map<String, Value> {
        self.resolved.clone()
    }

    /// Consumes the collection and returns the resolved document.
    #[must_use]
    pub fn into_hash(self) -> Map<String, Value> {
        self.resolved
    }
}

//! One top-level key of a CI configuration document.

use super::merge::deep_merge;
use crate::errors::{CircularDependencyError, ExtensionError, InvalidExtensionError};
use serde_json::{Map, Value};
use std::collections::HashMap;

const EXTENDS: &str = "extends";

/// Completed resolutions, keyed by document key.
///
/// A resolved value depends only on the key's own ancestry, so it is reused
/// wherever the key is extended again.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, Resolution>,
}

#[derive(Debug, Clone)]
struct Resolution {
    value: Map<String, Value>,
    /// Longest chain of extensible parents below the key.
    height: usize,
}

impl ResolutionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved value of `key`, if it was resolved already.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Map<String, Value>> {
        self.entries.get(key).map(|r| &r.value)
    }

    /// Number of resolved keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A key of the document together with its raw value.
///
/// Entries built while resolving a base point back at the entry that extends
/// them, which makes the parent chain the current resolution path.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    key: &'a str,
    value: &'a Value,
    context: &'a Map<String, Value>,
    parent: Option<&'a Entry<'a>>,
}

impl<'a> Entry<'a> {
    /// Creates a top-level entry.
    #[must_use]
    pub fn new(key: &'a str, value: &'a Value, context: &'a Map<String, Value>) -> Self {
        Self {
            key,
            value,
            context,
            parent: None,
        }
    }

    fn with_parent(mut self, parent: &'a Entry<'a>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// The document key.
    #[must_use]
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// The raw, unresolved value.
    #[must_use]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Returns true if the value is a mapping with an `extends` key.
    #[must_use]
    pub fn extensible(&self) -> bool {
        self.value
            .as_object()
            .is_some_and(|map| map.contains_key(EXTENDS))
    }

    /// Keys named by `extends`, in merge order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidExtensionError`] if `extends` is not a string or a
    /// list of strings.
    pub fn extends(&self) -> Result<Vec<&'a str>, ExtensionError> {
        let Some(extends) = self.value.as_object().and_then(|map| map.get(EXTENDS)) else {
            return Ok(Vec::new());
        };

        match extends {
            Value::String(parent) => Ok(vec![parent.as_str()]),
            Value::Array(parents) => parents
                .iter()
                .map(|parent| {
                    parent
                        .as_str()
                        .ok_or_else(|| InvalidExtensionError::invalid_type(self.key).into())
                })
                .collect(),
            _ => Err(InvalidExtensionError::invalid_type(self.key).into()),
        }
    }

    /// Entries currently being resolved above this one, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Entry<'a>> {
        std::iter::successors(self.parent, |entry| entry.parent)
    }

    /// Resolves `extends` and returns the merged value.
    ///
    /// Entries that do not extend anything are returned unchanged. The
    /// `extends` key is not part of the result.
    ///
    /// # Errors
    ///
    /// Returns [`ExtensionError`] for unknown or malformed bases, cycles and
    /// chains deeper than `max_nesting_levels`.
    pub fn extend(
        &self,
        cache: &mut ResolutionCache,
        max_nesting_levels: usize,
    ) -> Result<Value, ExtensionError> {
        if !self.extensible() {
            return Ok(self.value.clone());
        }
        let resolution = self.resolve(cache, max_nesting_levels)?;
        Ok(Value::Object(resolution.value))
    }

    fn resolve(
        &self,
        cache: &mut ResolutionCache,
        max_nesting_levels: usize,
    ) -> Result<Resolution, ExtensionError> {
        let depth = self.ancestors().count();

        if let Some(done) = cache.entries.get(self.key) {
            if depth + done.height > max_nesting_levels {
                return Err(InvalidExtensionError::nesting_too_deep(self.key).into());
            }
            return Ok(done.clone());
        }

        if self.ancestors().any(|entry| entry.key == self.key) {
            return Err(CircularDependencyError::new(self.key, self.path()).into());
        }
        if depth > max_nesting_levels {
            return Err(InvalidExtensionError::nesting_too_deep(self.key).into());
        }

        let parents = self.extends()?;
        let unknown: Vec<String> = parents
            .iter()
            .copied()
            .filter(|parent| !self.context.contains_key(*parent))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(InvalidExtensionError::unknown_keys(self.key, &unknown).into());
        }

        let mut merged = Map::new();
        let mut height = 0;

        for parent in parents {
            let Some(base_value) = self.context.get(parent) else {
                continue;
            };
            if !base_value.is_object() {
                return Err(InvalidExtensionError::invalid_base(self.key).into());
            }

            let base = Entry::new(parent, base_value, self.context).with_parent(self);
            if base.extensible() {
                let resolution = base.resolve(cache, max_nesting_levels)?;
                height = height.max(resolution.height + 1);
                deep_merge(&mut merged, &resolution.value);
            } else if let Value::Object(map) = base_value {
                deep_merge(&mut merged, map);
            }
        }

        if let Value::Object(own) = self.value {
            let mut own = own.clone();
            own.remove(EXTENDS);
            deep_merge(&mut merged, &own);
        }

        let resolution = Resolution {
            value: merged,
            height,
        };
        cache
            .entries
            .insert(self.key.to_string(), resolution.clone());
        Ok(resolution)
    }

    /// Keys from the top-level entry down to this one.
    fn path(&self) -> Vec<String> {
        let mut path: Vec<String> = self.ancestors().map(|e| e.key.to_string()).collect();
        path.reverse();
        path.push(self.key.to_string());
        path
    }
}

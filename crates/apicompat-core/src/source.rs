//! Source locators for operations
//!
//! Records can carry a best-effort hint of where in the documents the
//! operation came from. The classifier asks an [`OperationSourceLookup`];
//! absence is fine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which document a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Base,
    Revision,
}

/// Resolves an operation to a source locator (file, line, url...)
pub trait OperationSourceLookup: Send + Sync {
    fn source(&self, side: Side, method: &str, path: &str) -> Option<String>;
}

/// No source information
impl OperationSourceLookup for () {
    fn source(&self, _side: Side, _method: &str, _path: &str) -> Option<String> {
        None
    }
}

/// Source locators keyed by `"METHOD /path"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMap {
    pub base: BTreeMap<String, String>,
    pub revision: BTreeMap<String, String>,
}

impl SourceMap {
    /// Parse a source map serialized as JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn key(method: &str, path: &str) -> String {
        format!("{} {}", method.to_ascii_uppercase(), path)
    }

    pub fn insert(&mut self, side: Side, method: &str, path: &str, source: impl Into<String>) {
        let map = match side {
            Side::Base => &mut self.base,
            Side::Revision => &mut self.revision,
        };
        map.insert(Self::key(method, path), source.into());
    }
}

impl OperationSourceLookup for SourceMap {
    fn source(&self, side: Side, method: &str, path: &str) -> Option<String> {
        let map = match side {
            Side::Base => &self.base,
            Side::Revision => &self.revision,
        };
        map.get(&Self::key(method, path)).cloned()
    }
}

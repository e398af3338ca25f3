//! Record construction
//!
//! Every check funnels through [`Collector`], which drops inactive rules and
//! applies the configured level before a record is created.

use apicompat_core::{ChangeCore, ChangeList, ChangeRecord, Config, Endpoint};

/// Identity of the operation a record belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub endpoint: Endpoint,
    pub operation_id: Option<String>,
    pub source: Option<String>,
}

impl OperationContext {
    pub fn new(path: &str, method: &str, operation_id: Option<String>, source: Option<String>) -> Self {
        Self {
            endpoint: Endpoint::new(path, method),
            operation_id,
            source,
        }
    }
}

pub(crate) struct Collector<'a> {
    config: &'a Config,
    changes: ChangeList,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(config: &'a Config) -> Self {
        Self {
            config,
            changes: ChangeList::new(),
        }
    }

    fn core(&self, id: &str, args: Vec<String>) -> Option<ChangeCore> {
        if !self.config.is_active(id) {
            return None;
        }

        match self.config.level(id) {
            Some(level) => Some(ChangeCore::new(id, level, args)),
            None => {
                tracing::warn!(id, "check produced an id missing from the catalog");
                None
            }
        }
    }

    /// Record an endpoint-scoped change
    pub(crate) fn api(&mut self, op: &OperationContext, id: &str, args: Vec<String>, comment: Option<String>) {
        if let Some(core) = self.core(id, args) {
            let record = ChangeRecord::api(core, &op.endpoint, op.operation_id.clone())
                .with_comment(comment)
                .with_source(op.source.clone());
            self.changes.push(record);
        }
    }

    /// Record a document-wide security change
    pub(crate) fn security(&mut self, id: &str, args: Vec<String>) {
        if let Some(core) = self.core(id, args) {
            self.changes.push(ChangeRecord::security(core));
        }
    }

    /// Record a component change
    pub(crate) fn component(&mut self, category: &str, id: &str, args: Vec<String>) {
        if let Some(core) = self.core(id, args) {
            self.changes.push(ChangeRecord::component(core, category));
        }
    }

    pub(crate) fn finish(self) -> ChangeList {
        self.changes
    }
}

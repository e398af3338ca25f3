//! Classification entry point
//!
//! [`Checker`] walks a [`StructuralDiff`] once and returns every active
//! finding as a sorted [`ChangeList`]. It holds only shared references, so
//! one config can serve many evaluations at once.

use chrono::NaiveDate;

use apicompat_core::diff::{Operation, OperationDiff, PathDiff, PathItem, PathsDiff, StructuralDiff};
use apicompat_core::rules::ids;
use apicompat_core::{ChangeList, Config, OperationSourceLookup, Side};

use crate::collector::{Collector, OperationContext};
use crate::deprecation::{announcement_verdicts, removal_verdict, RemovalScope};
use crate::operation_checks::check_operation;
use crate::security_checks::{check_components, check_global_security};

/// Classifies structural diffs under one configuration
pub struct Checker<'a> {
    config: &'a Config,
    sources: &'a dyn OperationSourceLookup,
    today: NaiveDate,
}

impl<'a> Checker<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            sources: &(),
            today: chrono::Utc::now().date_naive(),
        }
    }

    /// Evaluate sunset dates against a fixed day
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Attach source locators to records
    pub fn with_sources(mut self, sources: &'a dyn OperationSourceLookup) -> Self {
        self.sources = sources;
        self
    }

    /// Classify every change in `diff`
    pub fn check(&self, diff: &StructuralDiff) -> ChangeList {
        let mut collector = Collector::new(self.config);

        if let Some(paths) = &diff.paths {
            self.check_paths(&mut collector, paths);
        }
        if let Some(security) = &diff.security {
            check_global_security(&mut collector, security);
        }
        if let Some(components) = &diff.components {
            check_components(&mut collector, components);
        }

        let mut changes = collector.finish();
        changes.sort();

        let counts = changes.count_by_level();
        tracing::debug!(
            errors = counts.errors,
            warnings = counts.warnings,
            info = counts.info,
            "classification finished"
        );
        changes
    }

    fn context(&self, side: Side, path: &str, method: &str, operation_id: Option<String>) -> OperationContext {
        let source = self.sources.source(side, &method.to_ascii_uppercase(), path);
        OperationContext::new(path, method, operation_id, source)
    }

    fn check_paths(&self, collector: &mut Collector<'_>, paths: &PathsDiff) {
        for (path, item) in &paths.added {
            self.check_added_operations(collector, path, &item.operations);
        }
        for (path, item) in &paths.deleted {
            self.check_deleted_path(collector, path, item);
        }
        for (path, diff) in &paths.modified {
            self.check_modified_path(collector, path, diff);
        }
    }

    fn check_added_operations(
        &self,
        collector: &mut Collector<'_>,
        path: &str,
        operations: &std::collections::BTreeMap<String, Operation>,
    ) {
        for (method, operation) in operations {
            let op = self.context(Side::Revision, path, method, operation.operation_id.clone());
            collector.api(&op, ids::ENDPOINT_ADDED, vec![], None);
        }
    }

    fn check_deleted_path(&self, collector: &mut Collector<'_>, path: &str, item: &PathItem) {
        for (method, operation) in &item.operations {
            self.check_removal(collector, RemovalScope::Path, path, method, operation);
        }
    }

    fn check_removal(
        &self,
        collector: &mut Collector<'_>,
        scope: RemovalScope,
        path: &str,
        method: &str,
        operation: &Operation,
    ) {
        let op = self.context(Side::Base, path, method, operation.operation_id.clone());
        match removal_verdict(scope, operation, self.today) {
            Some(verdict) => collector.api(&op, verdict.id, verdict.args, None),
            None => tracing::debug!(path, method, "removal accepted after sunset"),
        }
    }

    fn check_modified_path(&self, collector: &mut Collector<'_>, path: &str, diff: &PathDiff) {
        self.check_added_operations(collector, path, &diff.added);

        for (method, operation) in &diff.deleted {
            self.check_removal(collector, RemovalScope::Operation, path, method, operation);
        }

        for (method, operation) in &diff.modified {
            self.check_modified_operation(collector, path, method, operation);
        }
    }

    fn check_modified_operation(&self, collector: &mut Collector<'_>, path: &str, method: &str, diff: &OperationDiff) {
        tracing::debug!(path, method, "checking operation");

        let operation_id = diff
            .revision
            .operation_id
            .clone()
            .or_else(|| diff.base.operation_id.clone());
        let op = self.context(Side::Revision, path, method, operation_id);

        for verdict in announcement_verdicts(diff, &self.config.deprecation, self.today) {
            collector.api(&op, verdict.id, verdict.args, None);
        }

        check_operation(collector, &op, diff);
    }
}

/// Classify `diff` under `config`, evaluating sunset dates against today
pub fn check(diff: &StructuralDiff, config: &Config) -> ChangeList {
    Checker::new(config).check(diff)
}

//! apicompat engine - change classification
//!
//! This crate turns a structural diff of two API documents into classified
//! changes:
//! - Schema diff tree walker
//! - Schema, operation and security checks
//! - Deprecation and sunset policy
//! - Ignore-list filtering

pub mod checker;
pub mod collector;
pub mod deprecation;
pub mod ignore;
pub mod walker;

mod operation_checks;
mod schema_checks;
mod security_checks;

pub use checker::{check, Checker};
pub use collector::OperationContext;
pub use deprecation::{parse_sunset, removal_verdict, RemovalScope, Stability, Sunset, Verdict};
pub use ignore::{filter_ignored, IgnoreEntry, IgnoreError, IgnoreList};
pub use security_checks::SECURITY_SCHEMES;
pub use walker::{full_name, visit_added, visit_deleted, visit_modified};

//! apicompat core
//!
//! Domain model for API-contract change classification: the structural diff
//! input, the rule catalog, the severity policy and the change records.
//! Never rename change ids - they are part of the public API.

pub mod change;
pub mod changes;
pub mod config;
pub mod diff;
pub mod localizer;
pub mod policy;
pub mod rules;
pub mod source;

pub use change::{ApiChange, ChangeCore, ChangeRecord, ComponentChange, Endpoint, Level, ParseLevelError, SecurityChange};
pub use changes::{ChangeList, GroupedChanges, LevelCounts};
pub use config::{CheckMode, Config, ConfigError, DeprecationConfig, SeverityOverrides};
pub use diff::{Schema, SchemaDiffNode, StructuralDiff};
pub use localizer::{Localizer, TemplateLocalizer};
pub use policy::{classify, Direction, Effect, Finding, Location};
pub use rules::{catalog, Rule, RuleCatalog};
pub use source::{OperationSourceLookup, Side, SourceMap};

//! Change records and severity levels
//!
//! IMPORTANT: Change ids are stable.
//! NEVER rename or remove ids - ignore files and CI gates key on them.
//! Add new ids with new names only.

use serde::{Deserialize, Serialize};
use crate::localizer::Localizer;

/// Severity level of a change
///
/// Ordering is significant: `Info < Warn < Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Informational - documents the change, never gates
    #[serde(rename = "info")]
    Info,

    /// Warning - may affect some clients, should be reviewed
    #[serde(rename = "warning", alias = "warn")]
    Warn,

    /// Error - breaks existing clients
    #[serde(rename = "error", alias = "err")]
    Err,
}

impl Level {
    /// All levels in ascending order
    pub const ALL: [Level; 3] = [Level::Info, Level::Warn, Level::Err];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warning",
            Self::Err => "error",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a level name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level '{0}', expected one of: info, warn, error")]
pub struct ParseLevelError(pub String);

impl std::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, ParseLevelError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "err" | "error" => Ok(Self::Err),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// One HTTP operation: a (path, method) pair
///
/// Orders by path first, then method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Path template, e.g. `/pets/{id}`
    pub path: String,

    /// Upper-case method, e.g. `GET`
    pub method: String,
}

impl Endpoint {
    /// Create an endpoint, normalising the method to upper case
    pub fn new(path: impl Into<String>, method: impl AsRef<str>) -> Self {
        Self {
            path: path.into(),
            method: method.as_ref().to_ascii_uppercase(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Fields shared by every change record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCore {
    /// Stable change id from the rule catalog
    pub id: String,

    /// Effective level (catalog default or config override)
    pub level: Level,

    /// Ordered message arguments, rendered by a [`Localizer`]
    pub args: Vec<String>,

    /// Optional free-text note (e.g. the media type a schema change belongs to)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Document the change originated from (best-effort)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ChangeCore {
    /// Create a new core with no comment or source
    pub fn new(id: impl Into<String>, level: Level, args: Vec<String>) -> Self {
        Self {
            id: id.into(),
            level,
            args,
            comment: None,
            source: None,
        }
    }
}

/// A change scoped to a single endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiChange {
    #[serde(flatten)]
    pub core: ChangeCore,

    /// Upper-case HTTP method
    pub operation: String,

    /// Operation id, when the document declares one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Path template
    pub path: String,
}

/// A change to a reusable component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentChange {
    #[serde(flatten)]
    pub core: ChangeCore,

    /// Component category, e.g. `securitySchemes`
    pub component: String,
}

/// A change to the document-wide security requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityChange {
    #[serde(flatten)]
    pub core: ChangeCore,
}

/// A classified change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChangeRecord {
    Api(ApiChange),
    Component(ComponentChange),
    Security(SecurityChange),
}

impl ChangeRecord {
    /// Create an endpoint-scoped change
    pub fn api(core: ChangeCore, endpoint: &Endpoint, operation_id: Option<String>) -> Self {
        Self::Api(ApiChange {
            core,
            operation: endpoint.method.clone(),
            operation_id,
            path: endpoint.path.clone(),
        })
    }

    /// Create a component change
    pub fn component(core: ChangeCore, component: impl Into<String>) -> Self {
        Self::Component(ComponentChange {
            core,
            component: component.into(),
        })
    }

    /// Create a global security change
    pub fn security(core: ChangeCore) -> Self {
        Self::Security(SecurityChange { core })
    }

    /// Shared fields
    pub fn core(&self) -> &ChangeCore {
        match self {
            Self::Api(c) => &c.core,
            Self::Component(c) => &c.core,
            Self::Security(c) => &c.core,
        }
    }

    fn core_mut(&mut self) -> &mut ChangeCore {
        match self {
            Self::Api(c) => &mut c.core,
            Self::Component(c) => &mut c.core,
            Self::Security(c) => &mut c.core,
        }
    }

    pub fn id(&self) -> &str {
        &self.core().id
    }

    pub fn level(&self) -> Level {
        self.core().level
    }

    pub fn args(&self) -> &[String] {
        &self.core().args
    }

    pub fn comment(&self) -> Option<&str> {
        self.core().comment.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.core().source.as_deref()
    }

    /// Path of the endpoint, or an empty string for non-endpoint changes
    pub fn path(&self) -> &str {
        match self {
            Self::Api(c) => &c.path,
            _ => "",
        }
    }

    /// Method of the endpoint, or an empty string for non-endpoint changes
    pub fn operation(&self) -> &str {
        match self {
            Self::Api(c) => &c.operation,
            _ => "",
        }
    }

    /// The endpoint this change belongs to, if any
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Self::Api(c) => Some(Endpoint {
                path: c.path.clone(),
                method: c.operation.clone(),
            }),
            _ => None,
        }
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.core_mut().comment = comment;
        self
    }

    /// Set the source locator
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.core_mut().source = source;
        self
    }

    /// Plain (uncolored) message text
    pub fn text(&self, localizer: &dyn Localizer) -> String {
        localizer.text(self.id(), self.args())
    }

    /// Message text with highlighted arguments
    pub fn pretty_text(&self, localizer: &dyn Localizer) -> String {
        localizer.pretty(self.id(), self.args())
    }

    /// Whether this change gates at `threshold`
    pub fn is_breaking_at(&self, threshold: Level) -> bool {
        self.level() >= threshold
    }
}

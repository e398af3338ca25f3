//! Structural diff input model
//!
//! These types describe what the upstream structural-diff engine hands us:
//! which parts of two API documents were added, deleted or modified.
//! The classifier only reads them. All maps are ordered so that iteration,
//! and therefore output, is reproducible.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A from/to pair
///
/// `None` on one side means the value was added (`from` is `None`) or
/// removed (`to` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDiff<T> {
    #[serde(default)]
    pub from: Option<T>,

    #[serde(default)]
    pub to: Option<T>,
}

impl<T: PartialEq> ValueDiff<T> {
    pub fn new(from: Option<T>, to: Option<T>) -> Self {
        Self { from, to }
    }

    /// Both sides present
    pub fn changed(from: T, to: T) -> Self {
        Self { from: Some(from), to: Some(to) }
    }

    /// True when both sides are equal
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Added and deleted string members (required lists, tags, scopes...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetDiff {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
}

impl SetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// Added and deleted enum values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuesDiff {
    pub added: Vec<Value>,
    pub deleted: Vec<Value>,
}

impl ValuesDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// Snapshot of one side of a schema
///
/// Only the attributes the classifier consults are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

impl Schema {
    /// Create a schema of the given type
    pub fn of_type(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: Some(schema_type.into()),
            ..Self::default()
        }
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Numeric, length and item-count bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    Max,
    Min,
    MaxLength,
    MinLength,
    MaxItems,
    MinItems,
}

impl Bound {
    pub const ALL: [Bound; 6] = [
        Bound::Max,
        Bound::Min,
        Bound::MaxLength,
        Bound::MinLength,
        Bound::MaxItems,
        Bound::MinItems,
    ];

    /// Upper bounds constrain from above; raising one widens the value space
    pub fn is_upper(&self) -> bool {
        matches!(self, Self::Max | Self::MaxLength | Self::MaxItems)
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::MaxLength => "max-length",
            Self::MinLength => "min-length",
            Self::MaxItems => "max-items",
            Self::MinItems => "min-items",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::MaxLength => "max length",
            Self::MinLength => "min length",
            Self::MaxItems => "max items",
            Self::MinItems => "min items",
        }
    }
}

/// Composite-variant keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariantKind {
    AllOf,
    AnyOf,
    OneOf,
}

impl VariantKind {
    pub const ALL: [VariantKind; 3] = [VariantKind::AllOf, VariantKind::AnyOf, VariantKind::OneOf];

    /// Keyword as written in the document
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::AllOf => "allOf",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::AllOf => "all-of",
            Self::AnyOf => "any-of",
            Self::OneOf => "one-of",
        }
    }
}

/// Kinds of composite children, in visiting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChildKind {
    AllOf,
    AnyOf,
    OneOf,
    Items,
    Properties,
    AdditionalProperties,
}

/// Added, deleted and modified variants of one composite keyword
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantsDiff {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub modified: BTreeMap<String, SchemaDiffNode>,
}

impl VariantsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.modified.values().all(SchemaDiffNode::is_empty)
    }
}

/// Added, deleted and modified properties of an object schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesDiff {
    pub added: BTreeMap<String, Schema>,
    pub deleted: BTreeMap<String, Schema>,
    pub modified: BTreeMap<String, SchemaDiffNode>,
}

impl PropertiesDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && self.modified.values().all(SchemaDiffNode::is_empty)
    }
}

/// A present composite child of a schema diff node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaChild {
    AllOf(VariantsDiff),
    AnyOf(VariantsDiff),
    OneOf(VariantsDiff),
    Items(Box<SchemaDiffNode>),
    Properties(PropertiesDiff),
    AdditionalProperties(Box<SchemaDiffNode>),
}

impl SchemaChild {
    pub fn kind(&self) -> ChildKind {
        match self {
            Self::AllOf(_) => ChildKind::AllOf,
            Self::AnyOf(_) => ChildKind::AnyOf,
            Self::OneOf(_) => ChildKind::OneOf,
            Self::Items(_) => ChildKind::Items,
            Self::Properties(_) => ChildKind::Properties,
            Self::AdditionalProperties(_) => ChildKind::AdditionalProperties,
        }
    }

    /// The variant keyword and its diff, for allOf/anyOf/oneOf children
    pub fn variants(&self) -> Option<(VariantKind, &VariantsDiff)> {
        match self {
            Self::AllOf(v) => Some((VariantKind::AllOf, v)),
            Self::AnyOf(v) => Some((VariantKind::AnyOf, v)),
            Self::OneOf(v) => Some((VariantKind::OneOf, v)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::AllOf(v) | Self::AnyOf(v) | Self::OneOf(v) => v.is_empty(),
            Self::Items(node) | Self::AdditionalProperties(node) => node.is_empty(),
            Self::Properties(p) => p.is_empty(),
        }
    }
}

/// Discriminator changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscriminatorDiff {
    pub added: bool,
    pub deleted: bool,
    pub property_name: Option<ValueDiff<String>>,
    /// Mapping keys added/removed
    pub mapping: Option<SetDiff>,
}

impl DiscriminatorDiff {
    pub fn is_empty(&self) -> bool {
        !self.added
            && !self.deleted
            && self.property_name.as_ref().map_or(true, ValueDiff::is_empty)
            && self.mapping.as_ref().map_or(true, SetDiff::is_empty)
    }
}

/// Diff of one schema location
///
/// `base` and `revision` are snapshots used for context lookups (required
/// lists, defaults, visibility); they are never reported on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaDiffNode {
    pub base: Schema,
    pub revision: Schema,

    /// Present composite children; visiting order is fixed by [`ChildKind`]
    pub children: Vec<SchemaChild>,

    #[serde(rename = "type")]
    pub type_diff: Option<ValueDiff<String>>,
    pub format: Option<ValueDiff<String>>,
    #[serde(rename = "enum")]
    pub enum_diff: Option<ValuesDiff>,
    pub nullable: Option<ValueDiff<bool>>,
    pub read_only: Option<ValueDiff<bool>>,
    pub write_only: Option<ValueDiff<bool>>,
    pub required: Option<SetDiff>,
    pub pattern: Option<ValueDiff<String>>,
    pub default: Option<ValueDiff<Value>>,
    pub max: Option<ValueDiff<f64>>,
    pub min: Option<ValueDiff<f64>>,
    pub max_length: Option<ValueDiff<f64>>,
    pub min_length: Option<ValueDiff<f64>>,
    pub max_items: Option<ValueDiff<f64>>,
    pub min_items: Option<ValueDiff<f64>>,
    pub discriminator: Option<DiscriminatorDiff>,
    pub extensions: BTreeMap<String, ValueDiff<Value>>,
}

impl SchemaDiffNode {
    /// Create a node with both snapshots set
    pub fn between(base: Schema, revision: Schema) -> Self {
        Self {
            base,
            revision,
            ..Self::default()
        }
    }

    /// The diff for one bound, if it changed
    pub fn bound(&self, bound: Bound) -> Option<&ValueDiff<f64>> {
        let diff = match bound {
            Bound::Max => &self.max,
            Bound::Min => &self.min,
            Bound::MaxLength => &self.max_length,
            Bound::MinLength => &self.min_length,
            Bound::MaxItems => &self.max_items,
            Bound::MinItems => &self.min_items,
        };
        diff.as_ref().filter(|d| !d.is_empty())
    }

    /// Children sorted into visiting order; same-kind children keep input order
    pub fn ordered_children(&self) -> Vec<&SchemaChild> {
        let mut children: Vec<&SchemaChild> = self.children.iter().collect();
        children.sort_by_key(|c| c.kind());
        children
    }

    /// Merged view of the properties children
    pub fn properties(&self) -> impl Iterator<Item = &PropertiesDiff> {
        self.children.iter().filter_map(|c| match c {
            SchemaChild::Properties(p) => Some(p),
            _ => None,
        })
    }

    pub fn property_added(&self, name: &str) -> bool {
        self.properties().any(|p| p.added.contains_key(name))
    }

    pub fn property_deleted(&self, name: &str) -> bool {
        self.properties().any(|p| p.deleted.contains_key(name))
    }

    /// True when the node carries no change at all
    pub fn is_empty(&self) -> bool {
        fn empty<T: PartialEq>(d: &Option<ValueDiff<T>>) -> bool {
            d.as_ref().map_or(true, ValueDiff::is_empty)
        }

        empty(&self.type_diff)
            && empty(&self.format)
            && self.enum_diff.as_ref().map_or(true, ValuesDiff::is_empty)
            && empty(&self.nullable)
            && empty(&self.read_only)
            && empty(&self.write_only)
            && self.required.as_ref().map_or(true, SetDiff::is_empty)
            && empty(&self.pattern)
            && empty(&self.default)
            && Bound::ALL.iter().all(|b| self.bound(*b).is_none())
            && self.discriminator.as_ref().map_or(true, DiscriminatorDiff::is_empty)
            && self.extensions.values().all(ValueDiff::is_empty)
            && self.children.iter().all(SchemaChild::is_empty)
    }
}

/// Where a parameter lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl std::fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Cookie => write!(f, "cookie"),
        }
    }
}

/// Snapshot of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    /// Path parameters are always required
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParameterLocation::Path
    }

    pub fn has_default(&self) -> bool {
        self.schema.as_ref().map_or(false, Schema::has_default)
    }
}

/// Diff of a parameter present on both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDiff {
    pub base: Parameter,
    pub revision: Parameter,

    #[serde(default)]
    pub required: Option<ValueDiff<bool>>,

    #[serde(default)]
    pub schema: Option<SchemaDiffNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametersDiff {
    pub added: Vec<Parameter>,
    pub deleted: Vec<Parameter>,
    pub modified: Vec<ParameterDiff>,
}

/// Media type → schema diff
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDiff {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub modified: BTreeMap<String, SchemaDiffNode>,
}

/// Snapshot of a request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, Schema>,
}

/// Request body diff; a missing side means the body was added or removed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestBodyDiff {
    pub base: Option<RequestBody>,
    pub revision: Option<RequestBody>,
    pub required: Option<ValueDiff<bool>>,
    pub content: Option<ContentDiff>,
}

/// Snapshot of a response header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub required: bool,
    pub schema: Option<Schema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderDiff {
    pub base: Header,
    pub revision: Header,
    pub required: Option<ValueDiff<bool>>,
    pub schema: Option<SchemaDiffNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadersDiff {
    pub added: BTreeMap<String, Header>,
    pub deleted: BTreeMap<String, Header>,
    pub modified: BTreeMap<String, HeaderDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseDiff {
    pub content: Option<ContentDiff>,
    pub headers: Option<HeadersDiff>,
}

/// Status code → response diff
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponsesDiff {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub modified: BTreeMap<String, ResponseDiff>,
}

/// Security requirements: scheme name → scopes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityRequirementsDiff {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub modified: BTreeMap<String, SetDiff>,
}

/// Snapshot of one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub deprecated: bool,
    pub tags: Vec<String>,
    pub parameters: Vec<Parameter>,

    /// Vendor extensions (`x-sunset`, `x-stability-level`, ...)
    pub extensions: BTreeMap<String, Value>,
}

impl Operation {
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}

/// Diff of an operation present on both sides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperationDiff {
    pub base: Operation,
    pub revision: Operation,
    pub operation_id: Option<ValueDiff<String>>,
    pub tags: Option<SetDiff>,
    pub parameters: Option<ParametersDiff>,
    pub request_body: Option<RequestBodyDiff>,
    pub responses: Option<ResponsesDiff>,
    pub security: Option<SecurityRequirementsDiff>,
}

/// Method (lower case, as in the document) → operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub operations: BTreeMap<String, Operation>,
}

/// Diff of a path present on both sides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathDiff {
    pub added: BTreeMap<String, Operation>,
    pub deleted: BTreeMap<String, Operation>,
    pub modified: BTreeMap<String, OperationDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsDiff {
    pub added: BTreeMap<String, PathItem>,
    pub deleted: BTreeMap<String, PathItem>,
    pub modified: BTreeMap<String, PathDiff>,
}

/// Diff of one security scheme component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecuritySchemeDiff {
    #[serde(rename = "type")]
    pub scheme_type: Option<ValueDiff<String>>,
    pub token_url: Option<ValueDiff<String>>,
    pub scopes: Option<SetDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySchemesDiff {
    pub added: BTreeSet<String>,
    pub deleted: BTreeSet<String>,
    pub modified: BTreeMap<String, SecuritySchemeDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentsDiff {
    pub security_schemes: Option<SecuritySchemesDiff>,
}

/// Root of the structural diff between two documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralDiff {
    pub paths: Option<PathsDiff>,
    pub security: Option<SecurityRequirementsDiff>,
    pub components: Option<ComponentsDiff>,
}

impl StructuralDiff {
    /// Parse a diff serialized as JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

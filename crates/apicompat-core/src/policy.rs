//! Severity classification policy
//!
//! Every schema-level finding is classified by how it moves the set of values
//! a client may send (request) or must be ready to receive (response).
//! Requests tolerate widening and break on narrowing; responses are the
//! mirror image. A handful of findings carry a fixed level regardless of
//! direction.

use crate::change::Level;
use crate::diff::{Bound, Schema, VariantKind};

/// Which side of the wire a location is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

/// Where in an operation a schema-level finding was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Location {
    RequestParameter,
    RequestBody,
    RequestProperty,
    ResponseBody,
    ResponseProperty,
    ResponseHeader,
}

impl Location {
    pub const ALL: [Location; 6] = [
        Location::RequestParameter,
        Location::RequestBody,
        Location::RequestProperty,
        Location::ResponseBody,
        Location::ResponseProperty,
        Location::ResponseHeader,
    ];

    pub fn direction(&self) -> Direction {
        match self {
            Self::RequestParameter | Self::RequestBody | Self::RequestProperty => Direction::Request,
            Self::ResponseBody | Self::ResponseProperty | Self::ResponseHeader => Direction::Response,
        }
    }

    /// Id prefix
    pub fn slug(&self) -> &'static str {
        match self {
            Self::RequestParameter => "request-parameter",
            Self::RequestBody => "request-body",
            Self::RequestProperty => "request-property",
            Self::ResponseBody => "response-body",
            Self::ResponseProperty => "response-property",
            Self::ResponseHeader => "response-header",
        }
    }

    /// Message subject and the number of leading arguments it consumes
    pub fn subject(&self) -> (&'static str, usize) {
        match self {
            Self::RequestParameter => ("the {0} request parameter '{1}'", 2),
            Self::RequestBody => ("the request body", 0),
            Self::RequestProperty => ("the request property '{0}'", 1),
            Self::ResponseBody => ("the response body for status '{0}'", 1),
            Self::ResponseProperty => ("the response property '{0}' for status '{1}'", 2),
            Self::ResponseHeader => ("the response header '{0}' for status '{1}'", 2),
        }
    }
}

/// How a finding moves the value space, or a fixed verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fewer values accepted/produced
    Narrows,
    /// More values accepted/produced, or a guarantee dropped
    Widens,
    /// Same level on both sides of the wire
    Fixed(Level),
    /// Explicit level per side
    PerSide { request: Level, response: Level },
}

impl Effect {
    pub fn level(&self, direction: Direction) -> Level {
        match (self, direction) {
            (Self::Narrows, Direction::Request) => Level::Err,
            (Self::Narrows, Direction::Response) => Level::Info,
            (Self::Widens, Direction::Request) => Level::Info,
            (Self::Widens, Direction::Response) => Level::Err,
            (Self::Fixed(level), _) => *level,
            (Self::PerSide { request, .. }, Direction::Request) => *request,
            (Self::PerSide { response, .. }, Direction::Response) => *response,
        }
    }
}

/// One elementary schema-level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finding {
    TypeChanged { generalized: bool },
    FormatChanged { generalized: bool },
    EnumValueAdded,
    EnumValueRemoved,
    BecameNullable,
    BecameNotNullable,
    PatternAdded,
    PatternChanged,
    PatternRemoved,
    DefaultValueAdded,
    DefaultValueChanged,
    DefaultValueRemoved,
    BoundSet(Bound),
    BoundRemoved(Bound),
    BoundIncreased(Bound),
    BoundDecreased(Bound),
    BecameRequired { with_default: bool },
    BecameOptional,
    Added { required: bool, with_default: bool },
    Removed,
    VariantAdded(VariantKind),
    VariantRemoved(VariantKind),
    DiscriminatorAdded,
    DiscriminatorRemoved,
    DiscriminatorPropertyChanged,
    DiscriminatorMappingChanged,
}

impl Finding {
    /// A newly added leaf; `with_default` only matters for required leaves
    pub fn added(required: bool, with_default: bool) -> Self {
        Self::Added {
            required,
            with_default: required && with_default,
        }
    }

    /// Every distinct finding, used to build the rule catalog
    pub fn all() -> Vec<Finding> {
        let mut all = vec![
            Self::TypeChanged { generalized: false },
            Self::TypeChanged { generalized: true },
            Self::FormatChanged { generalized: false },
            Self::FormatChanged { generalized: true },
            Self::EnumValueAdded,
            Self::EnumValueRemoved,
            Self::BecameNullable,
            Self::BecameNotNullable,
            Self::PatternAdded,
            Self::PatternChanged,
            Self::PatternRemoved,
            Self::DefaultValueAdded,
            Self::DefaultValueChanged,
            Self::DefaultValueRemoved,
        ];
        for bound in Bound::ALL {
            all.extend([
                Self::BoundSet(bound),
                Self::BoundRemoved(bound),
                Self::BoundIncreased(bound),
                Self::BoundDecreased(bound),
            ]);
        }
        all.extend([
            Self::BecameRequired { with_default: false },
            Self::BecameRequired { with_default: true },
            Self::BecameOptional,
            Self::Added { required: true, with_default: false },
            Self::Added { required: true, with_default: true },
            Self::Added { required: false, with_default: false },
            Self::Removed,
        ]);
        for kind in VariantKind::ALL {
            all.extend([Self::VariantAdded(kind), Self::VariantRemoved(kind)]);
        }
        all.extend([
            Self::DiscriminatorAdded,
            Self::DiscriminatorRemoved,
            Self::DiscriminatorPropertyChanged,
            Self::DiscriminatorMappingChanged,
        ]);
        all
    }

    /// Id suffix
    pub fn slug(&self) -> String {
        match self {
            Self::TypeChanged { generalized: false } => "type-changed".into(),
            Self::TypeChanged { generalized: true } => "type-generalized".into(),
            Self::FormatChanged { generalized: false } => "format-changed".into(),
            Self::FormatChanged { generalized: true } => "format-generalized".into(),
            Self::EnumValueAdded => "enum-value-added".into(),
            Self::EnumValueRemoved => "enum-value-removed".into(),
            Self::BecameNullable => "became-nullable".into(),
            Self::BecameNotNullable => "became-not-nullable".into(),
            Self::PatternAdded => "pattern-added".into(),
            Self::PatternChanged => "pattern-changed".into(),
            Self::PatternRemoved => "pattern-removed".into(),
            Self::DefaultValueAdded => "default-value-added".into(),
            Self::DefaultValueChanged => "default-value-changed".into(),
            Self::DefaultValueRemoved => "default-value-removed".into(),
            Self::BoundSet(b) => format!("{}-set", b.slug()),
            Self::BoundRemoved(b) => format!("{}-removed", b.slug()),
            Self::BoundIncreased(b) => format!("{}-increased", b.slug()),
            Self::BoundDecreased(b) => format!("{}-decreased", b.slug()),
            Self::BecameRequired { with_default: false } => "became-required".into(),
            Self::BecameRequired { with_default: true } => "became-required-with-default".into(),
            Self::BecameOptional => "became-optional".into(),
            Self::Added { required: true, with_default: false } => "added-required".into(),
            Self::Added { required: true, with_default: true } => "added-required-with-default".into(),
            Self::Added { required: false, .. } => "added-optional".into(),
            Self::Removed => "removed".into(),
            Self::VariantAdded(k) => format!("{}-added", k.slug()),
            Self::VariantRemoved(k) => format!("{}-removed", k.slug()),
            Self::DiscriminatorAdded => "discriminator-added".into(),
            Self::DiscriminatorRemoved => "discriminator-removed".into(),
            Self::DiscriminatorPropertyChanged => "discriminator-property-name-changed".into(),
            Self::DiscriminatorMappingChanged => "discriminator-mapping-changed".into(),
        }
    }

    /// Message fragment; placeholders are relative to the finding's own arguments
    pub fn phrase(&self) -> String {
        match self {
            Self::TypeChanged { generalized: false } => "type changed from '{0}' to '{1}'".into(),
            Self::TypeChanged { generalized: true } => "type generalized from '{0}' to '{1}'".into(),
            Self::FormatChanged { generalized: false } => "format changed from '{0}' to '{1}'".into(),
            Self::FormatChanged { generalized: true } => "format generalized from '{0}' to '{1}'".into(),
            Self::EnumValueAdded => "had the enum value '{0}' added".into(),
            Self::EnumValueRemoved => "had the enum value '{0}' removed".into(),
            Self::BecameNullable => "became nullable".into(),
            Self::BecameNotNullable => "became not nullable".into(),
            Self::PatternAdded => "had the pattern '{0}' added".into(),
            Self::PatternChanged => "pattern changed from '{0}' to '{1}'".into(),
            Self::PatternRemoved => "had the pattern '{0}' removed".into(),
            Self::DefaultValueAdded => "had the default value '{0}' added".into(),
            Self::DefaultValueChanged => "default value changed from '{0}' to '{1}'".into(),
            Self::DefaultValueRemoved => "had the default value '{0}' removed".into(),
            Self::BoundSet(b) => format!("{} was set to '{{0}}'", b.label()),
            Self::BoundRemoved(b) => format!("had the {} '{{0}}' removed", b.label()),
            Self::BoundIncreased(b) => format!("{} was increased from '{{0}}' to '{{1}}'", b.label()),
            Self::BoundDecreased(b) => format!("{} was decreased from '{{0}}' to '{{1}}'", b.label()),
            Self::BecameRequired { with_default: false } => "became required".into(),
            Self::BecameRequired { with_default: true } => "became required (it has a default value)".into(),
            Self::BecameOptional => "became optional".into(),
            Self::Added { required: true, with_default: false } => "was added as required".into(),
            Self::Added { required: true, with_default: true } => {
                "was added as required (it has a default value)".into()
            }
            Self::Added { required: false, .. } => "was added as optional".into(),
            Self::Removed => "was removed".into(),
            Self::VariantAdded(k) => format!("had the {} subschema '{{0}}' added", k.keyword()),
            Self::VariantRemoved(k) => format!("had the {} subschema '{{0}}' removed", k.keyword()),
            Self::DiscriminatorAdded => "had a discriminator added".into(),
            Self::DiscriminatorRemoved => "had its discriminator removed".into(),
            Self::DiscriminatorPropertyChanged => {
                "discriminator property name changed from '{0}' to '{1}'".into()
            }
            Self::DiscriminatorMappingChanged => {
                "discriminator mapping changed (added: '{0}', removed: '{1}')".into()
            }
        }
    }

    /// How this finding moves the value space
    pub fn effect(&self) -> Effect {
        match self {
            Self::TypeChanged { generalized } | Self::FormatChanged { generalized } => {
                if *generalized {
                    Effect::Fixed(Level::Info)
                } else {
                    Effect::Fixed(Level::Err)
                }
            }
            Self::EnumValueAdded => Effect::Fixed(Level::Info),
            Self::EnumValueRemoved => Effect::Fixed(Level::Err),
            Self::BecameNullable => Effect::Widens,
            Self::BecameNotNullable => Effect::Narrows,
            Self::PatternAdded => Effect::Narrows,
            Self::PatternChanged => Effect::PerSide { request: Level::Warn, response: Level::Info },
            Self::PatternRemoved => Effect::Fixed(Level::Info),
            Self::DefaultValueAdded => Effect::Fixed(Level::Info),
            Self::DefaultValueChanged | Self::DefaultValueRemoved => {
                Effect::PerSide { request: Level::Warn, response: Level::Info }
            }
            Self::BoundSet(_) => Effect::Narrows,
            Self::BoundRemoved(_) => Effect::Widens,
            Self::BoundIncreased(b) => {
                if b.is_upper() {
                    Effect::Widens
                } else {
                    Effect::Narrows
                }
            }
            Self::BoundDecreased(b) => {
                if b.is_upper() {
                    Effect::Narrows
                } else {
                    Effect::Widens
                }
            }
            Self::BecameRequired { with_default: false } => Effect::Narrows,
            Self::BecameRequired { with_default: true } => Effect::Fixed(Level::Info),
            Self::BecameOptional => Effect::Widens,
            Self::Added { required: true, with_default: false } => Effect::Narrows,
            Self::Added { .. } => Effect::Fixed(Level::Info),
            Self::Removed => Effect::PerSide { request: Level::Warn, response: Level::Err },
            Self::VariantAdded(VariantKind::AllOf) => Effect::Narrows,
            Self::VariantAdded(_) => Effect::Widens,
            Self::VariantRemoved(VariantKind::AllOf) => Effect::Widens,
            Self::VariantRemoved(_) => Effect::Narrows,
            Self::DiscriminatorAdded | Self::DiscriminatorRemoved | Self::DiscriminatorMappingChanged => {
                Effect::Fixed(Level::Warn)
            }
            Self::DiscriminatorPropertyChanged => Effect::Fixed(Level::Err),
        }
    }

    /// Whether the finding runs when only breaking changes are requested
    pub fn participates(&self) -> bool {
        !matches!(
            self,
            Self::TypeChanged { generalized: true } | Self::FormatChanged { generalized: true }
        )
    }

    /// Presence findings for a response body are reported per status/media type instead
    pub fn applies_to(&self, location: Location) -> bool {
        match self {
            Self::Added { .. } | Self::Removed | Self::BecameRequired { .. } | Self::BecameOptional => {
                location != Location::ResponseBody
            }
            _ => true,
        }
    }

    /// Catalog id of this finding at `location`
    pub fn rule_id(&self, location: Location) -> String {
        format!("{}-{}", location.slug(), self.slug())
    }
}

/// Default level of `finding` at `location`
pub fn classify(finding: Finding, location: Location) -> Level {
    finding.effect().level(location.direction())
}

/// readOnly / writeOnly flags of a leaf
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    pub read_only: bool,
    pub write_only: bool,
}

impl Visibility {
    pub fn of(schema: &Schema) -> Self {
        Self {
            read_only: schema.read_only,
            write_only: schema.write_only,
        }
    }

    /// A readOnly leaf never travels in a request; a writeOnly leaf never in a response
    pub fn excludes(&self, direction: Direction) -> bool {
        match direction {
            Direction::Request => self.read_only,
            Direction::Response => self.write_only,
        }
    }
}

/// A (type, format) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFormat<'a> {
    pub schema_type: Option<&'a str>,
    pub format: Option<&'a str>,
}

impl<'a> TypeFormat<'a> {
    pub fn new(schema_type: Option<&'a str>, format: Option<&'a str>) -> Self {
        Self { schema_type, format }
    }
}

/// Whether `from → to` only widens the accepted value space
fn generalizes(from: TypeFormat<'_>, to: TypeFormat<'_>) -> bool {
    match (from.schema_type, to.schema_type) {
        (Some("integer"), Some("number")) => true,
        (Some(f), Some("string")) if f != "string" => true,
        (Some(f), Some(t)) if f != t => false,
        (from_type, to_type) => match (from.format, to.format) {
            (Some("int32"), Some("int64")) => true,
            (Some("int32" | "int64"), Some("bigint")) => true,
            (Some("float"), Some("double")) => true,
            (Some("date" | "time"), Some("date-time")) => to_type.or(from_type) == Some("string"),
            _ => false,
        },
    }
}

/// Whether a type/format transition is safe for the given direction
///
/// Requests may only generalize; responses may only specialize, so the
/// allowlist is applied in reverse.
pub fn type_transition_allowed(direction: Direction, from: TypeFormat<'_>, to: TypeFormat<'_>) -> bool {
    match direction {
        Direction::Request => generalizes(from, to),
        Direction::Response => generalizes(to, from),
    }
}

/// A pattern that accepts any string
pub fn is_match_all_pattern(pattern: &str) -> bool {
    pattern == ".*"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tf<'a>(t: &'a str, f: Option<&'a str>) -> TypeFormat<'a> {
        TypeFormat::new(Some(t), f)
    }

    #[test]
    fn bounds_are_inverted_between_directions() {
        let loosened = Finding::BoundIncreased(Bound::MaxLength);
        assert_eq!(classify(loosened, Location::ResponseProperty), Level::Err);
        assert_eq!(classify(loosened, Location::RequestParameter), Level::Info);

        let tightened = Finding::BoundIncreased(Bound::MinLength);
        assert_eq!(classify(tightened, Location::RequestProperty), Level::Err);
        assert_eq!(classify(tightened, Location::ResponseProperty), Level::Info);

        assert_eq!(classify(Finding::BoundSet(Bound::Max), Location::RequestBody), Level::Err);
        assert_eq!(classify(Finding::BoundRemoved(Bound::MaxItems), Location::ResponseBody), Level::Err);
        assert_eq!(classify(Finding::BoundRemoved(Bound::MaxItems), Location::RequestBody), Level::Info);
    }

    #[test]
    fn required_transitions() {
        let plain = Finding::BecameRequired { with_default: false };
        let with_default = Finding::BecameRequired { with_default: true };
        assert_eq!(classify(plain, Location::RequestProperty), Level::Err);
        assert_eq!(classify(with_default, Location::RequestProperty), Level::Info);
        assert_ne!(plain.rule_id(Location::RequestProperty), with_default.rule_id(Location::RequestProperty));

        assert_eq!(classify(Finding::BecameOptional, Location::ResponseProperty), Level::Err);
        assert_eq!(classify(Finding::BecameOptional, Location::RequestProperty), Level::Info);
    }

    #[test]
    fn added_normalises_default_flag() {
        assert_eq!(
            Finding::added(false, true),
            Finding::Added { required: false, with_default: false }
        );
        assert_eq!(classify(Finding::added(true, false), Location::RequestProperty), Level::Err);
        assert_eq!(classify(Finding::added(true, true), Location::RequestProperty), Level::Info);
        assert_eq!(classify(Finding::added(false, false), Location::ResponseProperty), Level::Info);
    }

    #[test]
    fn enum_changes_are_not_inverted() {
        assert_eq!(classify(Finding::EnumValueRemoved, Location::RequestProperty), Level::Err);
        assert_eq!(classify(Finding::EnumValueRemoved, Location::ResponseProperty), Level::Err);
        assert_eq!(classify(Finding::EnumValueAdded, Location::ResponseProperty), Level::Info);
    }

    #[test]
    fn removal_levels() {
        assert_eq!(classify(Finding::Removed, Location::RequestProperty), Level::Warn);
        assert_eq!(classify(Finding::Removed, Location::ResponseProperty), Level::Err);
    }

    #[test]
    fn type_allowlist() {
        let req = Direction::Request;
        assert!(type_transition_allowed(req, tf("integer", None), tf("number", None)));
        assert!(type_transition_allowed(req, tf("boolean", None), tf("string", None)));
        assert!(type_transition_allowed(req, tf("integer", Some("int32")), tf("integer", Some("int64"))));
        assert!(type_transition_allowed(req, tf("integer", Some("int64")), tf("integer", Some("bigint"))));
        assert!(type_transition_allowed(req, tf("number", Some("float")), tf("number", Some("double"))));
        assert!(type_transition_allowed(req, tf("string", Some("date")), tf("string", Some("date-time"))));

        assert!(!type_transition_allowed(req, tf("string", None), tf("integer", None)));
        assert!(!type_transition_allowed(req, tf("number", None), tf("integer", None)));
        assert!(!type_transition_allowed(req, tf("integer", Some("int64")), tf("integer", Some("int32"))));
        assert!(!type_transition_allowed(req, tf("integer", Some("date")), tf("integer", Some("date-time"))));
    }

    #[test]
    fn format_allowlist_without_types() {
        let req = Direction::Request;
        let untyped = |f| TypeFormat::new(None, Some(f));

        assert!(type_transition_allowed(req, untyped("int32"), untyped("int64")));
        assert!(type_transition_allowed(req, untyped("int64"), untyped("bigint")));
        assert!(type_transition_allowed(req, untyped("float"), untyped("double")));
        assert!(!type_transition_allowed(req, untyped("int64"), untyped("int32")));

        // date-time widening needs a known string type
        assert!(!type_transition_allowed(req, untyped("date"), untyped("date-time")));
        assert!(type_transition_allowed(
            req,
            TypeFormat::new(None, Some("date")),
            TypeFormat::new(Some("string"), Some("date-time"))
        ));
    }

    #[test]
    fn response_allowlist_is_reversed() {
        let resp = Direction::Response;
        assert!(type_transition_allowed(resp, tf("number", None), tf("integer", None)));
        assert!(!type_transition_allowed(resp, tf("integer", None), tf("number", None)));
    }

    #[test]
    fn visibility_exclusion() {
        let read_only = Visibility { read_only: true, write_only: false };
        assert!(read_only.excludes(Direction::Request));
        assert!(!read_only.excludes(Direction::Response));

        let write_only = Visibility { read_only: false, write_only: true };
        assert!(write_only.excludes(Direction::Response));
        assert!(!write_only.excludes(Direction::Request));
    }

    #[test]
    fn findings_have_distinct_slugs() {
        let all = Finding::all();
        let slugs: std::collections::BTreeSet<String> = all.iter().map(Finding::slug).collect();
        assert_eq!(slugs.len(), all.len());
    }

    #[test]
    fn generalizations_do_not_participate() {
        assert!(!Finding::TypeChanged { generalized: true }.participates());
        assert!(Finding::TypeChanged { generalized: false }.participates());
        assert!(Finding::BoundIncreased(Bound::MaxLength).participates());
    }
}

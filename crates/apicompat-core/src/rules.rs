//! Rule catalog (v1)
//!
//! One entry per distinct change id. Schema-level rules are generated from
//! the classification policy for every location, so the catalog and the
//! policy cannot drift apart. Endpoint, security and component rules are
//! listed explicitly below.
//!
//! These ids are STABLE. Do NOT rename or remove entries - only add new ones.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::change::Level;
use crate::policy::{Finding, Location};

/// Ids of the rules that are not generated from the schema policy
pub mod ids {
    pub const ENDPOINT_ADDED: &str = "endpoint-added";
    pub const ENDPOINT_DEPRECATED: &str = "endpoint-deprecated";
    pub const ENDPOINT_REACTIVATED: &str = "endpoint-reactivated";

    pub const API_PATH_REMOVED_WITHOUT_DEPRECATION: &str = "api-path-removed-without-deprecation";
    pub const API_PATH_REMOVED_BEFORE_SUNSET: &str = "api-path-removed-before-sunset";
    pub const API_PATH_SUNSET_PARSE: &str = "api-path-sunset-parse";
    pub const API_REMOVED_WITHOUT_DEPRECATION: &str = "api-removed-without-deprecation";
    pub const API_REMOVED_BEFORE_SUNSET: &str = "api-removed-before-sunset";
    pub const API_SUNSET_PARSE: &str = "api-sunset-parse";

    pub const API_DEPRECATED_SUNSET_MISSING: &str = "api-deprecated-sunset-missing";
    pub const API_DEPRECATED_SUNSET_PARSE: &str = "api-deprecated-sunset-parse";
    pub const API_SUNSET_DATE_TOO_SMALL: &str = "api-sunset-date-too-small";
    pub const API_SUNSET_DATE_CHANGED_TOO_SMALL: &str = "api-sunset-date-changed-too-small";
    pub const API_INVALID_STABILITY_LEVEL: &str = "api-invalid-stability-level";
    pub const API_STABILITY_DECREASED: &str = "api-stability-decreased";

    pub const API_OPERATION_ID_ADDED: &str = "api-operation-id-added";
    pub const API_OPERATION_ID_REMOVED: &str = "api-operation-id-removed";
    pub const API_OPERATION_ID_CHANGED: &str = "api-operation-id-changed";
    pub const API_TAG_ADDED: &str = "api-tag-added";
    pub const API_TAG_REMOVED: &str = "api-tag-removed";

    pub const REQUEST_BODY_MEDIA_TYPE_ADDED: &str = "request-body-media-type-added";
    pub const REQUEST_BODY_MEDIA_TYPE_REMOVED: &str = "request-body-media-type-removed";

    pub const RESPONSE_SUCCESS_STATUS_ADDED: &str = "response-success-status-added";
    pub const RESPONSE_SUCCESS_STATUS_REMOVED: &str = "response-success-status-removed";
    pub const RESPONSE_NON_SUCCESS_STATUS_ADDED: &str = "response-non-success-status-added";
    pub const RESPONSE_NON_SUCCESS_STATUS_REMOVED: &str = "response-non-success-status-removed";
    pub const RESPONSE_MEDIA_TYPE_ADDED: &str = "response-media-type-added";
    pub const RESPONSE_MEDIA_TYPE_REMOVED: &str = "response-media-type-removed";

    pub const API_SECURITY_ADDED: &str = "api-security-added";
    pub const API_SECURITY_REMOVED: &str = "api-security-removed";
    pub const API_SECURITY_SCOPE_ADDED: &str = "api-security-scope-added";
    pub const API_SECURITY_SCOPE_REMOVED: &str = "api-security-scope-removed";

    pub const API_GLOBAL_SECURITY_ADDED: &str = "api-global-security-added";
    pub const API_GLOBAL_SECURITY_REMOVED: &str = "api-global-security-removed";
    pub const API_GLOBAL_SECURITY_SCOPE_ADDED: &str = "api-global-security-scope-added";
    pub const API_GLOBAL_SECURITY_SCOPE_REMOVED: &str = "api-global-security-scope-removed";

    pub const API_SECURITY_COMPONENT_ADDED: &str = "api-security-component-added";
    pub const API_SECURITY_COMPONENT_REMOVED: &str = "api-security-component-removed";
    pub const API_SECURITY_COMPONENT_TYPE_CHANGED: &str = "api-security-component-type-changed";
    pub const API_SECURITY_COMPONENT_OAUTH_TOKEN_URL_CHANGED: &str =
        "api-security-component-oauth-token-url-changed";
    pub const API_SECURITY_COMPONENT_OAUTH_SCOPE_ADDED: &str = "api-security-component-oauth-scope-added";
    pub const API_SECURITY_COMPONENT_OAUTH_SCOPE_REMOVED: &str = "api-security-component-oauth-scope-removed";
}

/// (id, level, participates, template)
const FIXED_RULES: &[(&str, Level, bool, &str)] = &[
    (ids::ENDPOINT_ADDED, Level::Info, false, "endpoint added"),
    (ids::ENDPOINT_DEPRECATED, Level::Info, true, "endpoint deprecated"),
    (ids::ENDPOINT_REACTIVATED, Level::Info, true, "endpoint reactivated"),
    (
        ids::API_PATH_REMOVED_WITHOUT_DEPRECATION,
        Level::Err,
        true,
        "api path removed without deprecation",
    ),
    (
        ids::API_PATH_REMOVED_BEFORE_SUNSET,
        Level::Err,
        true,
        "api path removed before the sunset date '{0}'",
    ),
    (
        ids::API_PATH_SUNSET_PARSE,
        Level::Err,
        true,
        "api path removed but its sunset date '{0}' could not be parsed",
    ),
    (
        ids::API_REMOVED_WITHOUT_DEPRECATION,
        Level::Err,
        true,
        "api removed without deprecation",
    ),
    (
        ids::API_REMOVED_BEFORE_SUNSET,
        Level::Err,
        true,
        "api removed before the sunset date '{0}'",
    ),
    (
        ids::API_SUNSET_PARSE,
        Level::Err,
        true,
        "api removed but its sunset date '{0}' could not be parsed",
    ),
    (
        ids::API_DEPRECATED_SUNSET_MISSING,
        Level::Err,
        true,
        "api deprecated without a sunset date",
    ),
    (
        ids::API_DEPRECATED_SUNSET_PARSE,
        Level::Err,
        true,
        "api deprecated with a sunset date '{0}' that could not be parsed",
    ),
    (
        ids::API_SUNSET_DATE_TOO_SMALL,
        Level::Err,
        true,
        "api sunset date '{0}' is too soon, it must be at least '{1}' days from now",
    ),
    (
        ids::API_SUNSET_DATE_CHANGED_TOO_SMALL,
        Level::Err,
        true,
        "api sunset date changed from '{0}' to '{1}', the new date must be at least '{2}' days from now",
    ),
    (
        ids::API_INVALID_STABILITY_LEVEL,
        Level::Err,
        true,
        "api stability level '{0}' is not one of draft, alpha, beta, stable",
    ),
    (
        ids::API_STABILITY_DECREASED,
        Level::Err,
        true,
        "api stability level decreased from '{0}' to '{1}'",
    ),
    (ids::API_OPERATION_ID_ADDED, Level::Info, false, "api operation id '{0}' was added"),
    (ids::API_OPERATION_ID_REMOVED, Level::Warn, false, "api operation id '{0}' was removed"),
    (
        ids::API_OPERATION_ID_CHANGED,
        Level::Warn,
        false,
        "api operation id changed from '{0}' to '{1}'",
    ),
    (ids::API_TAG_ADDED, Level::Info, false, "api tag '{0}' was added"),
    (ids::API_TAG_REMOVED, Level::Warn, false, "api tag '{0}' was removed"),
    (
        ids::REQUEST_BODY_MEDIA_TYPE_ADDED,
        Level::Info,
        true,
        "the media type '{0}' was added to the request body",
    ),
    (
        ids::REQUEST_BODY_MEDIA_TYPE_REMOVED,
        Level::Err,
        true,
        "the media type '{0}' was removed from the request body",
    ),
    (
        ids::RESPONSE_SUCCESS_STATUS_ADDED,
        Level::Info,
        true,
        "the success response with status '{0}' was added",
    ),
    (
        ids::RESPONSE_SUCCESS_STATUS_REMOVED,
        Level::Err,
        true,
        "the success response with status '{0}' was removed",
    ),
    (
        ids::RESPONSE_NON_SUCCESS_STATUS_ADDED,
        Level::Info,
        true,
        "the non-success response with status '{0}' was added",
    ),
    (
        ids::RESPONSE_NON_SUCCESS_STATUS_REMOVED,
        Level::Warn,
        false,
        "the non-success response with status '{0}' was removed",
    ),
    (
        ids::RESPONSE_MEDIA_TYPE_ADDED,
        Level::Info,
        true,
        "the media type '{0}' was added to the response with status '{1}'",
    ),
    (
        ids::RESPONSE_MEDIA_TYPE_REMOVED,
        Level::Err,
        true,
        "the media type '{0}' was removed from the response with status '{1}'",
    ),
    (
        ids::API_SECURITY_ADDED,
        Level::Info,
        true,
        "the endpoint security requirement '{0}' was added",
    ),
    (
        ids::API_SECURITY_REMOVED,
        Level::Warn,
        true,
        "the endpoint security requirement '{0}' was removed",
    ),
    (
        ids::API_SECURITY_SCOPE_ADDED,
        Level::Warn,
        true,
        "the security scope '{1}' was added to the endpoint security requirement '{0}'",
    ),
    (
        ids::API_SECURITY_SCOPE_REMOVED,
        Level::Info,
        true,
        "the security scope '{1}' was removed from the endpoint security requirement '{0}'",
    ),
    (
        ids::API_GLOBAL_SECURITY_ADDED,
        Level::Info,
        true,
        "the global security requirement '{0}' was added",
    ),
    (
        ids::API_GLOBAL_SECURITY_REMOVED,
        Level::Warn,
        true,
        "the global security requirement '{0}' was removed",
    ),
    (
        ids::API_GLOBAL_SECURITY_SCOPE_ADDED,
        Level::Warn,
        true,
        "the security scope '{1}' was added to the global security requirement '{0}'",
    ),
    (
        ids::API_GLOBAL_SECURITY_SCOPE_REMOVED,
        Level::Info,
        true,
        "the security scope '{1}' was removed from the global security requirement '{0}'",
    ),
    (
        ids::API_SECURITY_COMPONENT_ADDED,
        Level::Info,
        true,
        "the component security scheme '{0}' was added",
    ),
    (
        ids::API_SECURITY_COMPONENT_REMOVED,
        Level::Warn,
        true,
        "the component security scheme '{0}' was removed",
    ),
    (
        ids::API_SECURITY_COMPONENT_TYPE_CHANGED,
        Level::Err,
        true,
        "the component security scheme '{0}' type changed from '{1}' to '{2}'",
    ),
    (
        ids::API_SECURITY_COMPONENT_OAUTH_TOKEN_URL_CHANGED,
        Level::Warn,
        true,
        "the component security scheme '{0}' oauth token url changed from '{1}' to '{2}'",
    ),
    (
        ids::API_SECURITY_COMPONENT_OAUTH_SCOPE_ADDED,
        Level::Info,
        true,
        "the oauth scope '{1}' was added to the component security scheme '{0}'",
    ),
    (
        ids::API_SECURITY_COMPONENT_OAUTH_SCOPE_REMOVED,
        Level::Warn,
        true,
        "the oauth scope '{1}' was removed from the component security scheme '{0}'",
    ),
];

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Stable id
    pub id: String,

    /// Default level, before config overrides
    pub level: Level,

    /// Whether the rule runs when only breaking changes are requested
    pub participates: bool,

    /// Message template with `{n}` placeholders
    pub template: String,
}

/// Immutable registry of every rule
#[derive(Debug)]
pub struct RuleCatalog {
    rules: BTreeMap<String, Rule>,
}

impl RuleCatalog {
    fn build() -> Self {
        let mut rules = BTreeMap::new();

        for (id, level, participates, template) in FIXED_RULES {
            rules.insert(
                id.to_string(),
                Rule {
                    id: id.to_string(),
                    level: *level,
                    participates: *participates,
                    template: template.to_string(),
                },
            );
        }

        for location in Location::ALL {
            let (subject, arity) = location.subject();
            for finding in Finding::all() {
                if !finding.applies_to(location) {
                    continue;
                }
                let id = finding.rule_id(location);
                let template = format!("{} {}", subject, shift_placeholders(&finding.phrase(), arity));
                rules.insert(
                    id.clone(),
                    Rule {
                        id,
                        level: finding.effect().level(location.direction()),
                        participates: finding.participates(),
                        template,
                    },
                );
            }
        }

        Self { rules }
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Rules ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// The process-wide catalog, built on first use
pub fn catalog() -> &'static RuleCatalog {
    static CATALOG: OnceLock<RuleCatalog> = OnceLock::new();
    CATALOG.get_or_init(RuleCatalog::build)
}

/// Matches `{n}` message placeholders
pub(crate) fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern is valid"))
}

/// Renumber `{n}` placeholders to `{n + offset}`
fn shift_placeholders(template: &str, offset: usize) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let index: usize = caps[1].parse().unwrap_or(0);
            format!("{{{}}}", index + offset)
        })
        .into_owned()
}

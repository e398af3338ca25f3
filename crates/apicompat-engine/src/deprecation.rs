//! Deprecation and sunset policy
//!
//! Decides whether removing an operation is acceptable, and checks that a
//! newly announced deprecation leaves clients enough time.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use apicompat_core::diff::{Operation, OperationDiff};
use apicompat_core::rules::ids;
use apicompat_core::DeprecationConfig;

/// Extension holding the sunset date
pub const SUNSET_EXTENSION: &str = "x-sunset";

/// Extension holding the stability level
pub const STABILITY_EXTENSION: &str = "x-stability-level";

/// Whether a whole path or a single operation disappeared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalScope {
    Path,
    Operation,
}

/// A check outcome: change id plus message arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub id: &'static str,
    pub args: Vec<String>,
}

impl Verdict {
    fn new(id: &'static str, args: Vec<String>) -> Self {
        Self { id, args }
    }
}

/// The sunset date an operation declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sunset {
    Missing,
    Invalid(String),
    Date(NaiveDate),
}

impl Sunset {
    pub fn of(operation: &Operation) -> Self {
        match operation.extension(SUNSET_EXTENSION) {
            None => Self::Missing,
            Some(Value::String(raw)) => parse_sunset(raw).map_or_else(|| Self::Invalid(raw.clone()), Self::Date),
            Some(other) => Self::Invalid(other.to_string()),
        }
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_sunset(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Maturity of an operation, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stability {
    Draft,
    Alpha,
    Beta,
    Stable,
}

impl Stability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Stable => "stable",
        }
    }

    /// Declared stability; operations without the extension are stable
    pub fn of(operation: &Operation) -> Result<Self, String> {
        match operation.extension(STABILITY_EXTENSION) {
            None => Ok(Self::Stable),
            Some(Value::String(raw)) => raw.parse(),
            Some(other) => Err(other.to_string()),
        }
    }

    /// Minimum days between deprecation and sunset
    pub fn min_sunset_days(&self, config: &DeprecationConfig) -> i64 {
        match self {
            Self::Draft | Self::Alpha => 0,
            Self::Beta => config.min_sunset_beta_days,
            Self::Stable => config.min_sunset_stable_days,
        }
    }
}

impl std::str::FromStr for Stability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            "stable" => Ok(Self::Stable),
            other => Err(other.to_string()),
        }
    }
}

/// Judge the removal of `operation` (its base snapshot)
///
/// Returns `None` when the removal is accepted: the operation was deprecated
/// and `today` is strictly after its sunset date.
pub fn removal_verdict(scope: RemovalScope, operation: &Operation, today: NaiveDate) -> Option<Verdict> {
    let (without_deprecation, sunset_parse, before_sunset) = match scope {
        RemovalScope::Path => (
            ids::API_PATH_REMOVED_WITHOUT_DEPRECATION,
            ids::API_PATH_SUNSET_PARSE,
            ids::API_PATH_REMOVED_BEFORE_SUNSET,
        ),
        RemovalScope::Operation => (
            ids::API_REMOVED_WITHOUT_DEPRECATION,
            ids::API_SUNSET_PARSE,
            ids::API_REMOVED_BEFORE_SUNSET,
        ),
    };

    if !operation.deprecated {
        return Some(Verdict::new(without_deprecation, vec![]));
    }

    match Sunset::of(operation) {
        Sunset::Missing => Some(Verdict::new(sunset_parse, vec![String::new()])),
        Sunset::Invalid(raw) => Some(Verdict::new(sunset_parse, vec![raw])),
        Sunset::Date(sunset) if today <= sunset => Some(Verdict::new(before_sunset, vec![sunset.to_string()])),
        Sunset::Date(_) => None,
    }
}

/// Deprecation-announcement checks for an operation present on both sides
pub fn announcement_verdicts(diff: &OperationDiff, config: &DeprecationConfig, today: NaiveDate) -> Vec<Verdict> {
    let mut verdicts = Vec::new();
    let base = &diff.base;
    let revision = &diff.revision;

    let base_stability = Stability::of(base);
    let stability = match Stability::of(revision) {
        Ok(stability) => Some(stability),
        Err(raw) => {
            let newly_deprecated = revision.deprecated && !base.deprecated;
            let changed = base.extension(STABILITY_EXTENSION) != revision.extension(STABILITY_EXTENSION);
            if newly_deprecated || changed {
                verdicts.push(Verdict::new(ids::API_INVALID_STABILITY_LEVEL, vec![raw]));
            }
            None
        }
    };

    if let (Some(after), Ok(before)) = (stability, base_stability) {
        if after < before {
            verdicts.push(Verdict::new(
                ids::API_STABILITY_DECREASED,
                vec![before.as_str().to_string(), after.as_str().to_string()],
            ));
        }
    }

    // An unreadable level falls back to the strictest window
    let window = stability.unwrap_or(Stability::Stable).min_sunset_days(config);

    match (base.deprecated, revision.deprecated) {
        // Announcing under an invalid level is already reported above
        (false, true) => {
            if stability.is_some() {
                verdicts.push(announcement(Sunset::of(revision), window, today));
            }
        }
        (true, false) => verdicts.push(Verdict::new(ids::ENDPOINT_REACTIVATED, vec![])),
        (true, true) => {
            if let (Sunset::Date(before), Sunset::Date(after)) = (Sunset::of(base), Sunset::of(revision)) {
                if after < before && (after - today).num_days() < window {
                    verdicts.push(Verdict::new(
                        ids::API_SUNSET_DATE_CHANGED_TOO_SMALL,
                        vec![before.to_string(), after.to_string(), window.to_string()],
                    ));
                }
            }
        }
        (false, false) => {}
    }

    verdicts
}

fn announcement(sunset: Sunset, window: i64, today: NaiveDate) -> Verdict {
    match sunset {
        Sunset::Missing if window > 0 => Verdict::new(ids::API_DEPRECATED_SUNSET_MISSING, vec![]),
        Sunset::Missing => Verdict::new(ids::ENDPOINT_DEPRECATED, vec![]),
        Sunset::Invalid(raw) => Verdict::new(ids::API_DEPRECATED_SUNSET_PARSE, vec![raw]),
        Sunset::Date(date) if (date - today).num_days() < window => Verdict::new(
            ids::API_SUNSET_DATE_TOO_SMALL,
            vec![date.to_string(), window.to_string()],
        ),
        Sunset::Date(_) => Verdict::new(ids::ENDPOINT_DEPRECATED, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn operation(deprecated: bool, extensions: &[(&str, Value)]) -> Operation {
        Operation {
            deprecated,
            extensions: extensions.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ..Operation::default()
        }
    }

    fn sunset_in(days: i64) -> Value {
        json!((today() + Duration::days(days)).to_string())
    }

    fn ids_of(verdicts: &[Verdict]) -> Vec<&'static str> {
        verdicts.iter().map(|v| v.id).collect()
    }

    #[test]
    fn parses_plain_and_rfc3339_dates() {
        assert_eq!(parse_sunset("2024-12-31"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_sunset("2024-12-31T10:00:00Z"), NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(parse_sunset("next tuesday"), None);
    }

    #[test]
    fn removal_without_deprecation() {
        let verdict = removal_verdict(RemovalScope::Operation, &operation(false, &[]), today());
        assert_eq!(verdict.map(|v| v.id), Some(ids::API_REMOVED_WITHOUT_DEPRECATION));

        let verdict = removal_verdict(RemovalScope::Path, &operation(false, &[]), today());
        assert_eq!(verdict.map(|v| v.id), Some(ids::API_PATH_REMOVED_WITHOUT_DEPRECATION));
    }

    #[test]
    fn removal_with_missing_or_bad_sunset() {
        let missing = removal_verdict(RemovalScope::Operation, &operation(true, &[]), today());
        assert_eq!(missing.map(|v| v.id), Some(ids::API_SUNSET_PARSE));

        let bad = removal_verdict(
            RemovalScope::Operation,
            &operation(true, &[(SUNSET_EXTENSION, json!("soon"))]),
            today(),
        );
        assert_eq!(bad, Some(Verdict::new(ids::API_SUNSET_PARSE, vec!["soon".into()])));
    }

    #[test]
    fn removal_on_sunset_day_is_too_early() {
        let on_the_day = operation(true, &[(SUNSET_EXTENSION, sunset_in(0))]);
        let verdict = removal_verdict(RemovalScope::Operation, &on_the_day, today());
        assert_eq!(
            verdict,
            Some(Verdict::new(ids::API_REMOVED_BEFORE_SUNSET, vec!["2024-06-01".into()]))
        );

        let after = operation(true, &[(SUNSET_EXTENSION, sunset_in(-1))]);
        assert_eq!(removal_verdict(RemovalScope::Operation, &after, today()), None);
    }

    fn announce(base: Operation, revision: Operation) -> Vec<Verdict> {
        let diff = OperationDiff {
            base,
            revision,
            ..OperationDiff::default()
        };
        announcement_verdicts(&diff, &DeprecationConfig::default(), today())
    }

    #[test]
    fn deprecation_with_enough_notice() {
        let verdicts = announce(operation(false, &[]), operation(true, &[(SUNSET_EXTENSION, sunset_in(180))]));
        assert_eq!(ids_of(&verdicts), vec![ids::ENDPOINT_DEPRECATED]);
    }

    #[test]
    fn deprecation_windows_depend_on_stability() {
        let stable = announce(operation(false, &[]), operation(true, &[(SUNSET_EXTENSION, sunset_in(179))]));
        assert_eq!(
            stable,
            vec![Verdict::new(
                ids::API_SUNSET_DATE_TOO_SMALL,
                vec!["2024-11-27".into(), "180".into()]
            )]
        );

        let beta = [(STABILITY_EXTENSION, json!("beta"))];
        let beta_ok = announce(
            operation(false, &beta),
            operation(true, &[(STABILITY_EXTENSION, json!("beta")), (SUNSET_EXTENSION, sunset_in(31))]),
        );
        assert_eq!(ids_of(&beta_ok), vec![ids::ENDPOINT_DEPRECATED]);

        let draft = [(STABILITY_EXTENSION, json!("draft"))];
        let draft_no_sunset = announce(operation(false, &draft), operation(true, &draft));
        assert_eq!(ids_of(&draft_no_sunset), vec![ids::ENDPOINT_DEPRECATED]);
    }

    #[test]
    fn deprecation_sunset_problems() {
        let missing = announce(operation(false, &[]), operation(true, &[]));
        assert_eq!(ids_of(&missing), vec![ids::API_DEPRECATED_SUNSET_MISSING]);

        let bad = announce(operation(false, &[]), operation(true, &[(SUNSET_EXTENSION, json!(20240101))]));
        assert_eq!(ids_of(&bad), vec![ids::API_DEPRECATED_SUNSET_PARSE]);
    }

    #[test]
    fn invalid_stability_level() {
        let verdicts = announce(
            operation(false, &[]),
            operation(true, &[(STABILITY_EXTENSION, json!("experimental"))]),
        );
        assert_eq!(
            verdicts,
            vec![Verdict::new(ids::API_INVALID_STABILITY_LEVEL, vec!["experimental".into()])]
        );

        // Unchanged and not newly deprecated: nothing new to say
        let same = [(STABILITY_EXTENSION, json!("experimental"))];
        assert!(announce(operation(false, &same), operation(false, &same)).is_empty());
    }

    #[test]
    fn unchanged_invalid_stability_keeps_other_checks() {
        let invalid = (STABILITY_EXTENSION, json!("experimental"));

        let verdicts = announce(operation(true, &[invalid.clone()]), operation(false, &[invalid.clone()]));
        assert_eq!(ids_of(&verdicts), vec![ids::ENDPOINT_REACTIVATED]);

        let verdicts = announce(
            operation(true, &[invalid.clone(), (SUNSET_EXTENSION, sunset_in(200))]),
            operation(true, &[invalid, (SUNSET_EXTENSION, sunset_in(30))]),
        );
        assert_eq!(ids_of(&verdicts), vec![ids::API_SUNSET_DATE_CHANGED_TOO_SMALL]);
    }

    #[test]
    fn reactivation_and_stability_decrease() {
        let verdicts = announce(operation(true, &[]), operation(false, &[]));
        assert_eq!(ids_of(&verdicts), vec![ids::ENDPOINT_REACTIVATED]);

        let verdicts = announce(
            operation(false, &[(STABILITY_EXTENSION, json!("stable"))]),
            operation(false, &[(STABILITY_EXTENSION, json!("alpha"))]),
        );
        assert_eq!(
            verdicts,
            vec![Verdict::new(ids::API_STABILITY_DECREASED, vec!["stable".into(), "alpha".into()])]
        );
    }

    #[test]
    fn sunset_moved_earlier() {
        let verdicts = announce(
            operation(true, &[(SUNSET_EXTENSION, sunset_in(200))]),
            operation(true, &[(SUNSET_EXTENSION, sunset_in(30))]),
        );
        assert_eq!(ids_of(&verdicts), vec![ids::API_SUNSET_DATE_CHANGED_TOO_SMALL]);

        let later = announce(
            operation(true, &[(SUNSET_EXTENSION, sunset_in(30))]),
            operation(true, &[(SUNSET_EXTENSION, sunset_in(200))]),
        );
        assert!(later.is_empty());
    }
}

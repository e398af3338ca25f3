//! Document-wide security requirements and security scheme components

use apicompat_core::diff::{ComponentsDiff, SecurityRequirementsDiff};
use apicompat_core::rules::ids;

use crate::collector::Collector;

/// Component category of security schemes
pub const SECURITY_SCHEMES: &str = "securitySchemes";

pub(crate) fn check_global_security(collector: &mut Collector<'_>, diff: &SecurityRequirementsDiff) {
    for name in &diff.added {
        collector.security(ids::API_GLOBAL_SECURITY_ADDED, vec![name.clone()]);
    }
    for name in &diff.deleted {
        collector.security(ids::API_GLOBAL_SECURITY_REMOVED, vec![name.clone()]);
    }
    for (name, scopes) in &diff.modified {
        for scope in &scopes.added {
            collector.security(ids::API_GLOBAL_SECURITY_SCOPE_ADDED, vec![name.clone(), scope.clone()]);
        }
        for scope in &scopes.deleted {
            collector.security(ids::API_GLOBAL_SECURITY_SCOPE_REMOVED, vec![name.clone(), scope.clone()]);
        }
    }
}

pub(crate) fn check_components(collector: &mut Collector<'_>, diff: &ComponentsDiff) {
    let Some(schemes) = &diff.security_schemes else {
        return;
    };

    for name in &schemes.added {
        collector.component(SECURITY_SCHEMES, ids::API_SECURITY_COMPONENT_ADDED, vec![name.clone()]);
    }
    for name in &schemes.deleted {
        collector.component(SECURITY_SCHEMES, ids::API_SECURITY_COMPONENT_REMOVED, vec![name.clone()]);
    }

    for (name, scheme) in &schemes.modified {
        if let Some(diff) = scheme.scheme_type.as_ref().filter(|d| !d.is_empty()) {
            collector.component(
                SECURITY_SCHEMES,
                ids::API_SECURITY_COMPONENT_TYPE_CHANGED,
                vec![
                    name.clone(),
                    diff.from.clone().unwrap_or_default(),
                    diff.to.clone().unwrap_or_default(),
                ],
            );
        }

        if let Some(diff) = scheme.token_url.as_ref().filter(|d| !d.is_empty()) {
            collector.component(
                SECURITY_SCHEMES,
                ids::API_SECURITY_COMPONENT_OAUTH_TOKEN_URL_CHANGED,
                vec![
                    name.clone(),
                    diff.from.clone().unwrap_or_default(),
                    diff.to.clone().unwrap_or_default(),
                ],
            );
        }

        if let Some(scopes) = &scheme.scopes {
            for scope in &scopes.added {
                collector.component(
                    SECURITY_SCHEMES,
                    ids::API_SECURITY_COMPONENT_OAUTH_SCOPE_ADDED,
                    vec![name.clone(), scope.clone()],
                );
            }
            for scope in &scopes.deleted {
                collector.component(
                    SECURITY_SCHEMES,
                    ids::API_SECURITY_COMPONENT_OAUTH_SCOPE_REMOVED,
                    vec![name.clone(), scope.clone()],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicompat_core::diff::{SecuritySchemeDiff, SecuritySchemesDiff, SetDiff, ValueDiff};
    use apicompat_core::{ChangeRecord, Config, Level};

    #[test]
    fn global_security_records_have_no_endpoint() {
        let config = Config::default();
        let mut collector = Collector::new(&config);

        let mut diff = SecurityRequirementsDiff::default();
        diff.added.insert("oauth".into());
        diff.modified.insert(
            "api_key".into(),
            SetDiff {
                added: ["admin".to_string()].into_iter().collect(),
                deleted: Default::default(),
            },
        );
        check_global_security(&mut collector, &diff);

        let changes = collector.finish();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| matches!(c, ChangeRecord::Security(_))));
        assert!(changes.iter().all(|c| c.path().is_empty()));

        let scope = changes.iter().find(|c| c.id() == ids::API_GLOBAL_SECURITY_SCOPE_ADDED).unwrap();
        assert_eq!(scope.level(), Level::Warn);
        assert_eq!(scope.args(), ["api_key".to_string(), "admin".to_string()]);
    }

    #[test]
    fn security_scheme_components() {
        let config = Config::default();
        let mut collector = Collector::new(&config);

        let mut schemes = SecuritySchemesDiff::default();
        schemes.deleted.insert("basic".into());
        schemes.modified.insert(
            "petstore_auth".into(),
            SecuritySchemeDiff {
                scheme_type: Some(ValueDiff::changed("oauth2".into(), "apiKey".into())),
                token_url: None,
                scopes: Some(SetDiff {
                    added: Default::default(),
                    deleted: ["write:pets".to_string()].into_iter().collect(),
                }),
            },
        );
        check_components(
            &mut collector,
            &ComponentsDiff {
                security_schemes: Some(schemes),
            },
        );

        let changes = collector.finish();
        let found: Vec<(&str, Level)> = changes.iter().map(|c| (c.id(), c.level())).collect();
        assert_eq!(
            found,
            vec![
                (ids::API_SECURITY_COMPONENT_REMOVED, Level::Warn),
                (ids::API_SECURITY_COMPONENT_TYPE_CHANGED, Level::Err),
                (ids::API_SECURITY_COMPONENT_OAUTH_SCOPE_REMOVED, Level::Warn),
            ]
        );
        assert!(changes.iter().all(|c| matches!(c, ChangeRecord::Component(cc) if cc.component == SECURITY_SCHEMES)));
    }
}

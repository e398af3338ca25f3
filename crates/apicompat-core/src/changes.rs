//! Change aggregation
//!
//! A [`ChangeList`] is what one evaluation produces. Sorting is stable and
//! fully keyed so the same input always renders the same report.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::change::{ChangeRecord, Endpoint, Level};
use crate::localizer::{Localizer, TemplateLocalizer};

/// Histogram of changes per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl LevelCounts {
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Info => self.info,
            Level::Warn => self.warnings,
            Level::Err => self.errors,
        }
    }

    pub fn total(&self) -> usize {
        self.info + self.warnings + self.errors
    }

    fn add(&mut self, level: Level) {
        match level {
            Level::Info => self.info += 1,
            Level::Warn => self.warnings += 1,
            Level::Err => self.errors += 1,
        }
    }
}

/// Changes partitioned for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedChanges {
    /// Changes scoped to one endpoint, keyed by (path, method)
    pub endpoints: BTreeMap<Endpoint, Vec<ChangeRecord>>,

    /// Changes to reusable components
    pub components: Vec<ChangeRecord>,

    /// Changes to document-wide security requirements
    pub security: Vec<ChangeRecord>,
}

/// Ordered collection of classified changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeList {
    changes: Vec<ChangeRecord>,
}

impl ChangeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_changes(changes: Vec<ChangeRecord>) -> Self {
        Self { changes }
    }

    pub fn push(&mut self, change: ChangeRecord) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.changes.iter()
    }

    pub fn as_slice(&self) -> &[ChangeRecord] {
        &self.changes
    }

    pub fn into_vec(self) -> Vec<ChangeRecord> {
        self.changes
    }

    /// Keep only the changes matching `keep`
    pub fn retain(&mut self, keep: impl FnMut(&ChangeRecord) -> bool) {
        self.changes.retain(keep);
    }

    /// Whether any change is at `level` or above
    pub fn has_level_or_higher(&self, level: Level) -> bool {
        self.changes.iter().any(|c| c.level() >= level)
    }

    pub fn count_by_level(&self) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for change in &self.changes {
            counts.add(change.level());
        }
        counts
    }

    /// Sort using the catalog templates for message text
    pub fn sort(&mut self) {
        self.sort_with(&TemplateLocalizer);
    }

    /// Stable sort: level descending, then path, operation, id, text, comment
    pub fn sort_with(&mut self, localizer: &dyn Localizer) {
        self.changes.sort_by_cached_key(|c| {
            (
                Reverse(c.level()),
                c.path().to_string(),
                c.operation().to_string(),
                c.id().to_string(),
                c.text(localizer),
                c.comment().unwrap_or_default().to_string(),
            )
        });
    }

    /// Partition into endpoint, component and security buckets, keeping order
    pub fn group(&self) -> GroupedChanges {
        let mut grouped = GroupedChanges::default();

        for change in &self.changes {
            match change {
                ChangeRecord::Api(_) => {
                    if let Some(endpoint) = change.endpoint() {
                        grouped.endpoints.entry(endpoint).or_default().push(change.clone());
                    }
                }
                ChangeRecord::Component(_) => grouped.components.push(change.clone()),
                ChangeRecord::Security(_) => grouped.security.push(change.clone()),
            }
        }

        grouped
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Extend<ChangeRecord> for ChangeList {
    fn extend<I: IntoIterator<Item = ChangeRecord>>(&mut self, iter: I) {
        self.changes.extend(iter);
    }
}

impl FromIterator<ChangeRecord> for ChangeList {
    fn from_iter<I: IntoIterator<Item = ChangeRecord>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ChangeList {
    type Item = ChangeRecord;
    type IntoIter = std::vec::IntoIter<ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChangeList {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeCore;
    use pretty_assertions::assert_eq;

    fn api(id: &str, level: Level, path: &str, method: &str) -> ChangeRecord {
        ChangeRecord::api(
            ChangeCore::new(id, level, vec!["name".into()]),
            &Endpoint::new(path, method),
            None,
        )
    }

    fn sample() -> ChangeList {
        ChangeList::from_changes(vec![
            api("request-property-added-optional", Level::Info, "/pets", "post"),
            api("response-property-removed", Level::Err, "/users", "get"),
            ChangeRecord::security(ChangeCore::new("api-global-security-removed", Level::Warn, vec!["oauth".into()])),
            api("request-property-removed", Level::Warn, "/pets", "post"),
            api("response-property-removed", Level::Err, "/pets", "get"),
            ChangeRecord::component(
                ChangeCore::new("api-security-component-added", Level::Info, vec!["key".into()]),
                "securitySchemes",
            ),
        ])
    }

    #[test]
    fn empty_list() {
        let list = ChangeList::new();
        assert!(list.is_empty());
        assert_eq!(list.count_by_level().total(), 0);
        assert!(!list.has_level_or_higher(Level::Info));
    }

    #[test]
    fn counts_by_level() {
        let counts = sample().count_by_level();
        assert_eq!(counts.errors, 2);
        assert_eq!(counts.warnings, 2);
        assert_eq!(counts.info, 2);
        assert_eq!(counts.get(Level::Err), 2);
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn has_level_or_higher_is_monotonic() {
        let warn_only = ChangeList::from_changes(vec![api("request-property-removed", Level::Warn, "/a", "get")]);
        assert!(warn_only.has_level_or_higher(Level::Info));
        assert!(warn_only.has_level_or_higher(Level::Warn));
        assert!(!warn_only.has_level_or_higher(Level::Err));

        let list = sample();
        let mut previous = true;
        for level in Level::ALL {
            let current = list.has_level_or_higher(level);
            assert!(previous || !current, "gating must not re-open at a higher threshold");
            previous = current;
        }
    }

    #[test]
    fn sort_orders_by_level_then_path() {
        let mut list = sample();
        list.sort();

        let keys: Vec<(Level, &str, &str, &str)> = list
            .iter()
            .map(|c| (c.level(), c.path(), c.operation(), c.id()))
            .collect();

        assert_eq!(
            keys,
            vec![
                (Level::Err, "/pets", "GET", "response-property-removed"),
                (Level::Err, "/users", "GET", "response-property-removed"),
                (Level::Warn, "", "", "api-global-security-removed"),
                (Level::Warn, "/pets", "POST", "request-property-removed"),
                (Level::Info, "", "", "api-security-component-added"),
                (Level::Info, "/pets", "POST", "request-property-added-optional"),
            ]
        );
    }

    #[test]
    fn sort_is_order_independent() {
        let mut forward = sample();
        let mut backward = ChangeList::from_changes(sample().into_vec().into_iter().rev().collect());
        forward.sort();
        backward.sort();
        assert_eq!(forward, backward);
    }

    #[test]
    fn sort_breaks_ties_on_text_and_comment() {
        let endpoint = Endpoint::new("/pets", "post");
        let make = |arg: &str, comment: &str| {
            ChangeRecord::api(
                ChangeCore::new("request-property-removed", Level::Warn, vec![arg.into()]),
                &endpoint,
                None,
            )
            .with_comment(Some(comment.into()))
        };

        let mut list = ChangeList::from_changes(vec![
            make("b", "media type 'application/xml'"),
            make("a", "media type 'application/xml'"),
            make("a", "media type 'application/json'"),
        ]);
        list.sort();

        let order: Vec<(&str, Option<&str>)> = list.iter().map(|c| (c.args()[0].as_str(), c.comment())).collect();
        assert_eq!(
            order,
            vec![
                ("a", Some("media type 'application/json'")),
                ("a", Some("media type 'application/xml'")),
                ("b", Some("media type 'application/xml'")),
            ]
        );
    }

    #[test]
    fn group_partitions_changes() {
        let grouped = sample().group();

        assert_eq!(grouped.endpoints.len(), 3);
        assert_eq!(grouped.endpoints[&Endpoint::new("/pets", "post")].len(), 2);
        assert_eq!(grouped.components.len(), 1);
        assert_eq!(grouped.security.len(), 1);

        let keys: Vec<String> = grouped.endpoints.keys().map(|e| e.to_string()).collect();
        assert_eq!(keys, vec!["GET /pets", "POST /pets", "GET /users"]);
    }

    #[test]
    fn serializes_as_array() {
        let json = sample().to_json().unwrap();
        assert!(json.trim_start().starts_with('['));
        let parsed: ChangeList = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }
}

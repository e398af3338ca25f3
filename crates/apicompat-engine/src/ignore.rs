//! Ignore-list filter
//!
//! An ignore file holds previously accepted findings, one per line, usually
//! copied from an earlier report. A record is suppressed when a line names
//! its endpoint and contains its message text. Matching is plain lower-cased
//! substring comparison.

use std::path::{Path, PathBuf};

use apicompat_core::{ChangeList, ChangeRecord, Level, Localizer};

const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace", "connect"];

/// Ignore file errors
#[derive(Debug, thiserror::Error)]
pub enum IgnoreError {
    #[error("failed to read ignore file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One lower-cased ignore line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreEntry {
    line: String,
    path: String,
}

impl IgnoreEntry {
    /// Parse one line; blank lines yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim().to_lowercase();
        if line.is_empty() {
            return None;
        }

        let mut tokens = line.split_whitespace();
        let path = tokens
            .by_ref()
            .find(|token| HTTP_METHODS.contains(token))
            .and_then(|_| tokens.next())
            .unwrap_or_default()
            .to_string();

        Some(Self { line, path })
    }

    /// The path following the first HTTP method, or empty
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Whether this entry suppresses `record`
    pub fn matches(&self, record: &ChangeRecord, localizer: &dyn Localizer) -> bool {
        let path = record.path().to_lowercase();
        if path != self.path {
            return false;
        }

        let endpoint = format!("{} {}", record.operation(), record.path()).to_lowercase();
        if !self.line.contains(&endpoint) {
            return false;
        }

        self.line.contains(&record.text(localizer).to_lowercase())
    }
}

/// Parsed ignore file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entries: Vec<IgnoreEntry>,
}

impl IgnoreList {
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text.lines().filter_map(IgnoreEntry::parse).collect(),
        }
    }

    /// Read and parse an ignore file
    pub fn from_file(path: &Path) -> Result<Self, IgnoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| IgnoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let list = Self::parse(&text);
        tracing::debug!(path = %path.display(), entries = list.len(), "loaded ignore file");
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IgnoreEntry] {
        &self.entries
    }

    fn suppresses(&self, record: &ChangeRecord, localizer: &dyn Localizer) -> bool {
        self.entries.iter().any(|entry| entry.matches(record, localizer))
    }

    /// Drop every record matched by an entry
    pub fn apply(&self, changes: ChangeList, localizer: &dyn Localizer) -> ChangeList {
        self.filter(changes, None, localizer)
    }

    /// Drop matched records at exactly `level`; other levels pass through
    pub fn apply_at_level(&self, changes: ChangeList, level: Level, localizer: &dyn Localizer) -> ChangeList {
        self.filter(changes, Some(level), localizer)
    }

    fn filter(&self, mut changes: ChangeList, level: Option<Level>, localizer: &dyn Localizer) -> ChangeList {
        if self.entries.is_empty() {
            return changes;
        }

        let before = changes.len();
        changes.retain(|record| {
            let in_scope = level.map_or(true, |l| record.level() == l);
            !(in_scope && self.suppresses(record, localizer))
        });

        tracing::debug!(
            suppressed = before - changes.len(),
            remaining = changes.len(),
            "applied ignore list"
        );
        changes
    }
}

/// Read `path` and drop the records it lists at `level`
pub fn filter_ignored(
    changes: ChangeList,
    path: &Path,
    level: Level,
    localizer: &dyn Localizer,
) -> Result<ChangeList, IgnoreError> {
    Ok(IgnoreList::from_file(path)?.apply_at_level(changes, level, localizer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicompat_core::{ChangeCore, Endpoint, TemplateLocalizer};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn removed_property(path: &str, method: &str, property: &str) -> ChangeRecord {
        ChangeRecord::api(
            ChangeCore::new("response-property-removed", Level::Err, vec![property.into(), "200".into()]),
            &Endpoint::new(path, method),
            None,
        )
    }

    fn sample() -> ChangeList {
        ChangeList::from_changes(vec![
            removed_property("/pets", "get", "name"),
            removed_property("/pets", "get", "tag"),
            removed_property("/users", "get", "name"),
        ])
    }

    #[test]
    fn entry_path_follows_first_method() {
        let entry = IgnoreEntry::parse("  GET /Pets the response property 'name' was removed").unwrap();
        assert_eq!(entry.path(), "/pets");

        let entry = IgnoreEntry::parse("no method on this line").unwrap();
        assert_eq!(entry.path(), "");

        let entry = IgnoreEntry::parse("get").unwrap();
        assert_eq!(entry.path(), "");

        assert!(IgnoreEntry::parse("   ").is_none());
    }

    #[test]
    fn matching_record_is_removed() {
        let list = IgnoreList::parse(
            "GET /pets the response property 'name' for status '200' was removed\n\n",
        );
        let filtered = list.apply(sample(), &TemplateLocalizer);

        let remaining: Vec<(&str, &str)> = filtered.iter().map(|c| (c.path(), c.args()[0].as_str())).collect();
        assert_eq!(remaining, vec![("/pets", "tag"), ("/users", "name")]);
    }

    #[test]
    fn path_must_match_exactly() {
        // Same text, but the entry's path is a prefix of the record's
        let list = IgnoreList::parse("GET /pet the response property 'name' for status '200' was removed");
        assert_eq!(list.apply(sample(), &TemplateLocalizer), sample());
    }

    #[test]
    fn filtering_is_idempotent() {
        let list = IgnoreList::parse(
            "get /users the response property 'name' for status '200' was removed\n\
             GET /pets the response property 'tag' for status '200' was removed",
        );
        let once = list.apply(sample(), &TemplateLocalizer);
        let twice = list.apply(once.clone(), &TemplateLocalizer);
        assert_eq!(once.len(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn level_restricted_filter() {
        let list = IgnoreList::parse("GET /pets the response property 'name' for status '200' was removed");
        let untouched = list.apply_at_level(sample(), Level::Warn, &TemplateLocalizer);
        assert_eq!(untouched.len(), 3);

        let filtered = list.apply_at_level(sample(), Level::Err, &TemplateLocalizer);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn global_records_match_lines_without_method() {
        let global = ChangeRecord::security(ChangeCore::new(
            "api-global-security-removed",
            Level::Warn,
            vec!["oauth".into()],
        ));
        let changes = ChangeList::from_changes(vec![global]);

        let list = IgnoreList::parse("the global security requirement 'oauth' was removed");
        assert!(list.apply(changes, &TemplateLocalizer).is_empty());
    }

    #[test]
    fn ignore_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GET /pets the response property 'name' for status '200' was removed").unwrap();

        let filtered = filter_ignored(sample(), file.path(), Level::Err, &TemplateLocalizer).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IgnoreList::from_file(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}

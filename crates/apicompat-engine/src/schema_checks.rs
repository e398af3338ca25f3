//! Schema-level checks
//!
//! Leaf diffs are translated into [`Finding`]s and classified at the
//! [`Location`] they were found. One set of evaluators serves parameters,
//! headers, request bodies and response bodies alike.

use serde_json::Value;

use apicompat_core::diff::{Bound, Schema, SchemaDiffNode, ValueDiff};
use apicompat_core::policy::{is_match_all_pattern, type_transition_allowed, TypeFormat, Visibility};
use apicompat_core::{Finding, Location};

use crate::collector::{Collector, OperationContext};
use crate::walker::{full_name, visit_added, visit_deleted, visit_modified};

/// Where a schema lives inside an operation
#[derive(Debug, Clone)]
pub(crate) struct SchemaTarget {
    /// Location of the schema root
    pub root: Location,

    /// Location of nested properties; `None` limits checks to the root
    pub nested: Option<Location>,

    /// Leading message arguments identifying the root
    pub root_args: Vec<String>,

    /// Status code appended after a nested property name
    pub status: Option<String>,

    /// Carried into every record, e.g. the media type
    pub comment: Option<String>,
}

impl SchemaTarget {
    fn property_args(&self, property: String) -> Vec<String> {
        std::iter::once(property).chain(self.status.clone()).collect()
    }
}

/// Render a JSON value as a message argument
pub(crate) fn value_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Elementary findings carried by one node, with their own arguments
pub(crate) fn node_findings(node: &SchemaDiffNode, location: Location) -> Vec<(Finding, Vec<String>)> {
    let direction = location.direction();
    let mut findings = Vec::new();

    let type_changed = node.type_diff.as_ref().filter(|d| !d.is_empty());
    if let Some(diff) = type_changed {
        let from = TypeFormat::new(diff.from.as_deref(), node.base.format.as_deref());
        let to = TypeFormat::new(diff.to.as_deref(), node.revision.format.as_deref());
        findings.push((
            Finding::TypeChanged {
                generalized: type_transition_allowed(direction, from, to),
            },
            vec![text_or_empty(&diff.from), text_or_empty(&diff.to)],
        ));
    }

    // A format change under a new type is part of the type change
    if let Some(diff) = node.format.as_ref().filter(|d| !d.is_empty() && type_changed.is_none()) {
        let schema_type = node
            .revision
            .schema_type
            .as_deref()
            .or(node.base.schema_type.as_deref());
        let from = TypeFormat::new(schema_type, diff.from.as_deref());
        let to = TypeFormat::new(schema_type, diff.to.as_deref());
        findings.push((
            Finding::FormatChanged {
                generalized: type_transition_allowed(direction, from, to),
            },
            vec![text_or_empty(&diff.from), text_or_empty(&diff.to)],
        ));
    }

    if let Some(diff) = &node.enum_diff {
        for value in &diff.added {
            findings.push((Finding::EnumValueAdded, vec![value_arg(value)]));
        }
        for value in &diff.deleted {
            findings.push((Finding::EnumValueRemoved, vec![value_arg(value)]));
        }
    }

    if let Some(diff) = node.nullable.as_ref().filter(|d| !d.is_empty()) {
        let finding = if diff.to.unwrap_or(false) {
            Finding::BecameNullable
        } else {
            Finding::BecameNotNullable
        };
        findings.push((finding, vec![]));
    }

    if let Some(diff) = &node.pattern {
        findings.extend(pattern_finding(diff));
    }

    if let Some(diff) = &node.default {
        match (&diff.from, &diff.to) {
            (None, Some(to)) => findings.push((Finding::DefaultValueAdded, vec![value_arg(to)])),
            (Some(from), None) => findings.push((Finding::DefaultValueRemoved, vec![value_arg(from)])),
            (Some(from), Some(to)) if from != to => {
                findings.push((Finding::DefaultValueChanged, vec![value_arg(from), value_arg(to)]))
            }
            _ => {}
        }
    }

    for bound in Bound::ALL {
        let Some(diff) = node.bound(bound) else {
            continue;
        };
        let finding = match (diff.from, diff.to) {
            (None, Some(to)) => (Finding::BoundSet(bound), vec![to.to_string()]),
            (Some(from), None) => (Finding::BoundRemoved(bound), vec![from.to_string()]),
            (Some(from), Some(to)) if to > from => {
                (Finding::BoundIncreased(bound), vec![from.to_string(), to.to_string()])
            }
            (Some(from), Some(to)) => (Finding::BoundDecreased(bound), vec![from.to_string(), to.to_string()]),
            (None, None) => continue,
        };
        findings.push(finding);
    }

    for child in node.ordered_children() {
        if let Some((kind, variants)) = child.variants() {
            for key in &variants.added {
                findings.push((Finding::VariantAdded(kind), vec![key.clone()]));
            }
            for key in &variants.deleted {
                findings.push((Finding::VariantRemoved(kind), vec![key.clone()]));
            }
        }
    }

    if let Some(diff) = node.discriminator.as_ref().filter(|d| !d.is_empty()) {
        if diff.added {
            findings.push((Finding::DiscriminatorAdded, vec![]));
        }
        if diff.deleted {
            findings.push((Finding::DiscriminatorRemoved, vec![]));
        }
        if let Some(name) = diff.property_name.as_ref().filter(|d| !d.is_empty()) {
            findings.push((
                Finding::DiscriminatorPropertyChanged,
                vec![text_or_empty(&name.from), text_or_empty(&name.to)],
            ));
        }
        if let Some(mapping) = diff.mapping.as_ref().filter(|m| !m.is_empty()) {
            let join = |keys: &std::collections::BTreeSet<String>| keys.iter().cloned().collect::<Vec<_>>().join(", ");
            findings.push((
                Finding::DiscriminatorMappingChanged,
                vec![join(&mapping.added), join(&mapping.deleted)],
            ));
        }
    }

    findings
}

fn pattern_finding(diff: &ValueDiff<String>) -> Option<(Finding, Vec<String>)> {
    match (&diff.from, &diff.to) {
        (None, Some(to)) if is_match_all_pattern(to) => None,
        (None, Some(to)) => Some((Finding::PatternAdded, vec![to.clone()])),
        (Some(from), None) => Some((Finding::PatternRemoved, vec![from.clone()])),
        (Some(from), Some(to)) if from == to => None,
        (Some(from), Some(to)) if is_match_all_pattern(to) => Some((Finding::PatternRemoved, vec![from.clone()])),
        (Some(from), Some(to)) => Some((Finding::PatternChanged, vec![from.clone(), to.clone()])),
        (None, None) => None,
    }
}

/// Whether either side of a modified node hides it from `location`
fn hidden(node: &SchemaDiffNode, location: Location) -> bool {
    let direction = location.direction();
    Visibility::of(&node.base).excludes(direction) || Visibility::of(&node.revision).excludes(direction)
}

fn hidden_leaf(schema: &Schema, location: Location) -> bool {
    Visibility::of(schema).excludes(location.direction())
}

fn report(
    collector: &mut Collector<'_>,
    op: &OperationContext,
    target: &SchemaTarget,
    location: Location,
    subject: Vec<String>,
    finding: Finding,
    args: Vec<String>,
) {
    if !finding.applies_to(location) {
        return;
    }
    let mut all_args = subject;
    all_args.extend(args);
    collector.api(op, &finding.rule_id(location), all_args, target.comment.clone());
}

/// Required-list transitions of the properties directly under `node`
fn check_required(
    collector: &mut Collector<'_>,
    op: &OperationContext,
    target: &SchemaTarget,
    location: Location,
    here: &str,
    node: &SchemaDiffNode,
) {
    let Some(required) = node.required.as_ref() else {
        return;
    };

    for name in &required.added {
        // Added properties are reported by the added-property walk
        if node.property_added(name) {
            continue;
        }
        let property = node.revision.properties.get(name);
        if property.map_or(false, |p| hidden_leaf(p, location)) {
            continue;
        }
        let with_default = property.map_or(false, Schema::has_default);
        report(
            collector,
            op,
            target,
            location,
            target.property_args(full_name(here, name)),
            Finding::BecameRequired { with_default },
            vec![],
        );
    }

    for name in &required.deleted {
        if node.property_deleted(name) {
            continue;
        }
        let property = node.revision.properties.get(name).or_else(|| node.base.properties.get(name));
        if property.map_or(false, |p| hidden_leaf(p, location)) {
            continue;
        }
        report(
            collector,
            op,
            target,
            location,
            target.property_args(full_name(here, name)),
            Finding::BecameOptional,
            vec![],
        );
    }
}

/// Run every schema check over `node` at `target`
pub(crate) fn check_schema(
    collector: &mut Collector<'_>,
    op: &OperationContext,
    target: &SchemaTarget,
    node: Option<&SchemaDiffNode>,
) {
    let Some(node) = node.filter(|n| !n.is_empty()) else {
        return;
    };

    if !hidden(node, target.root) {
        for (finding, args) in node_findings(node, target.root) {
            report(collector, op, target, target.root, target.root_args.clone(), finding, args);
        }
    }

    let Some(nested) = target.nested else {
        return;
    };

    check_required(collector, op, target, nested, "", node);

    visit_modified(Some(node), |path, name, child, _parent| {
        if hidden(child, nested) {
            return;
        }
        let here = full_name(path, name);
        for (finding, args) in node_findings(child, nested) {
            report(collector, op, target, nested, target.property_args(here.clone()), finding, args);
        }
        check_required(collector, op, target, nested, &here, child);
    });

    visit_added(Some(node), |path, name, leaf, parent| {
        if hidden_leaf(leaf, nested) {
            return;
        }
        let finding = Finding::added(parent.revision.is_required(name), leaf.has_default());
        report(collector, op, target, nested, target.property_args(full_name(path, name)), finding, vec![]);
    });

    visit_deleted(Some(node), |path, name, leaf, _parent| {
        if hidden_leaf(leaf, nested) {
            return;
        }
        report(
            collector,
            op,
            target,
            nested,
            target.property_args(full_name(path, name)),
            Finding::Removed,
            vec![],
        );
    });
}

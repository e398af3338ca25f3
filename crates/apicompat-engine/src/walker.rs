//! Schema diff tree walker
//!
//! Every schema check is a callback over one of the three walks below. They
//! share one depth-first traversal, so composite kinds are always visited in
//! the order allOf, anyOf, oneOf, items, properties, additionalProperties.

use apicompat_core::diff::{PropertiesDiff, Schema, SchemaChild, SchemaDiffNode};
use std::collections::BTreeMap;

/// Join a path label and a property name with `/`
pub fn full_name(path: &str, name: &str) -> String {
    match (path.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => path.to_string(),
        (false, false) => format!("{}/{}", path, name),
    }
}

/// Visit every modified, non-empty node below `root`
///
/// The callback receives `(path, name, node, parent)`. The root itself is
/// not visited.
pub fn visit_modified<'a, F>(root: Option<&'a SchemaDiffNode>, mut visit: F)
where
    F: FnMut(&str, &str, &'a SchemaDiffNode, Option<&'a SchemaDiffNode>),
{
    let Some(root) = root else {
        return;
    };

    descend("", "", root, None, &mut |path: &str, name: &str, node: &'a SchemaDiffNode, parent| {
        if !path.is_empty() || !name.is_empty() {
            visit(path, name, node, parent);
        }
    });
}

/// Visit every property leaf introduced anywhere below `root`
///
/// The callback receives `(path, name, leaf, parent)` where `parent` is the
/// node whose `properties` gained the leaf.
pub fn visit_added<'a, F>(root: Option<&'a SchemaDiffNode>, mut visit: F)
where
    F: FnMut(&str, &str, &'a Schema, &'a SchemaDiffNode),
{
    visit_leaves(root, |props| &props.added, &mut visit);
}

/// Visit every property leaf removed anywhere below `root`
pub fn visit_deleted<'a, F>(root: Option<&'a SchemaDiffNode>, mut visit: F)
where
    F: FnMut(&str, &str, &'a Schema, &'a SchemaDiffNode),
{
    visit_leaves(root, |props| &props.deleted, &mut visit);
}

fn visit_leaves<'a>(
    root: Option<&'a SchemaDiffNode>,
    select: fn(&'a PropertiesDiff) -> &'a BTreeMap<String, Schema>,
    visit: &mut dyn FnMut(&str, &str, &'a Schema, &'a SchemaDiffNode),
) {
    let Some(root) = root else {
        return;
    };

    descend("", "", root, None, &mut |path: &str, name: &str, node: &'a SchemaDiffNode, _parent| {
        let here = full_name(path, name);
        for props in node.properties() {
            for (property, leaf) in select(props) {
                visit(&here, property, leaf, node);
            }
        }
    });
}

/// Depth-first walk calling `on_node` for every non-empty node, root included
fn descend<'a>(
    path: &str,
    name: &str,
    node: &'a SchemaDiffNode,
    parent: Option<&'a SchemaDiffNode>,
    on_node: &mut dyn FnMut(&str, &str, &'a SchemaDiffNode, Option<&'a SchemaDiffNode>),
) {
    if node.is_empty() {
        return;
    }

    tracing::trace!(path, name, "visiting schema node");
    on_node(path, name, node, parent);

    let here = full_name(path, name);

    for child in node.ordered_children() {
        match child {
            SchemaChild::AllOf(variants) | SchemaChild::AnyOf(variants) | SchemaChild::OneOf(variants) => {
                let keyword = child
                    .variants()
                    .map(|(kind, _)| kind.keyword())
                    .unwrap_or_default();
                for (key, sub) in &variants.modified {
                    let segment = full_name(&here, &format!("{}[{}]", keyword, key));
                    descend(&segment, "", sub, Some(node), on_node);
                }
            }
            SchemaChild::Items(items) => {
                descend(&full_name(&here, "items"), "", items, Some(node), on_node);
            }
            SchemaChild::Properties(props) => {
                for (property, sub) in &props.modified {
                    descend(&here, property, sub, Some(node), on_node);
                }
            }
            SchemaChild::AdditionalProperties(additional) => {
                descend(&full_name(&here, "additionalProperties"), "", additional, Some(node), on_node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicompat_core::diff::{ValueDiff, VariantsDiff};
    use pretty_assertions::assert_eq;

    fn changed() -> SchemaDiffNode {
        let mut node = SchemaDiffNode::default();
        node.nullable = Some(ValueDiff::changed(false, true));
        node
    }

    fn with_props(modified: Vec<(&str, SchemaDiffNode)>, added: Vec<&str>) -> PropertiesDiff {
        let mut props = PropertiesDiff::default();
        for (name, node) in modified {
            props.modified.insert(name.to_string(), node);
        }
        for name in added {
            props.added.insert(name.to_string(), Schema::of_type("string"));
        }
        props
    }

    #[test]
    fn full_name_joins_segments() {
        assert_eq!(full_name("", "id"), "id");
        assert_eq!(full_name("address", ""), "address");
        assert_eq!(full_name("address", "city"), "address/city");
    }

    #[test]
    fn absent_or_empty_root_yields_no_visits() {
        let mut count = 0;
        visit_modified(None, |_, _, _, _| count += 1);
        visit_added(None, |_, _, _, _| count += 1);
        visit_deleted(None, |_, _, _, _| count += 1);

        let empty = SchemaDiffNode::default();
        visit_modified(Some(&empty), |_, _, _, _| count += 1);
        visit_added(Some(&empty), |_, _, _, _| count += 1);
        visit_deleted(Some(&empty), |_, _, _, _| count += 1);

        // Children whose diffs carry no change are skipped too
        let mut hollow = SchemaDiffNode::default();
        hollow
            .children
            .push(SchemaChild::Properties(with_props(vec![("name", SchemaDiffNode::default())], vec![])));
        visit_modified(Some(&hollow), |_, _, _, _| count += 1);

        assert_eq!(count, 0);
    }

    #[test]
    fn root_is_not_visited() {
        let root = changed();
        let mut visits = Vec::new();
        visit_modified(Some(&root), |path, name, _, _| visits.push(full_name(path, name)));
        assert!(visits.is_empty());
    }

    #[test]
    fn composite_kinds_visited_in_fixed_order() {
        let mut nested = changed();
        nested
            .children
            .push(SchemaChild::Properties(with_props(vec![("city", changed())], vec![])));

        let mut one_of = VariantsDiff::default();
        one_of.modified.insert("#/components/schemas/Cat".into(), changed());

        let mut all_of = VariantsDiff::default();
        all_of.modified.insert("0".into(), changed());

        let mut root = SchemaDiffNode::default();
        root.children = vec![
            SchemaChild::AdditionalProperties(Box::new(changed())),
            SchemaChild::Properties(with_props(vec![("address", nested), ("age", changed())], vec![])),
            SchemaChild::OneOf(one_of),
            SchemaChild::Items(Box::new(changed())),
            SchemaChild::AllOf(all_of),
        ];

        let mut visits = Vec::new();
        visit_modified(Some(&root), |path, name, _, parent| {
            assert!(parent.is_some());
            visits.push(full_name(path, name));
        });

        assert_eq!(
            visits,
            vec![
                "allOf[0]",
                "oneOf[#/components/schemas/Cat]",
                "items",
                "address",
                "address/city",
                "age",
                "additionalProperties",
            ]
        );
    }

    #[test]
    fn added_and_deleted_leaves_report_parent() {
        let mut inner = SchemaDiffNode::default();
        inner.children.push(SchemaChild::Properties(with_props(vec![], vec!["zip"])));

        let mut root_props = with_props(vec![("address", inner)], vec!["nickname"]);
        root_props.deleted.insert("legacy".into(), Schema::of_type("integer"));

        let mut root = SchemaDiffNode::default();
        root.children.push(SchemaChild::Properties(root_props));

        let mut added = Vec::new();
        visit_added(Some(&root), |path, name, leaf, parent| {
            assert_eq!(leaf.schema_type.as_deref(), Some("string"));
            assert!(parent.property_added(name));
            added.push(full_name(path, name));
        });
        assert_eq!(added, vec!["nickname", "address/zip"]);

        let mut deleted = Vec::new();
        visit_deleted(Some(&root), |path, name, _, _| deleted.push(full_name(path, name)));
        assert_eq!(deleted, vec!["legacy"]);
    }

    #[test]
    fn items_properties_are_prefixed() {
        let mut items = SchemaDiffNode::default();
        items.children.push(SchemaChild::Properties(with_props(vec![("id", changed())], vec!["tag"])));

        let mut root = SchemaDiffNode::default();
        root.children.push(SchemaChild::Items(Box::new(items)));

        let mut visits = Vec::new();
        visit_modified(Some(&root), |path, name, _, _| visits.push(full_name(path, name)));
        assert_eq!(visits, vec!["items", "items/id"]);

        let mut added = Vec::new();
        visit_added(Some(&root), |path, name, _, _| added.push(full_name(path, name)));
        assert_eq!(added, vec!["items/tag"]);
    }
}

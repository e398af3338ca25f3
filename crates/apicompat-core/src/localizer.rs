//! Message rendering
//!
//! The classifier only produces ids and arguments. A [`Localizer`] turns them
//! into text; [`TemplateLocalizer`] renders the English templates stored in
//! the rule catalog.

use colored::Colorize;

use crate::rules::{catalog, placeholder_regex};

/// Renders change messages
pub trait Localizer: Send + Sync {
    /// Plain text, used for sorting and ignore-file matching
    fn text(&self, id: &str, args: &[String]) -> String;

    /// Text for terminals
    fn pretty(&self, id: &str, args: &[String]) -> String {
        self.text(id, args)
    }
}

/// Renders catalog templates
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateLocalizer;

impl TemplateLocalizer {
    fn render(&self, id: &str, args: &[String], highlight: bool) -> String {
        let Some(rule) = catalog().get(id) else {
            return if args.is_empty() {
                id.to_string()
            } else {
                format!("{}: {}", id, args.join(", "))
            };
        };

        placeholder_regex()
            .replace_all(&rule.template, |caps: &regex::Captures<'_>| {
                let arg = caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i));
                match arg {
                    Some(arg) if highlight => arg.bold().to_string(),
                    Some(arg) => arg.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl Localizer for TemplateLocalizer {
    fn text(&self, id: &str, args: &[String]) -> String {
        self.render(id, args, false)
    }

    fn pretty(&self, id: &str, args: &[String]) -> String {
        self.render(id, args, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn renders_catalog_template() {
        let text = TemplateLocalizer.text(
            "request-parameter-default-value-removed",
            &args(&["query", "category", "default_category"]),
        );
        assert_eq!(
            text,
            "the query request parameter 'category' had the default value 'default_category' removed"
        );
    }

    #[test]
    fn missing_arguments_keep_placeholder() {
        let text = TemplateLocalizer.text("api-removed-before-sunset", &[]);
        assert_eq!(text, "api removed before the sunset date '{0}'");
    }

    #[test]
    fn unknown_id_falls_back_to_id() {
        assert_eq!(TemplateLocalizer.text("no-such-rule", &[]), "no-such-rule");
        assert_eq!(
            TemplateLocalizer.text("no-such-rule", &args(&["a", "b"])),
            "no-such-rule: a, b"
        );
    }

    #[test]
    fn pretty_keeps_argument_text() {
        colored::control::set_override(false);
        let pretty = TemplateLocalizer.pretty("api-tag-removed", &args(&["pets"]));
        assert_eq!(pretty, "api tag 'pets' was removed");
    }
}

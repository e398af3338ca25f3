use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use apicompat_core::{
    catalog, ChangeList, ChangeRecord, CheckMode, Config, Level, SeverityOverrides, SourceMap, StructuralDiff,
    TemplateLocalizer,
};
use apicompat_engine::{Checker, IgnoreList};

const DEFAULT_CONFIG: &str = "apicompat.toml";

/// apicompat - breaking-change detection for HTTP API contracts
#[derive(Parser)]
#[command(name = "apicompat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: apicompat.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report breaking changes and fail when the gating level is reached
    Breaking {
        #[command(flatten)]
        input: InputArgs,

        /// Exit with status 1 when a change at this level or higher remains
        #[arg(long, default_value = "error")]
        fail_on: Level,

        /// Ignore file for accepted error-level changes
        #[arg(long)]
        err_ignore: Option<PathBuf>,

        /// Ignore file for accepted warning-level changes
        #[arg(long)]
        warn_ignore: Option<PathBuf>,

        /// File of `<id> <level>` lines overriding rule levels
        #[arg(long)]
        severity_levels: Option<PathBuf>,

        /// Also run a rule that is off in breaking mode (repeatable)
        #[arg(long = "include-check")]
        include_checks: Vec<String>,
    },

    /// List every change, including non-breaking ones
    Changelog {
        #[command(flatten)]
        input: InputArgs,

        /// Only show changes at this level or higher
        #[arg(long, default_value = "info")]
        level: Level,
    },

    /// Print the rule catalog
    Rules {
        /// Only rules that run in breaking mode by default
        #[arg(long)]
        breaking_only: bool,
    },
}

#[derive(clap::Args)]
struct InputArgs {
    /// Structural diff serialized as JSON
    #[arg(short, long)]
    diff: PathBuf,

    /// JSON map of operation source locators
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Evaluate sunset dates against this day instead of today (YYYY-MM-DD)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;
    tracing::debug!(mode = ?config.mode, overrides = config.severity.overrides.len(), "config loaded");

    match cli.command {
        Commands::Breaking {
            input,
            fail_on,
            err_ignore,
            warn_ignore,
            severity_levels,
            include_checks,
        } => {
            let config = breaking_config(config, severity_levels.as_deref(), &include_checks)?;
            breaking_command(
                &config,
                &input,
                fail_on,
                err_ignore.as_deref(),
                warn_ignore.as_deref(),
                cli.verbose,
            )
        }
        Commands::Changelog { input, level } => {
            let config = Config {
                mode: CheckMode::Changelog,
                ..config
            };
            changelog_command(&config, &input, level, cli.verbose)
        }
        Commands::Rules { breaking_only } => {
            rules_command(breaking_only);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Config::from_file(path).with_context(|| format!("loading config {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        return Config::from_file(default_path).with_context(|| format!("loading config {}", DEFAULT_CONFIG));
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

fn breaking_config(mut config: Config, severity_levels: Option<&Path>, include_checks: &[String]) -> Result<Config> {
    if let Some(path) = severity_levels {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading severity levels {}", path.display()))?;
        let overrides = SeverityOverrides::parse_lines(&text)
            .with_context(|| format!("parsing severity levels {}", path.display()))?;
        config = config.with_overrides(overrides)?;
    }

    for id in include_checks {
        config = config.with_included_check(id)?;
    }

    Ok(config)
}

/// Read the diff and run the checker
fn classify(config: &Config, input: &InputArgs, verbose: bool) -> Result<ChangeList> {
    if verbose {
        eprintln!("{} {}", "Loading diff from:".cyan(), input.diff.display());
    }

    let json = std::fs::read_to_string(&input.diff)
        .with_context(|| format!("reading diff {}", input.diff.display()))?;
    let diff = StructuralDiff::from_json(&json).with_context(|| format!("parsing diff {}", input.diff.display()))?;

    let sources = match &input.sources {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading sources {}", path.display()))?;
            SourceMap::from_json(&json).with_context(|| format!("parsing sources {}", path.display()))?
        }
        None => SourceMap::default(),
    };

    let mut checker = Checker::new(config).with_sources(&sources);
    if let Some(date) = input.date {
        checker = checker.with_today(date);
    }

    let mut changes = checker.check(&diff);
    changes.sort_with(&TemplateLocalizer);
    Ok(changes)
}

fn breaking_command(
    config: &Config,
    input: &InputArgs,
    fail_on: Level,
    err_ignore: Option<&Path>,
    warn_ignore: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let mut changes = classify(config, input, verbose)?;

    for (path, level) in [(err_ignore, Level::Err), (warn_ignore, Level::Warn)] {
        if let Some(path) = path {
            let list = IgnoreList::from_file(path)?;
            if verbose {
                eprintln!("{} {} ({} entries)", "Applying ignore file:".cyan(), path.display(), list.len());
            }
            changes = list.apply_at_level(changes, level, &TemplateLocalizer);
        }
    }

    match input.format {
        OutputFormat::Json => println!("{}", changes.to_json()?),
        OutputFormat::Text => print_text(&changes, "Breaking changes"),
    }

    if changes.has_level_or_higher(fail_on) {
        eprintln!();
        eprintln!(
            "{}",
            format!("✗ Changes at level '{}' or higher found", fail_on).red().bold()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn changelog_command(config: &Config, input: &InputArgs, level: Level, verbose: bool) -> Result<()> {
    let mut changes = classify(config, input, verbose)?;
    changes.retain(|change| change.level() >= level);

    match input.format {
        OutputFormat::Json => println!("{}", changes.to_json()?),
        OutputFormat::Text => print_text(&changes, "Changelog"),
    }

    Ok(())
}

fn rules_command(breaking_only: bool) {
    for rule in catalog().iter().filter(|rule| rule.participates || !breaking_only) {
        println!("{:<8} {:<72} {}", level_label(rule.level), rule.id, rule.template.dimmed());
    }
}

fn level_label(level: Level) -> colored::ColoredString {
    match level {
        Level::Err => "error".red().bold(),
        Level::Warn => "warning".yellow().bold(),
        Level::Info => "info".cyan(),
    }
}

/// One report line: endpoint followed by the plain message
///
/// Lines can be copied verbatim into an ignore file.
fn change_line(change: &ChangeRecord) -> String {
    let text = change.text(&TemplateLocalizer);
    match change.endpoint() {
        Some(endpoint) => format!("{} {}", endpoint, text),
        None => text,
    }
}

fn print_change(change: &ChangeRecord) {
    println!("  {:<8} {}", level_label(change.level()), change_line(change));
    println!("           {}", format!("[{}]", change.id()).dimmed());

    if let Some(comment) = change.comment() {
        println!("           {}", comment.dimmed());
    }
    if let Some(source) = change.source() {
        println!("           {} {}", "at".dimmed(), source.dimmed());
    }
}

fn print_text(changes: &ChangeList, title: &str) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", title.bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    if changes.is_empty() {
        println!("{}", "✓ No changes found".green());
        return;
    }

    let grouped = changes.group();

    for records in grouped.endpoints.values() {
        records.iter().for_each(print_change);
        println!();
    }

    if !grouped.security.is_empty() {
        println!("{}", "Security".bold());
        grouped.security.iter().for_each(print_change);
        println!();
    }

    if !grouped.components.is_empty() {
        println!("{}", "Components".bold());
        grouped.components.iter().for_each(print_change);
        println!();
    }

    let counts = changes.count_by_level();
    println!(
        "{} {} errors, {} warnings, {} info",
        "Summary:".bold(),
        counts.errors.to_string().red(),
        counts.warnings.to_string().yellow(),
        counts.info.to_string().cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicompat_core::{ChangeCore, Endpoint};
    use apicompat_engine::IgnoreEntry;

    #[test]
    fn report_line_is_a_valid_ignore_entry() {
        let change = ChangeRecord::api(
            ChangeCore::new("response-property-removed", Level::Err, vec!["tag".into(), "200".into()]),
            &Endpoint::new("/pets", "get"),
            None,
        );

        let line = change_line(&change);
        assert_eq!(line, "GET /pets the response property 'tag' for status '200' was removed");

        let entry = IgnoreEntry::parse(&format!("  error    {}", line)).unwrap();
        assert!(entry.matches(&change, &TemplateLocalizer));
    }

    #[test]
    fn global_report_line_has_no_endpoint() {
        let change = ChangeRecord::security(ChangeCore::new(
            "api-global-security-removed",
            Level::Warn,
            vec!["oauth".into()],
        ));
        assert_eq!(change_line(&change), "the global security requirement 'oauth' was removed");
    }
}

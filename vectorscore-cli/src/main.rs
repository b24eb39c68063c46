//! vectorscore CLI - score, validate and export CVSS-style vector strings

#![deny(warnings)]

// Global invariants enforced:
// - Results go to stdout, diagnostics and logs go to stderr
// - Identical input yields byte-for-byte identical output
// - Exit status 1 whenever a result record is a failure

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vectorscore_core::config::{self, OutputFormat, ResolvedConfig};
use vectorscore_core::schema::Weight;
use vectorscore_core::{
    render_json, render_json_line, render_text, CalculationRecord, MetricValues, Scheme, SchemeId,
    ScoringError,
};

#[derive(Parser)]
#[command(name = "vectorscore")]
#[command(about = "Score, validate and export CVSS v3.1 and Reifegrad vector strings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a vector string or a set of discrete metric values
    Score {
        /// Vector string, e.g. CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H
        vector: Option<String>,

        /// Metric value as CODE=VALUE (repeatable, used instead of a vector)
        #[arg(long = "metric", value_name = "CODE=VALUE", value_parser = parse_metric)]
        metrics: Vec<(String, String)>,

        /// Scheme to score with (overrides config file)
        #[arg(long)]
        scheme: Option<SchemeId>,

        /// Output format: text, json or xml (overrides config file)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score one vector string per line, in parallel
    Batch {
        /// File with one vector per line, or `-` for stdin
        input: PathBuf,

        /// Scheme to score with (overrides config file)
        #[arg(long)]
        scheme: Option<SchemeId>,

        /// Output format: text or json (JSON lines)
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the metric groups, metrics and values of a scheme
    Schema {
        /// Scheme to describe (overrides config file)
        #[arg(long)]
        scheme: Option<SchemeId>,

        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without scoring anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            vector,
            metrics,
            scheme,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let scheme = resolved.build_scheme(scheme)?;
            let format = format.unwrap_or(resolved.format);

            let input = match (vector, metrics.is_empty()) {
                (Some(vector), true) => Input::Vector(vector),
                (None, false) => Input::Metrics(metrics),
                (Some(_), false) => anyhow::bail!("pass either a vector string or --metric, not both"),
                (None, true) => anyhow::bail!("nothing to score: pass a vector string or --metric"),
            };

            if !score(&scheme, &input, format) {
                std::process::exit(1);
            }
        }
        Commands::Batch {
            input,
            scheme,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let scheme = resolved.build_scheme(scheme)?;
            let format = format.unwrap_or(resolved.format);
            if format == OutputFormat::Xml {
                anyhow::bail!("batch output supports text and json only");
            }

            let content = read_input(&input)?;
            let vectors: Vec<&str> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .collect();
            tracing::debug!(count = vectors.len(), "scoring batch");

            let records: Vec<CalculationRecord> = scheme
                .calculate_many(&vectors)
                .iter()
                .map(CalculationRecord::from_result)
                .collect();

            for (vector, record) in vectors.iter().zip(&records) {
                match format {
                    OutputFormat::Json => println!("{}", render_json_line(record)),
                    _ => print!("{}", render_batch_line(vector, record)),
                }
            }

            if records.iter().any(|r| !r.is_success()) {
                std::process::exit(1);
            }
        }
        Commands::Schema {
            scheme,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let scheme = resolved.build_scheme(scheme)?;

            match format.unwrap_or(resolved.format) {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(scheme.schema())
                        .context("failed to serialize schema")?;
                    println!("{}", json);
                }
                OutputFormat::Text => print!("{}", render_schema(&scheme)),
                OutputFormat::Xml => anyhow::bail!("schema output supports text and json only"),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print!("{}", render_config(&resolved));
            }
        },
    }

    Ok(())
}

enum Input {
    Vector(String),
    Metrics(Vec<(String, String)>),
}

/// Score one input and print the result; false when the record is a failure
fn score(scheme: &Scheme, input: &Input, format: OutputFormat) -> bool {
    let values = match input {
        Input::Vector(vector) => scheme.decode(vector),
        Input::Metrics(pairs) => MetricValues::try_from_pairs(pairs.iter().cloned()),
    }
    .map_err(ScoringError::from);

    if format == OutputFormat::Xml {
        match values.and_then(|v| scheme.export_xml_from_metrics(&v)) {
            Ok(xml) => {
                print!("{}", xml);
                return true;
            }
            Err(err) => {
                eprint!("{}", render_text(&CalculationRecord::from_result(&Err(err))));
                return false;
            }
        }
    }

    let result = values.and_then(|v| scheme.calculate_from_metrics(&v));
    let record = CalculationRecord::from_result(&result);
    match format {
        OutputFormat::Json => println!("{}", render_json(&record)),
        _ => print!("{}", render_text(&record)),
    }
    record.is_success()
}

/// Install the stderr subscriber; RUST_LOG wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;
    init_logging(&resolved.log_level);

    if let Some(path) = &resolved.config_path {
        tracing::info!(path = %path.display(), "using config");
    }
    Ok(resolved)
}

fn parse_metric(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((code, value)) if !code.is_empty() => Ok((code.to_string(), value.to_string())),
        _ => Err(format!("expected CODE=VALUE, got `{arg}`")),
    }
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        Ok(content)
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))
    }
}

fn render_batch_line(input: &str, record: &CalculationRecord) -> String {
    match record {
        CalculationRecord::Success(success) => {
            let scores = success
                .scores
                .iter()
                .map(|s| format!("{}={} ({})", s.kind.as_str(), s.score, s.severity))
                .collect::<Vec<_>>()
                .join("  ");
            format!("{}  {}\n", success.vector_string, scores)
        }
        CalculationRecord::Failure(failure) => {
            let metrics = if failure.error_metrics.is_empty() {
                String::new()
            } else {
                format!(" ({})", failure.error_metrics.join(", "))
            };
            format!("{}  error: {}{}\n", input, failure.error_type, metrics)
        }
    }
}

fn render_schema(scheme: &Scheme) -> String {
    let schema = scheme.schema();
    let mut output = format!("{} (prefix {})\n", schema.name(), schema.prefix());

    for group in schema.groups() {
        output.push_str(&format!(
            "\n{} [{}, {} score]\n",
            group.name,
            if group.mandatory { "mandatory" } else { "optional" },
            group.score.as_str()
        ));
        for metric in &group.metrics {
            output.push_str(&format!("  {:<4} {}\n", metric.code, metric.name));
            for value in &metric.values {
                let weight = match value.weight {
                    Weight::Fixed(w) => format!("{}", w),
                    Weight::ScopeDependent { unchanged, changed } => {
                        format!("{} / {} (scope changed)", unchanged, changed)
                    }
                };
                output.push_str(&format!(
                    "       {:<3} {:<20} {}\n",
                    value.code, value.label, weight
                ));
            }
        }
    }

    output.push_str("\nSeverity:\n");
    for band in scheme.severity().bands() {
        output.push_str(&format!(
            "  {:<15} {:.1} - {:.1}\n",
            band.name, band.lower, band.upper
        ));
    }
    output
}

fn render_config(resolved: &ResolvedConfig) -> String {
    let mut output = String::from("Configuration:\n");
    match resolved.config_path {
        Some(ref p) => output.push_str(&format!("  Source: {}\n", p.display())),
        None => output.push_str("  Source: defaults (no config file found)\n"),
    }
    output.push_str(&format!("  scheme: {}\n", resolved.scheme));
    output.push_str(&format!("  format: {}\n", resolved.format.as_str()));
    output.push_str(&format!("  log_level: {}\n", resolved.log_level));
    output.push('\n');

    match resolved.severity {
        Some(ref scale) => {
            output.push_str("Severity bands (custom):\n");
            for band in scale.bands() {
                output.push_str(&format!(
                    "  {:<15} {:.1} - {:.1}\n",
                    band.name, band.lower, band.upper
                ));
            }
        }
        None => output.push_str("Severity bands: scheme defaults\n"),
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric() {
        assert_eq!(
            parse_metric("AV=N"),
            Ok(("AV".to_string(), "N".to_string()))
        );
        assert_eq!(parse_metric("E="), Ok(("E".to_string(), String::new())));
        assert!(parse_metric("AV").is_err());
        assert!(parse_metric("=N").is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_render_batch_line_failure() {
        let scheme = Scheme::builtin(SchemeId::Cvss31).unwrap();
        let record = CalculationRecord::from_result(&scheme.calculate_from_vector("CVSS:3.1/AV:N"));
        let line = render_batch_line("CVSS:3.1/AV:N", &record);
        assert!(line.starts_with("CVSS:3.1/AV:N  error: MissingMandatoryMetric (AC, PR"));
    }

    #[test]
    fn test_render_schema_lists_scope_dependent_weights() {
        let scheme = Scheme::builtin(SchemeId::Cvss31).unwrap();
        let text = render_schema(&scheme);
        assert!(text.starts_with("CVSS v3.1 (prefix CVSS:3.1)\n"));
        assert!(text.contains("0.62 / 0.68 (scope changed)"));
        assert!(text.contains("Critical"));
    }
}

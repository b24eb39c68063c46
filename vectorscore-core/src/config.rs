//! Configuration file support for vectorscore
//!
//! Loads configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.vectorscorerc.json` in the working directory
//! 3. `vectorscore.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::scheme::{Scheme, SchemeId};
use crate::severity::SeverityScale;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_LOG_LEVEL: &str = "warn";
const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// vectorscore configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorscoreConfig {
    /// Scheme used when none is given on the command line (default: cvss31)
    #[serde(default)]
    pub scheme: Option<SchemeId>,

    /// Severity bands replacing the scheme's own, by upper bound
    #[serde(default)]
    pub severity_bands: Option<Vec<BandConfig>>,

    /// Default output format (default: text)
    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// Log level used when RUST_LOG is not set (default: warn)
    #[serde(default)]
    pub log_level: Option<String>,
}

/// A severity band declared by its upper bound
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandConfig {
    pub name: String,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Xml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(format!(
                "unknown format `{other}` (expected `text`, `json` or `xml`)"
            )),
        }
    }
}

/// Resolved configuration with defaults applied
#[derive(Debug)]
pub struct ResolvedConfig {
    pub scheme: SchemeId,
    /// Custom severity scale (None keeps the scheme's own)
    pub severity: Option<SeverityScale>,
    pub format: OutputFormat,
    pub log_level: String,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl VectorscoreConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref bands) = self.severity_bands {
            if bands.is_empty() {
                anyhow::bail!("severity_bands must list at least one band");
            }
            for (i, band) in bands.iter().enumerate() {
                if band.name.trim().is_empty() {
                    anyhow::bail!("severity_bands[{}].name must not be empty", i);
                }
                if !band.upper.is_finite() || band.upper < 0.0 {
                    anyhow::bail!(
                        "severity_bands[{}].upper must be non-negative (got {})",
                        i,
                        band.upper
                    );
                }
                if ((band.upper * 10.0).round() - band.upper * 10.0).abs() > 1e-9 {
                    anyhow::bail!(
                        "severity_bands[{}].upper must be a whole tenth (got {})",
                        i,
                        band.upper
                    );
                }
                if i > 0 && band.upper <= bands[i - 1].upper {
                    anyhow::bail!(
                        "severity_bands[{}].upper ({}) must be greater than severity_bands[{}].upper ({})",
                        i,
                        band.upper,
                        i - 1,
                        bands[i - 1].upper
                    );
                }
            }
        }

        if let Some(ref level) = self.log_level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                anyhow::bail!(
                    "log_level must be one of {} (got {:?})",
                    LOG_LEVELS.join(", "),
                    level
                );
            }
        }

        Ok(())
    }

    /// Resolve config into concrete values with defaults applied
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let scheme = self.scheme.unwrap_or_default();
        let severity = match self.severity_bands {
            Some(ref bands) => {
                // range is checked against the scheme chosen in build_scheme
                let scale = SeverityScale::from_upper_bounds(
                    bands.iter().map(|b| (b.name.clone(), b.upper)),
                )
                .context("invalid severity_bands")?;
                Some(scale)
            }
            None => None,
        };

        Ok(ResolvedConfig {
            scheme,
            severity,
            format: self.format.unwrap_or_default(),
            log_level: self
                .log_level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        VectorscoreConfig::default().resolve()
    }

    /// Build the scheme to score with
    ///
    /// `override_scheme` comes from the command line and wins over the
    /// config file. Custom bands still apply and must fit its score range.
    pub fn build_scheme(&self, override_scheme: Option<SchemeId>) -> Result<Scheme> {
        let id = override_scheme.unwrap_or(self.scheme);
        let scheme = Scheme::builtin(id)?;
        match self.severity {
            Some(ref scale) => scheme
                .with_severity(scale.clone())
                .with_context(|| format!("configured severity_bands do not fit scheme `{}`", id)),
            None => Ok(scheme),
        }
    }
}

/// Discover and load a config file from the working directory
///
/// Search order:
/// 1. `.vectorscorerc.json`
/// 2. `vectorscore.config.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(root: &Path) -> Result<Option<(VectorscoreConfig, PathBuf)>> {
    for name in [".vectorscorerc.json", "vectorscore.config.json"] {
        let path = root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<VectorscoreConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: VectorscoreConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config in `root`.
/// Returns default config if nothing is found.
pub fn load_and_resolve(root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(root)? {
            Some((config, path)) => (config, Some(path)),
            None => (VectorscoreConfig::default(), None),
        }
    };

    let mut resolved = match &source_path {
        Some(path) => config
            .resolve()
            .with_context(|| format!("invalid config in: {}", path.display()))?,
        None => config.resolve()?,
    };
    resolved.config_path = source_path;
    Ok(resolved)
}

//! Configuration file support
//!
//! Loads per-user defaults from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.ascvdrc.json` in the working directory
//! 3. `ascvd.config.json` in the working directory
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::form::FormValues;
use crate::rules::RuleSetKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAMES: &[&str] = &[".ascvdrc.json", "ascvd.config.json"];

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AscvdConfig {
    /// Rule set to use when --rules is not given (default: basic)
    #[serde(default)]
    pub rules: Option<RuleSetKind>,

    /// Report format when --format is not given (default: text)
    #[serde(default)]
    pub format: Option<ReportFormat>,

    /// Always list the criteria that selected the category
    #[serde(default)]
    pub explain: Option<bool>,

    /// Form answers that replace the built-in field defaults.
    /// Numbers, strings ("Yes", "Female") and booleans are accepted.
    #[serde(default)]
    pub defaults: BTreeMap<String, serde_json::Value>,
}

/// Resolved configuration ready for use
#[derive(Debug)]
pub struct ResolvedConfig {
    pub rules: RuleSetKind,
    pub format: ReportFormat,
    pub explain: bool,
    /// Default answers, already checked against the field catalog
    pub defaults: FormValues,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

/// Convert a JSON default to the text a user would type in the form
fn value_to_answer(key: &str, value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Bool(b) => Ok(if *b { "Yes" } else { "No" }.to_string()),
        other => anyhow::bail!(
            "defaults.{} must be a number, string or boolean (got {})",
            key,
            other
        ),
    }
}

impl AscvdConfig {
    fn default_answers(&self) -> Result<FormValues> {
        let mut values = FormValues::new();
        for (key, value) in &self.defaults {
            values.insert(key.clone(), value_to_answer(key, value)?);
        }
        Ok(values)
    }

    /// Validate the configuration against its own rule set
    pub fn validate(&self) -> Result<()> {
        self.validate_for(self.rules.unwrap_or_default())
    }

    /// Validate the configuration against the form of `rules`
    pub fn validate_for(&self, rules: RuleSetKind) -> Result<()> {
        self.default_answers()?
            .validate(rules)
            .context("invalid defaults")?;
        Ok(())
    }

    /// Resolve config into the form used by the CLI
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.resolve_with_rules(None)
    }

    /// Resolve config, letting `rules_override` replace the configured rule set.
    /// Defaults are checked against the rule set that will actually run.
    pub fn resolve_with_rules(
        &self,
        rules_override: Option<RuleSetKind>,
    ) -> Result<ResolvedConfig> {
        let rules = rules_override.or(self.rules).unwrap_or_default();
        self.validate_for(rules)?;

        Ok(ResolvedConfig {
            rules,
            format: self.format.unwrap_or_default(),
            explain: self.explain.unwrap_or(false),
            defaults: self.default_answers()?,
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Built-in defaults (no config file)
    pub fn defaults() -> Result<Self> {
        AscvdConfig::default().resolve()
    }
}

/// Discover a config file in the given directory
///
/// Returns the parsed config and the path it was loaded from, or None.
pub fn discover_config(dir: &Path) -> Result<Option<(AscvdConfig, PathBuf)>> {
    for name in CONFIG_FILE_NAMES {
        let path = dir.join(name);
        if path.is_file() {
            let config = load_config_file(&path)?;
            tracing::debug!(path = %path.display(), "discovered config file");
            return Ok(Some((config, path)));
        }
    }
    Ok(None)
}

/// Load and parse a specific config file
pub fn load_config_file(path: &Path) -> Result<AscvdConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: AscvdConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Load config with explicit path or auto-discovery, then resolve
///
/// `rules_override` is the CLI `--rules` value, which takes precedence over
/// the config file.
pub fn load_and_resolve(
    dir: &Path,
    config_path: Option<&Path>,
    rules_override: Option<RuleSetKind>,
) -> Result<ResolvedConfig> {
    let (config, path) = if let Some(explicit) = config_path {
        (load_config_file(explicit)?, Some(explicit.to_path_buf()))
    } else {
        match discover_config(dir)? {
            Some((config, path)) => (config, Some(path)),
            None => (AscvdConfig::default(), None),
        }
    };

    let mut resolved = config
        .resolve_with_rules(rules_override)
        .with_context(|| match &path {
            Some(p) => format!("invalid config file: {}", p.display()),
            None => "invalid config".to_string(),
        })?;
    resolved.config_path = path;
    Ok(resolved)
}

// Configuration file (~/.casetrack/rc)
//
// Line-based `key=value` pairs. Blank lines and lines starting with '#' are skipped.
//
//   data.location=./ledger.db
//   catalog.location=/etc/casetrack/catalogs.json
//   pipeline.strict=true
//   board.overdue_days=30
//   pipeline.stale_days=14

use crate::pipeline::aggregate::{DEFAULT_OVERDUE_DAYS, DEFAULT_STALE_DAYS};
use crate::pipeline::TransitionPolicy;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: Option<PathBuf>,
    pub catalog_location: Option<PathBuf>,
    pub strict: bool,
    pub overdue_days: u32,
    pub stale_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_location: None,
            catalog_location: None,
            strict: false,
            overdue_days: DEFAULT_OVERDUE_DAYS,
            stale_days: DEFAULT_STALE_DAYS,
        }
    }
}

impl Config {
    /// Directory holding the rc file and the default ledger
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".casetrack"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("rc"))
    }

    /// Load the rc file, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content, path.parent())
    }

    /// Parse rc content. Relative paths resolve against `base_dir`.
    pub fn parse(content: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("config line {} ignored: no '='", line_no + 1);
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "data.location" => config.data_location = Some(resolve(value, base_dir)),
                "catalog.location" => config.catalog_location = Some(resolve(value, base_dir)),
                "pipeline.strict" => {
                    config.strict = parse_bool(value)
                        .with_context(|| format!("Invalid value for {} on line {}", key, line_no + 1))?;
                }
                "board.overdue_days" => {
                    config.overdue_days = value.parse()
                        .with_context(|| format!("Invalid value for {} on line {}: '{}'", key, line_no + 1, value))?;
                }
                "pipeline.stale_days" => {
                    config.stale_days = value.parse()
                        .with_context(|| format!("Invalid value for {} on line {}: '{}'", key, line_no + 1, value))?;
                }
                _ => log::warn!("unknown config key '{}' ignored", key),
            }
        }

        Ok(config)
    }

    pub fn policy(&self) -> TransitionPolicy {
        if self.strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Advisory
        }
    }
}

fn resolve(value: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(value);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("expected true or false, got '{}'", value),
    }
}

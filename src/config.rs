//! Configuration file handling.
//!
//! Loads `config.json` from `--config` or the platform config directory. Every
//! field is optional and command-line flags take precedence over it.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Language identifier names fall back to, e.g. "en"
    pub fallback_language: Option<String>,
    /// Where downloaded datasets are cached
    pub cache_dir: Option<PathBuf>,
    /// Filter used when `PORYDEX_LOG` is unset
    pub log_filter: Option<String>,
}

impl Config {
    /// Load from `path`, or from the default location when `path` is None.
    ///
    /// A missing default file yields the defaults. A missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// `<config_dir>/config.json` for this application
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "porydex-db").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

//! Application configuration stored in the app data directory

use crate::index::RootFailurePolicy;
use crate::query::SearchConfig;
use crate::utils::get_config_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub session: SessionConfig,
    pub ai: AiConfig,
    pub index: IndexConfig,
    pub editor: EditorConfig,
}

/// Interactive session timing and sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub normal_debounce_ms: u64,
    pub ai_debounce_ms: u64,
    pub max_results: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            normal_debounce_ms: 500,
            ai_debounce_ms: 1000,
            max_results: 10,
        }
    }
}

impl SessionConfig {
    pub fn normal_debounce(&self) -> Duration {
        Duration::from_millis(self.normal_debounce_ms)
    }

    pub fn ai_debounce(&self) -> Duration {
        Duration::from_millis(self.ai_debounce_ms)
    }
}

/// OpenAI-compatible ranking service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Bound the rerank cache; unbounded when unset
    pub cache_capacity: Option<usize>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            cache_capacity: None,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_capacity(&self) -> Option<NonZeroUsize> {
        self.cache_capacity.and_then(NonZeroUsize::new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub root_failure: RootFailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Command template; `{path}` and `{line}` are substituted per argument
    pub command: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: "cursor -g {path}:{line}".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the app data directory when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => get_config_path()?,
        };
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
        Ok(config)
    }
}

/// Print the effective configuration and where it was read from
pub fn show_config(config: &AppConfig, path: Option<&Path>) -> Result<()> {
    let source: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };

    println!("Configuration");
    println!("=============");
    println!();
    let status = if source.exists() { "" } else { " (not found, using defaults)" };
    println!("Config file:      {}{}", source.display(), status);
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("Failed to serialize config")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.session.max_results, 10);
        assert_eq!(config.session.normal_debounce(), Duration::from_millis(500));
        assert_eq!(config.session.ai_debounce(), Duration::from_millis(1000));
        assert_eq!(config.index.root_failure, RootFailurePolicy::Abort);
        assert_eq!(config.ai.cache_capacity(), None);
        assert_eq!(config.editor.command, "cursor -g {path}:{line}");
    }

    #[test]
    fn test_app_config_partial_json() {
        let json = r#"{"session": {"ai_debounce_ms": 250}, "index": {"root_failure": "skip"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.session.ai_debounce_ms, 250);
        assert_eq!(config.session.normal_debounce_ms, 500);
        assert_eq!(config.index.root_failure, RootFailurePolicy::Skip);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.ai, AiConfig::default());
    }

    #[test]
    fn test_zero_cache_capacity_is_unbounded() {
        let ai = AiConfig {
            cache_capacity: Some(0),
            ..AiConfig::default()
        };
        assert_eq!(ai.cache_capacity(), None);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.session, SessionConfig::default());
    }

    #[test]
    fn test_load_invalid_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}

//! TOML-based configuration for querylog.
//!
//! Supports a config file (querylog.toml) with environment variable
//! expansion. Settings are constructed once at process entry and passed by
//! parameter into every component; core logic performs no ambient lookups.
//!
//! Example configuration:
//! ```toml
//! [warehouse]
//! project_id = "${PROJECT_ID}"
//! region = "eu"
//!
//! [filters]
//! dataset_regex = "^(staging|prod)_.*"
//! table_regex = "^fact_.*"
//!
//! [mirror]
//! output_dir = "tables"
//! max_preview_rows = 10
//! fetch_workers = 4
//!
//! [usage]
//! lookback_days = 60
//!
//! [worker]
//! path = "./querylog-worker"
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("project_id is not configured; set warehouse.project_id in querylog.toml or pass --project-id")]
    MissingProjectId,

    #[error("Invalid filter regex: {0}")]
    InvalidFilter(#[from] regex::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Warehouse scope (billing project, region).
    pub warehouse: WarehouseSettings,

    /// Optional catalog filter regexes.
    pub filters: FilterSettings,

    /// Mirror build knobs.
    pub mirror: MirrorSettings,

    /// Usage mining knobs.
    pub usage: UsageSettings,

    /// Worker process configuration.
    pub worker: WorkerSettings,
}

/// Warehouse scope configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseSettings {
    /// Billing / query-execution project (supports ${ENV_VAR} expansion).
    pub project_id: Option<String>,

    /// Regional execution scope.
    pub region: String,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            region: "eu".to_string(),
        }
    }
}

/// Catalog filter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Regex over schema (dataset) names.
    pub dataset_regex: Option<String>,

    /// Regex over table names.
    pub table_regex: Option<String>,
}

/// Mirror build configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorSettings {
    /// Root directory for the mirrored tree.
    pub output_dir: String,

    /// Maximum sample rows per preview artifact.
    pub max_preview_rows: u32,

    /// Fixed width of the preview fetch pool.
    pub fetch_workers: usize,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            output_dir: "tables".to_string(),
            max_preview_rows: 10,
            fetch_workers: 4,
        }
    }
}

/// Usage mining configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UsageSettings {
    /// Trailing number of days of job history to mine.
    pub lookback_days: u32,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self { lookback_days: 60 }
    }
}

/// Worker process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary (searched for if absent).
    pub path: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `QUERYLOG_CONFIG`
    /// 2. `./querylog.toml`
    /// 3. `~/.config/querylog/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("QUERYLOG_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("querylog.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("querylog").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// The billing project with environment variables expanded.
    ///
    /// # Errors
    ///
    /// Missing project id or an unset environment variable is a fatal
    /// configuration error.
    pub fn resolved_project_id(&self) -> Result<String, SettingsError> {
        let raw = self
            .warehouse
            .project_id
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(SettingsError::MissingProjectId)?;
        expand_env_vars(raw)
    }

    /// The worker binary path, if configured.
    pub fn worker_path(&self) -> Option<PathBuf> {
        let path = self.worker.path.as_deref()?;
        let expanded = expand_env_vars(path).ok()?;
        Some(PathBuf::from(expanded))
    }

    /// Dataset filter pattern, treating empty strings as absent.
    pub fn dataset_filter(&self) -> Option<&str> {
        self.filters
            .dataset_regex
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Table filter pattern, treating empty strings as absent.
    pub fn table_filter(&self) -> Option<&str> {
        self.filters
            .table_regex
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            // Check for ${VAR} or $VAR
            if chars.peek() == Some(&'{') {
                chars.next(); // consume '{'
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                // $VAR (ends at non-alphanumeric/underscore)
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    // Just a lone $, keep it
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_braces() {
        env::set_var("QL_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${QL_TEST_VAR}").unwrap(), "hello");
        assert_eq!(
            expand_env_vars("prefix_${QL_TEST_VAR}_suffix").unwrap(),
            "prefix_hello_suffix"
        );
        env::remove_var("QL_TEST_VAR");
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        env::set_var("QL_TEST_VAR2", "world");
        assert_eq!(expand_env_vars("$QL_TEST_VAR2").unwrap(), "world");
        assert_eq!(expand_env_vars("$QL_TEST_VAR2!").unwrap(), "world!");
        env::remove_var("QL_TEST_VAR2");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("${NONEXISTENT_VAR_12345}");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[warehouse]
project_id = "acme-analytics"
region = "us"

[filters]
dataset_regex = "^prod_"

[mirror]
output_dir = "mirror"
max_preview_rows = 25
fetch_workers = 8

[usage]
lookback_days = 30

[worker]
path = "./bin/querylog-worker"
timeout_secs = 60
"#;

        let settings: Settings = toml::from_str(toml).unwrap();

        assert_eq!(settings.warehouse.project_id.as_deref(), Some("acme-analytics"));
        assert_eq!(settings.warehouse.region, "us");
        assert_eq!(settings.dataset_filter(), Some("^prod_"));
        assert_eq!(settings.table_filter(), None);
        assert_eq!(settings.mirror.output_dir, "mirror");
        assert_eq!(settings.mirror.max_preview_rows, 25);
        assert_eq!(settings.mirror.fetch_workers, 8);
        assert_eq!(settings.usage.lookback_days, 30);
        assert_eq!(settings.worker.timeout_secs, 60);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert!(settings.warehouse.project_id.is_none());
        assert_eq!(settings.warehouse.region, "eu");
        assert_eq!(settings.mirror.output_dir, "tables");
        assert_eq!(settings.mirror.max_preview_rows, 10);
        assert_eq!(settings.mirror.fetch_workers, 4);
        assert_eq!(settings.usage.lookback_days, 60);
        assert!(matches!(
            settings.resolved_project_id(),
            Err(SettingsError::MissingProjectId)
        ));
    }

    #[test]
    fn test_resolved_project_id_expands_env() {
        env::set_var("QL_TEST_PROJECT", "acme-analytics");
        let mut settings = Settings::default();
        settings.warehouse.project_id = Some("${QL_TEST_PROJECT}".to_string());
        assert_eq!(settings.resolved_project_id().unwrap(), "acme-analytics");
        env::remove_var("QL_TEST_PROJECT");
    }

    #[test]
    fn test_blank_filters_are_absent() {
        let mut settings = Settings::default();
        settings.filters.dataset_regex = Some("   ".to_string());
        assert_eq!(settings.dataset_filter(), None);
    }
}

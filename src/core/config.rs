//! Configuration management with layered hierarchy
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. Global user config (`~/.config/cca/config.yaml`)
//! 3. Project config (nearest `.cca/config.yaml` walking up from the cwd)
//! 4. `CCA_*` environment variables
//!
//! Command line flags are applied on top by the CLI.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::cache::DEFAULT_TTL;
use crate::core::completion::DEFAULT_COMPLETE_FUNCTION;
use crate::core::prompt::{DEFAULT_CONTEXT_LIMIT, DEFAULT_MODEL};
use crate::core::query::CLAIMS_TABLE;
use crate::core::sql::{QualifiedName, SqlError};

/// Directory holding project-level configuration
pub const PROJECT_DIR: &str = ".cca";

/// Warehouse file used when none is configured
pub const DEFAULT_DATABASE: &str = "claims.db";

/// Environment variable holding the HTTP completion API key unless configured otherwise
pub const DEFAULT_API_KEY_ENV: &str = "CCA_API_KEY";

/// Which transport answers questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionBackend {
    /// The warehouse's SQL completion function
    #[default]
    Warehouse,
    /// An OpenAI-compatible HTTP endpoint
    Http,
}

impl std::fmt::Display for CompletionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionBackend::Warehouse => write!(f, "warehouse"),
            CompletionBackend::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for CompletionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warehouse" => Ok(CompletionBackend::Warehouse),
            "http" => Ok(CompletionBackend::Http),
            _ => Err(format!("Unknown completion backend: {}", s)),
        }
    }
}

/// Completion settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub backend: Option<CompletionBackend>,

    /// Warehouse function for the `warehouse` backend
    pub function: Option<String>,

    /// URL for the `http` backend
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
}

/// Configuration values; unset fields fall back to defaults via accessors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite warehouse file
    pub database: Option<PathBuf>,

    /// Claims table, optionally schema-qualified
    pub table: Option<String>,

    /// Completion model identifier
    pub model: Option<String>,

    /// Result cache window in seconds
    pub cache_ttl_secs: Option<u64>,

    /// Maximum claims embedded in a prompt
    pub context_limit: Option<usize>,

    pub completion: CompletionConfig,
}

/// Invalid configuration values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {source}")]
    Identifier {
        key: &'static str,
        #[source]
        source: SqlError,
    },

    #[error("completion.backend is 'http' but no endpoint is set (CCA_COMPLETION_ENDPOINT)")]
    MissingEndpoint,

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut config = Config::default();

        // Global user config
        if let Some(global_path) = Self::global_config_path() {
            config.merge_file(&global_path);
        }

        // Project config
        if let Some(project_path) = Self::project_config_path(&cwd) {
            config.merge_file(&project_path);
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a single YAML document
    pub fn from_yaml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "cca")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Nearest `.cca/config.yaml` at or above `start`
    pub fn project_config_path(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_DIR).join("config.yaml"))
            .find(|path| path.is_file())
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config file");
                return;
            }
        };
        match Self::from_yaml(path, &contents) {
            Ok(other) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                self.merge(other);
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    /// Apply `CCA_*` overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CCA_DATABASE") {
            self.database = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("CCA_TABLE") {
            self.table = Some(v);
        }
        if let Some(v) = lookup("CCA_MODEL") {
            self.model = Some(v);
        }
        if let Some(v) = lookup("CCA_CACHE_TTL_SECS") {
            match v.parse() {
                Ok(secs) => self.cache_ttl_secs = Some(secs),
                Err(_) => tracing::warn!(value = %v, "ignoring invalid CCA_CACHE_TTL_SECS"),
            }
        }
        if let Some(v) = lookup("CCA_CONTEXT_LIMIT") {
            match v.parse() {
                Ok(limit) => self.context_limit = Some(limit),
                Err(_) => tracing::warn!(value = %v, "ignoring invalid CCA_CONTEXT_LIMIT"),
            }
        }
        if let Some(v) = lookup("CCA_COMPLETION_BACKEND") {
            match v.parse() {
                Ok(backend) => self.completion.backend = Some(backend),
                Err(e) => tracing::warn!("ignoring CCA_COMPLETION_BACKEND: {}", e),
            }
        }
        if let Some(v) = lookup("CCA_COMPLETION_FUNCTION") {
            self.completion.function = Some(v);
        }
        if let Some(v) = lookup("CCA_COMPLETION_ENDPOINT") {
            self.completion.endpoint = Some(v);
        }
        if let Some(v) = lookup("CCA_COMPLETION_API_KEY_ENV") {
            self.completion.api_key_env = Some(v);
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.table.is_some() {
            self.table = other.table;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.cache_ttl_secs.is_some() {
            self.cache_ttl_secs = other.cache_ttl_secs;
        }
        if other.context_limit.is_some() {
            self.context_limit = other.context_limit;
        }
        if other.completion.backend.is_some() {
            self.completion.backend = other.completion.backend;
        }
        if other.completion.function.is_some() {
            self.completion.function = other.completion.function;
        }
        if other.completion.endpoint.is_some() {
            self.completion.endpoint = other.completion.endpoint;
        }
        if other.completion.api_key_env.is_some() {
            self.completion.api_key_env = other.completion.api_key_env;
        }
    }

    pub fn database(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    pub fn table(&self) -> Result<QualifiedName, ConfigError> {
        self.table
            .as_deref()
            .unwrap_or(CLAIMS_TABLE)
            .parse()
            .map_err(|source| ConfigError::Identifier { key: "table", source })
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TTL)
    }

    pub fn context_limit(&self) -> usize {
        self.context_limit.unwrap_or(DEFAULT_CONTEXT_LIMIT)
    }

    pub fn completion_backend(&self) -> CompletionBackend {
        self.completion.backend.unwrap_or_default()
    }

    pub fn completion_function(&self) -> Result<QualifiedName, ConfigError> {
        self.completion
            .function
            .as_deref()
            .unwrap_or(DEFAULT_COMPLETE_FUNCTION)
            .parse()
            .map_err(|source| ConfigError::Identifier {
                key: "completion.function",
                source,
            })
    }

    pub fn api_key_env(&self) -> &str {
        self.completion
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Effective value of a dotted key, for `cca config show <key>`
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "database" => Some(self.database().display().to_string()),
            "table" => Some(self.table.clone().unwrap_or_else(|| CLAIMS_TABLE.to_string())),
            "model" => Some(self.model().to_string()),
            "cache_ttl_secs" => Some(self.cache_ttl().as_secs().to_string()),
            "context_limit" => Some(self.context_limit().to_string()),
            "completion.backend" => Some(self.completion_backend().to_string()),
            "completion.function" => Some(
                self.completion
                    .function
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMPLETE_FUNCTION.to_string()),
            ),
            "completion.endpoint" => self.completion.endpoint.clone(),
            "completion.api_key_env" => Some(self.api_key_env().to_string()),
            _ => None,
        }
    }
}

/// Valid configuration keys with descriptions
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("database", "Path to the SQLite claims warehouse"),
    ("table", "Claims table, optionally schema-qualified"),
    ("model", "Completion model identifier"),
    ("cache_ttl_secs", "Result cache window in seconds"),
    ("context_limit", "Maximum claims embedded in a question prompt"),
    ("completion.backend", "warehouse or http"),
    ("completion.function", "Warehouse completion function"),
    ("completion.endpoint", "HTTP completion endpoint URL"),
    ("completion.api_key_env", "Environment variable holding the HTTP API key"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database(), PathBuf::from("claims.db"));
        assert_eq!(config.table().unwrap().as_str(), "AI_ENRICHED_CLAIMS");
        assert_eq!(config.model(), "mistral-large2");
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.context_limit(), 10);
        assert_eq!(config.completion_backend(), CompletionBackend::Warehouse);
        assert_eq!(
            config.completion_function().unwrap().as_str(),
            "SNOWFLAKE.CORTEX.COMPLETE"
        );
    }

    #[test]
    fn test_from_yaml_and_merge() {
        let mut config = Config::from_yaml(
            Path::new("global.yaml"),
            "model: llama3-70b\ncache_ttl_secs: 60\n",
        )
        .unwrap();
        let project = Config::from_yaml(
            Path::new("project.yaml"),
            "table: CORTEX_DEMO.HEALTHCARE.AI_ENRICHED_CLAIMS\n\
             completion:\n  backend: http\n  endpoint: http://localhost:8080/v1/chat/completions\n",
        )
        .unwrap();

        config.merge(project);

        assert_eq!(config.model(), "llama3-70b");
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(
            config.table().unwrap().as_str(),
            "CORTEX_DEMO.HEALTHCARE.AI_ENRICHED_CLAIMS"
        );
        assert_eq!(config.completion_backend(), CompletionBackend::Http);
        assert_eq!(
            config.get("completion.endpoint").as_deref(),
            Some("http://localhost:8080/v1/chat/completions")
        );
    }

    #[test]
    fn test_from_yaml_reports_path() {
        let err = Config::from_yaml(Path::new("bad.yaml"), "cache_ttl_secs: [1, 2]").unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CCA_DATABASE", "/data/claims.db"),
            ("CCA_MODEL", "mixtral-8x7b"),
            ("CCA_CACHE_TTL_SECS", "not-a-number"),
            ("CCA_COMPLETION_BACKEND", "HTTP"),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            cache_ttl_secs: Some(30),
            ..Default::default()
        };
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database(), PathBuf::from("/data/claims.db"));
        assert_eq!(config.model(), "mixtral-8x7b");
        assert_eq!(config.cache_ttl(), Duration::from_secs(30));
        assert_eq!(config.completion_backend(), CompletionBackend::Http);
    }

    #[test]
    fn test_env_overrides_prompt_and_completion_settings() {
        let env: HashMap<&str, &str> = [
            ("CCA_CONTEXT_LIMIT", "3"),
            ("CCA_COMPLETION_FUNCTION", "ai.complete"),
            ("CCA_COMPLETION_API_KEY_ENV", "OPENAI_API_KEY"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.context_limit(), 3);
        assert_eq!(config.completion_function().unwrap().to_string(), "ai.complete");
        assert_eq!(config.api_key_env(), "OPENAI_API_KEY");

        let mut config = Config {
            context_limit: Some(7),
            ..Default::default()
        };
        config.apply_env(|key| (key == "CCA_CONTEXT_LIMIT").then(|| "lots".to_string()));
        assert_eq!(config.context_limit(), 7);
    }

    #[test]
    fn test_invalid_table_is_rejected() {
        let config = Config {
            table: Some("claims; DROP TABLE claims".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.table(),
            Err(ConfigError::Identifier { key: "table", .. })
        ));
    }

    #[test]
    fn test_project_config_path_walks_up() {
        let tmp = tempfile::TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(Config::project_config_path(&nested).is_none());

        std::fs::create_dir_all(tmp.path().join(PROJECT_DIR)).unwrap();
        let config_path = tmp.path().join(PROJECT_DIR).join("config.yaml");
        std::fs::write(&config_path, "model: x\n").unwrap();

        assert_eq!(Config::project_config_path(&nested), Some(config_path));
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = Config {
            completion: CompletionConfig {
                endpoint: Some("http://x".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        for (key, _) in CONFIG_KEYS {
            assert!(config.get(key).is_some(), "{key}");
        }
        assert!(config.get("bogus").is_none());
    }
}

// phoenix-config - Unified configuration for the macro function and the rotation tool
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from PHOENIX_CONFIG env var
// 3. Config file contents from PHOENIX_CONFIG_CONTENT env var
// 4. Default config file locations (./phoenix.toml, ./.phoenix.toml)
// 5. Platform-specific defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod env_overrides;
mod platform;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};
pub use platform::Platform;

/// Hard limit on stages per REST API enforced by API Gateway.
pub const API_GATEWAY_STAGE_LIMIT: usize = 10;

/// Prefix shared by every macro token (`PHX_MACRO_SOME_KEY`).
pub const DEFAULT_TOKEN_PREFIX: &str = "PHX_MACRO_";

/// Main runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default, rename = "macro")]
    pub template_macro: MacroConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub rotation: RotationConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Identity of the project every template belongs to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,
}

/// Template macro configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroConfig {
    /// Prefix of every substitution token
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,

    /// Parameter store namespace; defaults to `/<project>/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_path: Option<String>,

    /// Marker whose presence after all passes fails the transform
    #[serde(default = "default_token_prefix")]
    pub orphan_sentinel: String,

    /// Placeholder replaced by the per-invocation random suffix
    #[serde(default = "default_random_placeholder")]
    pub random_placeholder: String,

    #[serde(default = "default_random_suffix_length")]
    pub random_suffix_length: usize,

    /// Also take `<token_prefix>*` variables from the process environment
    #[serde(default = "default_true")]
    pub import_env_tokens: bool,

    /// Resolve `PhoenixS3Transform` references
    #[serde(default = "default_true")]
    pub s3_transform: bool,
}

fn default_token_prefix() -> String {
    DEFAULT_TOKEN_PREFIX.to_string()
}

fn default_random_placeholder() -> String {
    "PHX_RANDOM_SUFFIX".to_string()
}

fn default_random_suffix_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            token_prefix: default_token_prefix(),
            parameter_path: None,
            orphan_sentinel: default_token_prefix(),
            random_placeholder: default_random_placeholder(),
            random_suffix_length: default_random_suffix_length(),
            import_env_tokens: true,
            s3_transform: true,
        }
    }
}

impl MacroConfig {
    /// Parameter store path to list, falling back to the project namespace
    pub fn parameter_path_for(&self, project_name: &str) -> String {
        match &self.parameter_path {
            Some(path) => path.clone(),
            None => format!("/{}/", project_name),
        }
    }
}

/// Object storage holding template fragments for `PhoenixS3Transform`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_template_prefix")]
    pub template_prefix: String,
}

fn default_template_prefix() -> String {
    "cloudformation/".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            endpoint: None,
            template_prefix: default_template_prefix(),
        }
    }
}

/// API Gateway deployment rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Stages kept after a rotation; must stay below the API Gateway limit
    #[serde(default = "default_max_stages")]
    pub max_stages: usize,
}

fn default_max_stages() -> usize {
    8
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_stages: default_max_stages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config(Platform::detect())
    }

    /// Load configuration for a specific platform (useful for testing)
    pub fn load_for_platform(platform: Platform) -> Result<Self> {
        sources::load_config(platform)
    }

    /// Load configuration from an explicit file (CLI `--config` flag)
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Construct a config that contains only platform defaults (no env or files).
    pub fn from_platform_defaults(platform: Platform) -> Self {
        let defaults = platform.defaults();
        Self {
            project: ProjectConfig::default(),
            template_macro: MacroConfig::default(),
            storage: StorageConfig::default(),
            rotation: RotationConfig::default(),
            logging: Some(LoggingConfig {
                log_level: defaults.log_level.to_string(),
                log_format: defaults.log_format,
            }),
        }
    }

    /// Merge another config into this one (used for TOML layering).
    pub fn merge(&mut self, other: RuntimeConfig) {
        self.project = other.project;
        self.template_macro = other.template_macro;
        self.storage = other.storage;
        self.rotation = other.rotation;

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the settings shared by every binary
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Validate the settings the template macro additionally needs
    pub fn validate_for_macro(&self) -> Result<()> {
        validation::validate_macro_runtime(self)
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

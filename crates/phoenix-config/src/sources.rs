// Configuration source loading.
//
// Priority order:
// 1. Environment variables (PHOENIX_* prefix)
// 2. Config file path from PHOENIX_CONFIG
// 3. Inline config content from PHOENIX_CONFIG_CONTENT
// 4. Default config files (./phoenix.toml, ./.phoenix.toml)
// 5. Platform defaults (based on auto-detected Platform)

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::platform::Platform;
use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

/// Load configuration for the detected platform using native environment/file access.
pub fn load_config(platform: Platform) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_platform_defaults(platform);

    if let Some(file_config) = load_from_file()? {
        config.merge(file_config);
    }

    let env_source = StdEnvSource;
    env_overrides::apply_env_overrides(&mut config, &env_source)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("PHOENIX_CONFIG") {
        return parse_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("PHOENIX_CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content)
            .context("Failed to parse inline config from PHOENIX_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in &["./phoenix.toml", "./.phoenix.toml"] {
        if Path::new(path).exists() {
            return parse_file(Path::new(path)).map(Some);
        }
    }

    Ok(None)
}

fn parse_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Unlike load_config(), this starts with the file content and then applies
/// platform defaults and environment overrides.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let file_config = parse_file(path.as_ref())?;

    let mut config = RuntimeConfig::from_platform_defaults(Platform::detect());
    config.merge(file_config);

    let env_source = StdEnvSource;
    env_overrides::apply_env_overrides(&mut config, &env_source)?;

    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

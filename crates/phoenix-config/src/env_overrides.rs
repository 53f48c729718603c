use super::{LogFormat, LoggingConfig, RuntimeConfig};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "PHOENIX_";

/// Abstraction over environment-variable lookups so tests can supply their own
/// source of overrides without touching the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the PHOENIX_ prefix
    /// Used for AWS standard variables (AWS_REGION) and the legacy PROJECT_NAME
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Project identity; PROJECT_NAME is what the function environment has always carried
    if let Some(name) = get_env_string(env, "PROJECT_NAME")? {
        config.project.name = name;
    } else if let Some(name) = get_raw_env_string(env, "PROJECT_NAME")? {
        config.project.name = name;
    }

    // Macro configuration
    if let Some(prefix) = get_env_string(env, "TOKEN_PREFIX")? {
        config.template_macro.token_prefix = prefix;
    }
    if let Some(path) = get_env_string(env, "PARAMETER_PATH")? {
        config.template_macro.parameter_path = Some(path);
    }
    if let Some(sentinel) = get_env_string(env, "ORPHAN_SENTINEL")? {
        config.template_macro.orphan_sentinel = sentinel;
    }
    if let Some(placeholder) = get_env_string(env, "RANDOM_PLACEHOLDER")? {
        config.template_macro.random_placeholder = placeholder;
    }
    if let Some(len) = get_env_usize(env, "RANDOM_SUFFIX_LENGTH")? {
        config.template_macro.random_suffix_length = len;
    }
    if let Some(val) = get_env_bool(env, "IMPORT_ENV_TOKENS")? {
        config.template_macro.import_env_tokens = val;
    }
    if let Some(val) = get_env_bool(env, "S3_TRANSFORM")? {
        config.template_macro.s3_transform = val;
    }

    // Template storage
    if let Some(bucket) = get_env_string(env, "TEMPLATE_BUCKET")? {
        config.storage.bucket = Some(bucket);
    }
    if let Some(prefix) = get_env_string(env, "TEMPLATE_PREFIX")? {
        config.storage.template_prefix = prefix;
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT")? {
        config.storage.endpoint = Some(endpoint);
    }
    if let Some(region) = get_env_string(env, "S3_REGION")? {
        config.storage.region = Some(region);
    } else if config.storage.region.is_none() {
        // Lambda always exports AWS_REGION
        config.storage.region = get_raw_env_string(env, "AWS_REGION")?;
    }

    // Rotation
    if let Some(max_stages) = get_env_usize(env, "MAX_STAGES")? {
        config.rotation.max_stages = max_stages;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        ensure_logging(config).log_level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        ensure_logging(config).log_format = format
            .parse::<LogFormat>()
            .context("Invalid PHOENIX_LOG_FORMAT value")?;
    }

    Ok(())
}

fn ensure_logging(config: &mut RuntimeConfig) -> &mut LoggingConfig {
    config.logging.get_or_insert_with(LoggingConfig::default)
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key))
}

/// Get a raw environment variable without the PHOENIX_ prefix
fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val.parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Platform;
    use std::collections::HashMap;

    struct MapEnv {
        prefixed: HashMap<&'static str, &'static str>,
        raw: HashMap<&'static str, &'static str>,
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.prefixed.get(key).map(|v| v.to_string())
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.raw.get(key).map(|v| v.to_string())
        }
    }

    #[test]
    fn prefixed_values_override_defaults() {
        let env = MapEnv {
            prefixed: HashMap::from([
                ("PROJECT_NAME", "shop"),
                ("MAX_STAGES", "6"),
                ("TEMPLATE_BUCKET", "shop-artifacts"),
                ("S3_TRANSFORM", "false"),
                ("LOG_FORMAT", "json"),
            ]),
            raw: HashMap::from([("AWS_REGION", "eu-west-1")]),
        };

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Cli);
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.project.name, "shop");
        assert_eq!(config.rotation.max_stages, 6);
        assert_eq!(config.storage.bucket.as_deref(), Some("shop-artifacts"));
        assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
        assert!(!config.template_macro.s3_transform);
        assert_eq!(config.logging().log_format, LogFormat::Json);
    }

    #[test]
    fn legacy_project_name_is_honoured() {
        let env = MapEnv {
            prefixed: HashMap::new(),
            raw: HashMap::from([("PROJECT_NAME", "legacy")]),
        };

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Lambda);
        apply_env_overrides(&mut config, &env).unwrap();
        assert_eq!(config.project.name, "legacy");
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let env = MapEnv {
            prefixed: HashMap::from([("MAX_STAGES", "eight")]),
            raw: HashMap::new(),
        };

        let mut config = RuntimeConfig::from_platform_defaults(Platform::Cli);
        let err = apply_env_overrides(&mut config, &env).unwrap_err();
        assert!(err.to_string().contains("PHOENIX_MAX_STAGES"));
    }
}

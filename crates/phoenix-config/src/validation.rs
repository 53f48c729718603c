// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_rotation_config(&config.rotation)?;
    validate_macro_config(&config.template_macro)?;

    if let Some(ref logging) = config.logging {
        if logging.log_level.is_empty() {
            bail!("logging.log_level must not be empty");
        }
    }

    Ok(())
}

/// Extra requirements of the macro function: it cannot run without a project
/// identity, and S3 transforms need somewhere to read from.
pub fn validate_macro_runtime(config: &RuntimeConfig) -> Result<()> {
    if config.project.name.is_empty() {
        bail!("project.name is required (set PHOENIX_PROJECT_NAME or PROJECT_NAME)");
    }

    if config.template_macro.s3_transform {
        match config.storage.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => {}
            _ => bail!(
                "storage.bucket is required when macro.s3_transform is enabled \
                 (set PHOENIX_TEMPLATE_BUCKET or PHOENIX_S3_TRANSFORM=false)"
            ),
        }

        if config.storage.region.is_none() {
            bail!("storage.region is required when macro.s3_transform is enabled");
        }
    }

    Ok(())
}

fn validate_rotation_config(config: &RotationConfig) -> Result<()> {
    if config.max_stages == 0 {
        bail!("rotation.max_stages must be greater than 0");
    }

    if config.max_stages >= API_GATEWAY_STAGE_LIMIT {
        bail!(
            "rotation.max_stages must stay below the API Gateway limit of {} stages",
            API_GATEWAY_STAGE_LIMIT
        );
    }

    if config.max_stages == API_GATEWAY_STAGE_LIMIT - 1 {
        warn!(
            max_stages = config.max_stages,
            "rotation.max_stages leaves no headroom for back-to-back deployments"
        );
    }

    Ok(())
}

fn validate_macro_config(config: &MacroConfig) -> Result<()> {
    if config.token_prefix.is_empty() {
        bail!("macro.token_prefix must not be empty");
    }

    if config.orphan_sentinel.is_empty() {
        bail!("macro.orphan_sentinel must not be empty");
    }

    if config.random_placeholder.is_empty() {
        bail!("macro.random_placeholder must not be empty");
    }

    if config.random_suffix_length == 0 {
        bail!("macro.random_suffix_length must be greater than 0");
    }

    if config.random_placeholder.starts_with(&config.orphan_sentinel) {
        warn!(
            placeholder = %config.random_placeholder,
            "macro.random_placeholder starts with the orphan sentinel; \
             a parameter with the same short name would shadow it"
        );
    }

    if config.random_suffix_length < 4 {
        warn!(
            random_suffix_length = config.random_suffix_length,
            "macro.random_suffix_length is very short; logical ids may collide"
        );
    }

    Ok(())
}

// phoenix - API Gateway deployment rotation
//
// Fetches the deployed `<project>-api-deployment-<env>` template, makes room
// for one more deployment stage and renders the result for the next stack
// update. Nothing is written back to CloudFormation.

mod init;
mod params;

pub use init::init_tracing;
pub use params::RotationParams;

use anyhow::{Context, Result};
use phoenix_core::rotation::{stage_ids, DEFAULT_MAX_STAGES};
use phoenix_core::{deployment_stack_name, rotate_deployed, DeployedTemplates, StageSpec};
use serde_json::Value;
use tracing::info;

/// Knobs for one rotation run.
#[derive(Debug, Clone)]
pub struct RotationOptions {
    pub token_prefix: String,
    pub max_stages: usize,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            token_prefix: phoenix_config::DEFAULT_TOKEN_PREFIX.to_string(),
            max_stages: DEFAULT_MAX_STAGES,
        }
    }
}

/// One rotation cycle against whatever `templates` currently holds.
pub async fn rotate_stack(
    params: &RotationParams,
    templates: &dyn DeployedTemplates,
    options: &RotationOptions,
) -> Result<Value> {
    let stack_name = deployment_stack_name(&params.project_name, &params.environment);
    let existing = templates
        .current_template(&stack_name)
        .await
        .with_context(|| format!("Failed to fetch template for stack {}", stack_name))?;

    let spec = StageSpec::for_project(&options.token_prefix)
        .with_variables(params.stage_variables.clone());
    let rotated = rotate_deployed(existing, &spec, options.max_stages)
        .with_context(|| format!("Failed to rotate deployments of stack {}", stack_name))?;

    let stages = stage_ids(&rotated)?;
    info!(stack = %stack_name, stages = ?stages, "Rotated API deployment stages");
    Ok(rotated)
}

/// Template as written to stdout: pretty JSON with a trailing newline.
pub fn render_template(template: &Value) -> Result<String> {
    let mut rendered =
        serde_json::to_string_pretty(template).context("Failed to serialize template")?;
    rendered.push('\n');
    Ok(rendered)
}

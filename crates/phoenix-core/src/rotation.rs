//! API Gateway deployment rotation.
//!
//! A deployment is an immutable snapshot of a REST API, and CloudFormation
//! only publishes a new snapshot when a new `AWS::ApiGateway::Deployment`
//! resource appears in the template. The rotation engine owns a template
//! whose resources are exactly those deployments, keyed by a dense, ever
//! increasing integer id, one stage per deployment.
//!
//! API Gateway caps stages per API, so before adding deployment `max + 1`
//! the oldest ids are evicted (FIFO) until fewer than `ceiling` remain.

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::error::RotationError;

pub const DEPLOYMENT_RESOURCE_TYPE: &str = "AWS::ApiGateway::Deployment";

/// Leaves headroom below the hard stage limit for stacks updated in quick
/// succession.
pub const DEFAULT_MAX_STAGES: usize = 8;

/// Template used when the deployment stack does not exist yet.
pub fn blank_template() -> Value {
    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": "Deploys an API (RESTful or not)",
        "Parameters": {
            "ProjectName": {
                "Description": "The name of the project.",
                "Type": "String"
            },
            "Environment": {
                "Description": "The environment (dev, testing, prod, etc.) to deploy to.",
                "Type": "String"
            },
            "Version": {
                "Description": "The identifier/version associated with this API Deployment.",
                "Type": "String"
            }
        },
        "Resources": {}
    })
}

/// `<project>-api-deployment-<environment>`
pub fn deployment_stack_name(project_name: &str, environment: &str) -> String {
    format!("{}-api-deployment-{}", project_name, environment)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    pub count: usize,
    /// `None` when there are no deployments
    pub min_id: Option<u64>,
    /// `0` when there are no deployments, so the first stage gets id 1
    pub max_id: u64,
}

fn resources(template: &Value) -> Result<&Map<String, Value>, RotationError> {
    template
        .get("Resources")
        .and_then(Value::as_object)
        .ok_or(RotationError::MissingResources)
}

fn resources_mut(template: &mut Value) -> Result<&mut Map<String, Value>, RotationError> {
    template
        .get_mut("Resources")
        .and_then(Value::as_object_mut)
        .ok_or(RotationError::MissingResources)
}

fn is_deployment(resource: &Value) -> bool {
    resource.get("Type").and_then(Value::as_str) == Some(DEPLOYMENT_RESOURCE_TYPE)
}

/// Parse a deployment's logical id. Ids must round-trip (`"007"` would never
/// match the `"7"` eviction targets).
fn parse_stage_id(name: &str) -> Result<u64, RotationError> {
    match name.parse::<u64>() {
        Ok(id) if id.to_string() == name => Ok(id),
        _ => Err(RotationError::InvalidStageId(name.to_string())),
    }
}

pub fn stage_stats(template: &Value) -> Result<StageStats, RotationError> {
    let mut stats = StageStats {
        count: 0,
        min_id: None,
        max_id: 0,
    };

    for (name, resource) in resources(template)? {
        if !is_deployment(resource) {
            continue;
        }
        let id = parse_stage_id(name)?;
        stats.count += 1;
        stats.min_id = Some(stats.min_id.map_or(id, |min| min.min(id)));
        stats.max_id = stats.max_id.max(id);
    }

    Ok(stats)
}

/// Deployment ids in ascending order.
pub fn stage_ids(template: &Value) -> Result<Vec<u64>, RotationError> {
    let mut ids = Vec::new();
    for (name, resource) in resources(template)? {
        if is_deployment(resource) {
            ids.push(parse_stage_id(name)?);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// What every new deployment resource points at and carries.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub rest_api_id: Value,
    pub variables: Map<String, Value>,
    pub description: String,
    pub stage_description: String,
    pub logging_level: String,
    pub metrics_enabled: bool,
}

impl StageSpec {
    /// Points at the REST API exported by the project's API stack:
    /// `<project>-api-<Environment>-RestApiId`. The project name is left as a
    /// macro token so the template macro fills it in at deploy time.
    pub fn for_project(token_prefix: &str) -> Self {
        Self {
            rest_api_id: json!({
                "Fn::ImportValue": {
                    "Fn::Join": ["-", [
                        format!("{}PROJECT_NAME", token_prefix),
                        "api",
                        {"Ref": "Environment"},
                        "RestApiId"
                    ]]
                }
            }),
            variables: Map::new(),
            description: "Deployment of the current API configuration".to_string(),
            stage_description: "Stage for a single API deployment".to_string(),
            logging_level: "INFO".to_string(),
            metrics_enabled: true,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// One deployment resource; its stage is named `<Environment>_<id>`.
pub fn stage_resource(spec: &StageSpec, id: u64) -> Value {
    json!({
        "Type": DEPLOYMENT_RESOURCE_TYPE,
        "Properties": {
            "RestApiId": spec.rest_api_id,
            "Description": spec.description,
            "StageDescription": {
                "Description": spec.stage_description,
                "LoggingLevel": spec.logging_level,
                "MetricsEnabled": spec.metrics_enabled.to_string(),
                "Variables": spec.variables
            },
            "StageName": {
                "Fn::Join": ["_", [
                    {"Ref": "Environment"},
                    id.to_string()
                ]]
            }
        }
    })
}

/// Evict the oldest deployments until fewer than `ceiling` remain, then add
/// deployment `max_id + 1`.
pub fn rotate(mut template: Value, spec: &StageSpec, ceiling: usize) -> Result<Value, RotationError> {
    if ceiling == 0 {
        return Err(RotationError::ZeroCeiling);
    }

    let mut stats = stage_stats(&template)?;
    debug!(?stats, ceiling, "Current deployment stages");

    while stats.count >= ceiling {
        let Some(oldest) = stats.min_id else {
            break;
        };
        resources_mut(&mut template)?.remove(&oldest.to_string());
        info!(stage_id = oldest, "Evicted oldest deployment stage");
        stats = stage_stats(&template)?;
    }

    let next_id = stats.max_id + 1;
    resources_mut(&mut template)?.insert(next_id.to_string(), stage_resource(spec, next_id));
    info!(
        stage_id = next_id,
        stages = stats.count + 1,
        "Added deployment stage"
    );

    Ok(template)
}

/// Rotate the deployed template, or a blank one when nothing is deployed yet.
pub fn rotate_deployed(
    existing: Option<Value>,
    spec: &StageSpec,
    ceiling: usize,
) -> Result<Value, RotationError> {
    let template = existing.unwrap_or_else(|| {
        info!("No deployed template found; starting from a blank template");
        blank_template()
    });
    rotate(template, spec, ceiling)
}

// Rotation parameters file
//
// Same file the stack deploy step uses:
//
// {"Parameters": {"ProjectName": "shop", "Environment": "dev", ...}}
//
// Unknown parameters are ignored. `StageVariables` (an object) is optional
// and becomes the new stage's variables.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

const INVALID_JSON_HINT: &str = "Your JSON is not valid! Did you check trailing commas??";

#[derive(Debug, Clone, Deserialize)]
struct ParamsFile {
    #[serde(rename = "Parameters")]
    parameters: RotationParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RotationParams {
    #[serde(rename = "ProjectName")]
    pub project_name: String,

    #[serde(rename = "Environment")]
    pub environment: String,

    #[serde(rename = "StageVariables", default)]
    pub stage_variables: Map<String, Value>,
}

impl RotationParams {
    pub fn parse(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content).context(INVALID_JSON_HINT)?;
        let file: ParamsFile = serde_json::from_value(raw)
            .context("Parameters file must contain Parameters.ProjectName and Parameters.Environment")?;
        Ok(file.parameters)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid parameters file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_required_parameters() {
        let params = RotationParams::parse(
            r#"{"Parameters": {"ProjectName": "shop", "Environment": "dev", "Version": "42"}}"#,
        )
        .unwrap();
        assert_eq!(params.project_name, "shop");
        assert_eq!(params.environment, "dev");
        assert!(params.stage_variables.is_empty());
    }

    #[test]
    fn stage_variables_are_optional_objects() {
        let params = RotationParams::parse(
            r#"{"Parameters": {"ProjectName": "shop", "Environment": "dev",
                "StageVariables": {"Alias": "live"}}}"#,
        )
        .unwrap();
        assert_eq!(params.stage_variables["Alias"], "live");
    }

    #[test]
    fn trailing_comma_gets_the_hint() {
        let err = RotationParams::parse(r#"{"Parameters": {"ProjectName": "shop",}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("trailing commas"));
    }

    #[test]
    fn missing_environment_is_rejected() {
        let err = RotationParams::parse(r#"{"Parameters": {"ProjectName": "shop"}}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("Environment"));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Parameters": {{"ProjectName": "shop", "Environment": "prod"}}}}"#
        )
        .unwrap();

        let params = RotationParams::read(file.path()).unwrap();
        assert_eq!(params.environment, "prod");
    }
}

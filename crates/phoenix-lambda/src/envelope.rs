// CloudFormation macro invocation envelope
//
// CloudFormation sends `templateParameterValues`; `parameters` is accepted
// for hand-built test events. Missing required fields fail deserialization,
// which the runtime reports as an invocation error.

use phoenix_core::{Outcome, Parameters, Transformed};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroRequest {
    pub request_id: String,
    pub fragment: Value,
    #[serde(alias = "parameters")]
    pub template_parameter_values: Parameters,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub transform_id: Option<String>,
    /// Parameters given to the transform itself in the template
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacroResponse {
    pub request_id: String,
    pub status: String,
    pub fragment: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl MacroResponse {
    pub fn from_transformed(request_id: String, transformed: Transformed) -> Self {
        let error_message = match &transformed.outcome {
            Outcome::Success => None,
            Outcome::ValidationFailed(reason) => Some(reason.clone()),
        };
        Self {
            request_id,
            status: transformed.outcome.status().to_string(),
            fragment: transformed.fragment,
            error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_cloudformation_event() {
        let event = json!({
            "region": "eu-west-1",
            "accountId": "123456789012",
            "fragment": {"Resources": {}},
            "transformId": "123456789012::PhoenixMacro",
            "params": {},
            "requestId": "req-1",
            "templateParameterValues": {"Environment": "dev"}
        });

        let request: MacroRequest = serde_json::from_value(event).unwrap();
        assert_eq!(request.request_id, "req-1");
        assert_eq!(request.template_parameter_values["Environment"], "dev");
        assert_eq!(request.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn accepts_parameters_alias() {
        let event = json!({
            "requestId": "req-2",
            "fragment": {},
            "parameters": {"Filename": "foo"}
        });
        let request: MacroRequest = serde_json::from_value(event).unwrap();
        assert_eq!(request.template_parameter_values["Filename"], "foo");
        assert!(request.transform_id.is_none());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let no_fragment = json!({"requestId": "req-3", "templateParameterValues": {}});
        assert!(serde_json::from_value::<MacroRequest>(no_fragment).is_err());

        let no_parameters = json!({"requestId": "req-3", "fragment": {}});
        assert!(serde_json::from_value::<MacroRequest>(no_parameters).is_err());
    }

    #[test]
    fn failure_response_carries_reason() {
        let transformed = Transformed {
            fragment: json!({"A": "PHX_MACRO_X"}),
            outcome: Outcome::ValidationFailed("Unresolved macro token(s) in template: PHX_MACRO_X".into()),
        };
        let response = MacroResponse::from_transformed("req-4".into(), transformed);
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(body["requestId"], "req-4");
        assert_eq!(body["status"], body["errorMessage"]);
        assert_eq!(body["fragment"]["A"], "PHX_MACRO_X");
    }

    #[test]
    fn success_response_omits_error_message() {
        let transformed = Transformed {
            fragment: json!({}),
            outcome: Outcome::Success,
        };
        let body = serde_json::to_value(MacroResponse::from_transformed("r".into(), transformed)).unwrap();
        assert_eq!(body["status"], "success");
        assert!(body.get("errorMessage").is_none());
    }
}

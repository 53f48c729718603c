use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::Client as CfnClient;
use phoenix_core::{DeployedTemplates, SourceError};
use serde_json::Value;
use tracing::{debug, info};

/// Reads the currently deployed template of a stack.
#[derive(Clone)]
pub struct CloudFormationTemplates {
    client: CfnClient,
}

impl CloudFormationTemplates {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: CfnClient::new(config),
        }
    }

    pub fn from_client(client: CfnClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeployedTemplates for CloudFormationTemplates {
    async fn current_template(&self, stack_name: &str) -> Result<Option<Value>, SourceError> {
        let output = match self.client.get_template().stack_name(stack_name).send().await {
            Ok(output) => output,
            Err(SdkError::ServiceError(ref err))
                if is_missing_stack(err.err().code(), err.err().message()) =>
            {
                info!(
                    stack = %stack_name,
                    code = err.err().code().unwrap_or("unknown"),
                    message = err.err().message().unwrap_or(""),
                    "No deployed template for stack"
                );
                return Ok(None);
            }
            Err(e) => {
                return Err(SourceError::stack_template(stack_name, DisplayErrorContext(e)));
            }
        };

        let Some(body) = output.template_body() else {
            return Ok(None);
        };
        debug!(stack = %stack_name, bytes = body.len(), "Fetched deployed template");

        parse_template_body(stack_name, body).map(Some)
    }
}

/// CloudFormation answers `ValidationError` "Stack with id X does not exist"
/// for an absent stack. Any other service error is a real failure.
fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError") && message.is_some_and(|m| m.contains("does not exist"))
}

fn parse_template_body(stack_name: &str, body: &str) -> Result<Value, SourceError> {
    serde_json::from_str(body).map_err(|source| SourceError::InvalidJson {
        key: stack_name.to_string(),
        source,
    })
}

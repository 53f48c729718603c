use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client as SsmClient;
use phoenix_core::{ParameterPage, ParameterSource, SourceError, StoredParameter};
use tracing::debug;

/// Parameter Store listing via `GetParametersByPath`.
#[derive(Clone)]
pub struct SsmParameterSource {
    client: SsmClient,
}

impl SsmParameterSource {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: SsmClient::new(config),
        }
    }

    pub fn from_client(client: SsmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterSource for SsmParameterSource {
    async fn fetch_page(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> Result<ParameterPage, SourceError> {
        let output = self
            .client
            .get_parameters_by_path()
            .path(path)
            .recursive(true)
            .with_decryption(true)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| SourceError::parameter_store(path, DisplayErrorContext(e)))?;

        let parameters: Vec<StoredParameter> = output
            .parameters()
            .iter()
            .filter_map(|parameter| {
                let name = parameter.name()?;
                let value = parameter.value()?;
                Some(match parameter.r#type() {
                    Some(ParameterType::SecureString) => StoredParameter::secret(name, value),
                    _ => StoredParameter::plain(name, value),
                })
            })
            .collect();

        debug!(path = %path, count = parameters.len(), "Fetched parameter page");
        Ok(ParameterPage {
            parameters,
            next_token: output.next_token().map(str::to_string),
        })
    }
}

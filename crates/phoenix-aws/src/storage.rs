// OpenDAL-backed template store
//
// Fragments referenced by `PhoenixS3Transform` live as JSON objects in a
// bucket. Tests swap the S3 service for the in-memory one.

use async_trait::async_trait;
use opendal::Operator;
use phoenix_core::{SourceError, TemplateStore};
use serde_json::Value;
use tracing::debug;

#[derive(Clone)]
pub struct OpenDalTemplateStore {
    operator: Operator,
}

impl OpenDalTemplateStore {
    /// S3 (or an S3-compatible endpoint). Credentials come from the
    /// environment the function runs in.
    pub fn new_s3(bucket: &str, region: &str, endpoint: Option<&str>) -> anyhow::Result<Self> {
        use opendal::services;

        let mut builder = services::S3::default().bucket(bucket).region(region);

        if let Some(ep) = endpoint {
            builder = builder.endpoint(ep);
        }

        let operator = Operator::new(builder)?.finish();
        Ok(Self { operator })
    }

    pub fn from_operator(operator: Operator) -> Self {
        Self { operator }
    }
}

#[async_trait]
impl TemplateStore for OpenDalTemplateStore {
    async fn fetch_json(&self, key: &str) -> Result<Value, SourceError> {
        let data = self
            .operator
            .read(key)
            .await
            .map_err(|e| SourceError::object_store(key, e))?
            .to_vec();
        debug!(key = %key, bytes = data.len(), "Read template object");

        serde_json::from_slice(&data).map_err(|source| SourceError::InvalidJson {
            key: key.to_string(),
            source,
        })
    }
}

//! Seams to the external systems the engines read from.
//!
//! Every collaborator is a read-only oracle: the engines never write through
//! these traits. Production adapters live in `phoenix-aws`.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;

/// Caller-supplied template parameter values for one invocation.
pub type Parameters = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Plain,
    /// Stored encrypted; substituted like any other value but never logged
    Secret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub value: String,
}

impl StoredParameter {
    pub fn plain(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Plain,
            value: value.into(),
        }
    }

    pub fn secret(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Secret,
            value: value.into(),
        }
    }
}

/// One page of a `list_by_path` listing.
#[derive(Debug, Default)]
pub struct ParameterPage {
    pub parameters: Vec<StoredParameter>,
    pub next_token: Option<String>,
}

/// Key-value parameter store, listed by path prefix one page at a time.
#[async_trait]
pub trait ParameterSource: Send + Sync {
    async fn fetch_page(
        &self,
        path: &str,
        next_token: Option<String>,
    ) -> Result<ParameterPage, SourceError>;
}

/// Object store holding JSON template fragments.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn fetch_json(&self, key: &str) -> Result<Value, SourceError>;
}

/// Stack-orchestration service holding the currently deployed templates.
#[async_trait]
pub trait DeployedTemplates: Send + Sync {
    /// `Ok(None)` means the stack has never been deployed.
    async fn current_template(&self, stack_name: &str) -> Result<Option<Value>, SourceError>;
}

/// List every parameter under `path`, following continuation tokens until
/// the source stops returning one.
pub async fn collect_parameters<P>(
    source: &P,
    path: &str,
) -> Result<Vec<StoredParameter>, SourceError>
where
    P: ParameterSource + ?Sized,
{
    let mut collected = Vec::new();
    let mut next_token = None;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(path, next_token.take()).await?;
        pages += 1;
        collected.extend(page.parameters);

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(
        path = %path,
        pages,
        parameters = collected.len(),
        "Listed parameter store namespace"
    );
    Ok(collected)
}

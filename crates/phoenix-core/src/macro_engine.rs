// Template macro orchestration
//
// Pass order:
// 1. literal token substitution (longest token first)
// 2. PhoenixSSM reference resolution
// 3. PhoenixS3Transform splicing (optional)
// 4. random suffix injection into values and keys
// 5. orphan validation
//
// Each pass assumes the earlier ones already ran. External lookups are read
// only and any transport failure aborts the whole transform.

use std::collections::HashMap;
use std::sync::Arc;

use phoenix_config::RuntimeConfig;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::{rename_keys, replace_literal};
use crate::error::MacroError;
use crate::reference::{
    collect_transform_names, resolve_parameter_references, splice_transforms,
};
use crate::source::{collect_parameters, ParameterSource, Parameters, TemplateStore};
use crate::substitution::{substitute_literals, SubstitutionMap};
use crate::validation::{find_orphans, orphan_report};

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Parameter name bound to the project identity when the caller omits it
pub const PROJECT_NAME_PARAMETER: &str = "ProjectName";

#[derive(Debug, Clone)]
pub struct MacroSettings {
    pub project_name: String,
    pub token_prefix: String,
    pub parameter_path: String,
    pub orphan_sentinel: String,
    pub random_placeholder: String,
    pub random_suffix_length: usize,
    pub template_prefix: String,
    pub s3_transform: bool,
}

impl MacroSettings {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let macro_config = &config.template_macro;
        Self {
            project_name: config.project.name.clone(),
            token_prefix: macro_config.token_prefix.clone(),
            parameter_path: macro_config.parameter_path_for(&config.project.name),
            orphan_sentinel: macro_config.orphan_sentinel.clone(),
            random_placeholder: macro_config.random_placeholder.clone(),
            random_suffix_length: macro_config.random_suffix_length,
            template_prefix: config.storage.template_prefix.clone(),
            s3_transform: macro_config.s3_transform,
        }
    }

    /// `<prefix>PROJECT_NAME`
    pub fn project_token(&self) -> String {
        format!("{}PROJECT_NAME", self.token_prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ValidationFailed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Status string for the macro response: `success` or the failure reason
    pub fn status(&self) -> &str {
        match self {
            Outcome::Success => "success",
            Outcome::ValidationFailed(reason) => reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transformed {
    pub fragment: Value,
    pub outcome: Outcome,
}

/// Per-pass counters, logged once per invocation
#[derive(Debug, Default, Clone, Copy)]
pub struct PassStats {
    pub literals: usize,
    pub ssm_references: usize,
    pub s3_transforms: usize,
    pub suffixed_values: usize,
    pub suffixed_keys: usize,
}

pub struct MacroEngine {
    settings: MacroSettings,
    parameters: Arc<dyn ParameterSource>,
    templates: Option<Arc<dyn TemplateStore>>,
    env_tokens: Vec<(String, String)>,
}

impl MacroEngine {
    pub fn new(settings: MacroSettings, parameters: Arc<dyn ParameterSource>) -> Self {
        Self {
            settings,
            parameters,
            templates: None,
            env_tokens: Vec::new(),
        }
    }

    pub fn with_template_store(mut self, templates: Arc<dyn TemplateStore>) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Tokens taken verbatim from the host environment (see
    /// [`crate::substitution::env_tokens`]); parameter store entries win on
    /// conflict.
    pub fn with_env_tokens(mut self, tokens: Vec<(String, String)>) -> Self {
        self.env_tokens = tokens;
        self
    }

    pub fn settings(&self) -> &MacroSettings {
        &self.settings
    }

    /// Environment tokens, then the project identity, then every parameter
    /// under the project namespace.
    pub async fn build_substitution_map(&self) -> Result<SubstitutionMap, MacroError> {
        let mut map = SubstitutionMap::new();
        for (token, value) in &self.env_tokens {
            map.insert(token.clone(), value.clone());
        }
        map.insert(self.settings.project_token(), self.settings.project_name.clone());

        let stored =
            collect_parameters(self.parameters.as_ref(), &self.settings.parameter_path).await?;
        for parameter in stored {
            map.insert_parameter(
                &self.settings.token_prefix,
                &self.settings.parameter_path,
                parameter,
            );
        }

        info!(
            tokens = map.len(),
            secrets = map.secret_count(),
            path = %self.settings.parameter_path,
            "Built substitution map"
        );
        debug!(tokens = ?map.redacted(), "Substitution map contents");
        Ok(map)
    }

    /// Transform with a freshly generated random suffix.
    pub async fn transform(
        &self,
        fragment: Value,
        parameters: Parameters,
    ) -> Result<Transformed, MacroError> {
        let suffix = random_suffix(self.settings.random_suffix_length);
        self.transform_with_suffix(fragment, parameters, &suffix)
            .await
    }

    pub async fn transform_with_suffix(
        &self,
        mut fragment: Value,
        mut parameters: Parameters,
        suffix: &str,
    ) -> Result<Transformed, MacroError> {
        parameters
            .entry(PROJECT_NAME_PARAMETER)
            .or_insert_with(|| Value::String(self.settings.project_name.clone()));

        let map = self.build_substitution_map().await?;
        let mut stats = PassStats {
            literals: substitute_literals(&mut fragment, &map),
            ssm_references: resolve_parameter_references(&mut fragment, &parameters, &map),
            ..PassStats::default()
        };

        if self.settings.s3_transform {
            stats.s3_transforms = self.apply_s3_transforms(&mut fragment, &parameters).await?;
        }

        let placeholder = &self.settings.random_placeholder;
        stats.suffixed_values = replace_literal(&mut fragment, placeholder, suffix);
        stats.suffixed_keys = rename_keys(&mut fragment, placeholder, suffix);

        info!(
            literals = stats.literals,
            ssm_references = stats.ssm_references,
            s3_transforms = stats.s3_transforms,
            suffixed_values = stats.suffixed_values,
            suffixed_keys = stats.suffixed_keys,
            suffix = %suffix,
            "Applied macro passes"
        );

        let orphans = find_orphans(&fragment, &self.settings.orphan_sentinel)?;
        let outcome = if orphans.is_empty() {
            Outcome::Success
        } else {
            warn!(orphans = ?orphans, "Fragment still contains unresolved tokens");
            Outcome::ValidationFailed(orphan_report(&orphans))
        };

        Ok(Transformed { fragment, outcome })
    }

    /// Fetch every referenced document before touching the tree, so a failed
    /// fetch leaves nothing half-spliced.
    async fn apply_s3_transforms(
        &self,
        fragment: &mut Value,
        parameters: &Parameters,
    ) -> Result<usize, MacroError> {
        let names = collect_transform_names(fragment, parameters);
        if names.is_empty() {
            return Ok(0);
        }

        let Some(store) = self.templates.as_ref() else {
            warn!(
                references = names.len(),
                "Fragment has S3 transforms but no template store is configured"
            );
            return Ok(0);
        };

        let mut fetched = HashMap::with_capacity(names.len());
        for name in names {
            let key = format!("{}{}", self.settings.template_prefix, name);
            debug!(key = %key, "Fetching template transform");
            let document = store.fetch_json(&key).await?;
            fetched.insert(name, document);
        }

        Ok(splice_transforms(fragment, parameters, &fetched))
    }
}

/// Lowercase alphanumeric suffix; safe in logical ids and bucket names alike.
pub fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use phoenix_config::Platform;

    #[test]
    fn random_suffix_shape() {
        let suffix = random_suffix(12);
        assert_eq!(suffix.len(), 12);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(random_suffix(0).is_empty());
    }

    #[test]
    fn settings_from_config() {
        let mut config = RuntimeConfig::from_platform_defaults(Platform::Lambda);
        config.project.name = "shop".to_string();

        let settings = MacroSettings::from_config(&config);
        assert_eq!(settings.parameter_path, "/shop/");
        assert_eq!(settings.project_token(), "PHX_MACRO_PROJECT_NAME");
        assert_eq!(settings.template_prefix, "cloudformation/");
        assert!(settings.s3_transform);
    }

    #[test]
    fn outcome_status_strings() {
        assert_eq!(Outcome::Success.status(), "success");
        let failed = Outcome::ValidationFailed("bad".to_string());
        assert_eq!(failed.status(), "bad");
        assert!(!failed.is_success());
    }
}

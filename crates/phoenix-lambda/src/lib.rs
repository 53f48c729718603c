// AWS Lambda adapter for the CloudFormation template macro
//
// Configuration and AWS clients are built once per cold start and shared by
// every invocation. lambda_runtime provides the tokio runtime.

use std::sync::Arc;

use anyhow::Context;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use phoenix_aws::{load_sdk_config, OpenDalTemplateStore, SsmParameterSource};
use phoenix_config::{LogFormat, LoggingConfig, RuntimeConfig};
use phoenix_core::substitution::env_tokens;
use phoenix_core::{MacroEngine, MacroSettings};
use tracing::{info, warn};

mod envelope;

pub use envelope::{MacroRequest, MacroResponse};

/// Run one macro invocation. Transport failures abort the invocation;
/// unresolved tokens come back as a non-success status.
pub async fn handle_macro(
    engine: &MacroEngine,
    request: MacroRequest,
) -> Result<MacroResponse, Error> {
    info!(
        request_id = %request.request_id,
        transform_id = request.transform_id.as_deref().unwrap_or("-"),
        parameters = request.template_parameter_values.len(),
        "Processing macro request"
    );

    let transformed = engine
        .transform(request.fragment, request.template_parameter_values)
        .await?;

    if !transformed.outcome.is_success() {
        warn!(
            request_id = %request.request_id,
            status = transformed.outcome.status(),
            "Macro transform failed validation"
        );
    }

    Ok(MacroResponse::from_transformed(
        request.request_id,
        transformed,
    ))
}

async fn handle_request(
    event: LambdaEvent<MacroRequest>,
    engine: Arc<MacroEngine>,
) -> Result<MacroResponse, Error> {
    let (request, _context) = event.into_parts();
    handle_macro(&engine, request).await
}

/// Lambda runtime entry point
pub async fn run() -> Result<(), Error> {
    let config = RuntimeConfig::load()
        .context("Failed to load configuration")
        .map_err(|e| Error::from(format!("{:#}", e)))?;
    init_tracing(&config.logging());

    config
        .validate_for_macro()
        .map_err(|e| Error::from(format!("{:#}", e)))?;

    info!(
        git_hash = env!("GIT_HASH"),
        build_timestamp = env!("BUILD_TIMESTAMP"),
        project = %config.project.name,
        "Starting template macro"
    );

    let engine = Arc::new(build_engine(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<MacroRequest>| {
        let engine = engine.clone();
        async move { handle_request(event, engine).await }
    }))
    .await
}

async fn build_engine(config: &RuntimeConfig) -> Result<MacroEngine, Error> {
    let settings = MacroSettings::from_config(config);
    let sdk_config = load_sdk_config(config.storage.region.as_deref()).await;

    let mut engine = MacroEngine::new(settings, Arc::new(SsmParameterSource::new(&sdk_config)));

    if config.template_macro.s3_transform {
        // validate_for_macro guarantees both are set when transforms are on
        let bucket = config.storage.bucket.as_deref().unwrap_or_default();
        let region = config.storage.region.as_deref().unwrap_or_default();
        let store = OpenDalTemplateStore::new_s3(bucket, region, config.storage.endpoint.as_deref())
            .map_err(|e| Error::from(format!("Failed to initialize template store: {}", e)))?;
        engine = engine.with_template_store(Arc::new(store));
    }

    if config.template_macro.import_env_tokens {
        let tokens = env_tokens(std::env::vars(), &config.template_macro.token_prefix);
        info!(count = tokens.len(), "Imported macro tokens from environment");
        engine = engine.with_env_tokens(tokens);
    }

    Ok(engine)
}

fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&logging.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    // CloudWatch adds its own timestamps and colours are noise there
    let _ = match logging.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().without_time()),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_ansi(false).without_time()),
        ),
    };
}

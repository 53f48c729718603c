use anyhow::{Context, Result};
use clap::Parser;
use phoenix::{init_tracing, render_template, rotate_stack, RotationOptions, RotationParams};
use phoenix_aws::{load_sdk_config, CloudFormationTemplates};
use phoenix_config::RuntimeConfig;
use std::io::Write;
use std::path::PathBuf;

/// Rotate API Gateway deployment stages for a Phoenix project
#[derive(Parser)]
#[command(name = "phoenix")]
#[command(version)]
#[command(
    about = "Adds a new API Gateway deployment stage, evicting the oldest ones",
    long_about = None
)]
struct Cli {
    /// Parameters file with Parameters.ProjectName and Parameters.Environment
    #[arg(value_name = "PARAMS_FILE")]
    params_file: PathBuf,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stages kept after rotation (overrides config file)
    #[arg(short = 'm', long, value_name = "N")]
    max_stages: Option<usize>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    // Parameters first: a broken file should fail before any AWS call
    let params = RotationParams::read(&cli.params_file)?;

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig::load().context("Failed to load configuration")?,
    };
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    init_tracing(&config.logging());

    let sdk_config = load_sdk_config(config.storage.region.as_deref()).await;
    let templates = CloudFormationTemplates::new(&sdk_config);
    let options = RotationOptions {
        token_prefix: config.template_macro.token_prefix.clone(),
        max_stages: config.rotation.max_stages,
    };

    let rotated = rotate_stack(&params, &templates, &options).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(render_template(&rotated)?.as_bytes())
        .context("Failed to write template to stdout")?;
    Ok(())
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(max_stages) = cli.max_stages {
        config.rotation.max_stages = max_stages;
    }

    if let Some(level) = &cli.log_level {
        let mut logging = config.logging();
        logging.log_level = level.clone();
        config.logging = Some(logging);
    }
}

// Platform detection based on environment variables
//
// - AWS Lambda: AWS_LAMBDA_FUNCTION_NAME env var present (macro function)
// - Cli: anything else (rotation tool run from a build job or a laptop)

use std::env;

use crate::LogFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Cli,
    Lambda,
}

impl Platform {
    /// Auto-detect the current platform based on environment variables
    pub fn detect() -> Self {
        if env::var("AWS_LAMBDA_FUNCTION_NAME").is_ok() {
            Platform::Lambda
        } else {
            Platform::Cli
        }
    }

    /// Get platform-specific defaults
    pub fn defaults(&self) -> PlatformDefaults {
        match self {
            // CloudWatch Logs indexes JSON lines, so the function logs structured output
            Platform::Lambda => PlatformDefaults {
                log_level: "info",
                log_format: LogFormat::Json,
            },
            Platform::Cli => PlatformDefaults {
                log_level: "warn",
                log_format: LogFormat::Text,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlatformDefaults {
    pub log_level: &'static str,
    pub log_format: LogFormat,
}

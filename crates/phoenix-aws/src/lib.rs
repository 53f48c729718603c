// phoenix-aws - AWS-backed collaborators for the Phoenix engines
//
// Each adapter implements one of the read-only traits from
// `phoenix_core::source`. Clients are built once per process and shared.

mod cloudformation;
mod ssm;
mod storage;

pub use cloudformation::CloudFormationTemplates;
pub use ssm::SsmParameterSource;
pub use storage::OpenDalTemplateStore;

use aws_config::{BehaviorVersion, SdkConfig};

/// Shared SDK configuration. `region` overrides the default provider chain.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    loader.load().await
}

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

/// AWS settings for a single launch, shared by every client the launch builds.
///
/// Region and credential profile are fixed at construction; nothing here is
/// process-global.
#[derive(Clone, Debug)]
pub struct AwsContext {
    sdk_config: SdkConfig,
}

impl AwsContext {
    pub async fn load(region: &str, profile: Option<&str>) -> Self {
        info!(region, profile = profile.unwrap_or("default"), "Loading AWS configuration");

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        AwsContext {
            sdk_config: loader.load().await,
        }
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }
}

//! Typed view of the `serverless.yml` service descriptor.
//!
//! Only the handful of fields the console needs are read. Everything else in
//! the file is ignored. Required fields are checked up front and every problem
//! is reported in a single [`Error::ConfigValidation`].

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{ConfigValue, Error, Result};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_CONFIG_FILE: &str = "serverless.yml";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub enum AuthenticationType {
    #[serde(rename = "AMAZON_COGNITO_USER_POOLS")]
    CognitoUserPools,
    #[serde(rename = "API_KEY")]
    ApiKey,
    #[serde(rename = "AWS_IAM")]
    AwsIam,
    #[serde(rename = "OPENID_CONNECT")]
    OpenIdConnect,
    #[serde(rename = "AWS_LAMBDA")]
    AwsLambda,
    #[serde(other)]
    Other,
}

/// Where a launch gets its endpoint from, which decides the required fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Standalone,
    Plugin,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPoolConfig {
    pub user_pool_id: Option<ConfigValue>,
    pub graphiql_client_id: Option<ConfigValue>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSyncConfig {
    pub authentication_type: Option<AuthenticationType>,
    pub user_pool_config: Option<UserPoolConfig>,
}

impl AppSyncConfig {
    pub fn requires_user_pool_login(&self) -> bool {
        self.authentication_type == Some(AuthenticationType::CognitoUserPools)
    }

    pub fn user_pool_id(&self) -> Option<&ConfigValue> {
        self.user_pool_config.as_ref()?.user_pool_id.as_ref()
    }

    pub fn client_id(&self) -> Option<&ConfigValue> {
        self.user_pool_config.as_ref()?.graphiql_client_id.as_ref()
    }

    fn collect_problems(&self, problems: &mut Vec<String>) {
        if !self.requires_user_pool_login() {
            return;
        }
        if self.user_pool_id().is_none() {
            problems.push("custom.appSync.userPoolConfig.userPoolId is required".to_string());
        }
        if self.client_id().is_none() {
            problems
                .push("custom.appSync.userPoolConfig.graphiqlClientId is required".to_string());
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Plain(String),
    Named { name: String },
}

#[derive(Clone, Debug, Default, Deserialize)]
struct ProviderSection {
    region: Option<String>,
    stage: Option<String>,
    profile: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct OutputSection {
    file: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomSection {
    output: Option<OutputSection>,
    app_sync: Option<AppSyncConfig>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawDescriptor {
    service: Option<ServiceName>,
    #[serde(default)]
    provider: ProviderSection,
    #[serde(default)]
    custom: CustomSection,
}

/// The parsed service descriptor.
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    raw: RawDescriptor,
    source_path: PathBuf,
}

impl ServiceDescriptor {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading service configuration");

        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents, path)
    }

    pub fn from_yaml(contents: &str, source_path: impl Into<PathBuf>) -> Result<Self> {
        let source_path = source_path.into();
        let raw: RawDescriptor =
            serde_yaml::from_str(contents).map_err(|source| Error::ConfigParse {
                path: source_path.clone(),
                source,
            })?;
        Ok(ServiceDescriptor { raw, source_path })
    }

    /// Check everything the given mode needs, reporting all problems at once.
    pub fn validate(&self, mode: Mode) -> Result<()> {
        let mut problems = Vec::new();

        if self.service_name().is_none() {
            problems.push("service is required".to_string());
        }
        match &self.raw.custom.app_sync {
            Some(app_sync) => app_sync.collect_problems(&mut problems),
            None => problems.push("custom.appSync is required".to_string()),
        }
        if mode == Mode::Standalone && self.output_file().is_none() {
            problems.push("custom.output.file is required".to_string());
        }

        if problems.is_empty() {
            debug!(path = %self.source_path.display(), ?mode, "Service configuration is valid");
            Ok(())
        } else {
            Err(Error::ConfigValidation {
                path: self.source_path.clone(),
                problems,
            })
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn service_name(&self) -> Option<&str> {
        let name = match self.raw.service.as_ref()? {
            ServiceName::Plain(name) => name,
            ServiceName::Named { name } => name,
        };
        Some(name.as_str()).filter(|n| !n.is_empty())
    }

    pub fn region(&self) -> &str {
        self.raw.provider.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn stage(&self) -> &str {
        self.raw.provider.stage.as_deref().unwrap_or(DEFAULT_STAGE)
    }

    pub fn profile(&self) -> Option<&str> {
        self.raw.provider.profile.as_deref()
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.raw.custom.output.as_ref()?.file.as_deref()
    }

    pub fn app_sync(&self) -> Option<&AppSyncConfig> {
        self.raw.custom.app_sync.as_ref()
    }

    /// Build the host context the `graphiql` command runs with. `stage` and
    /// `region` override the values from the descriptor.
    pub fn host_context(&self, stage: Option<&str>, region: Option<&str>) -> Result<HostContext> {
        self.validate(Mode::Plugin)?;
        let missing = |field: &str| Error::ConfigValidation {
            path: self.source_path.clone(),
            problems: vec![format!("{} is required", field)],
        };

        Ok(HostContext {
            service_name: self.service_name().ok_or_else(|| missing("service"))?.to_string(),
            stage: stage.unwrap_or(self.stage()).to_string(),
            region: region.unwrap_or(self.region()).to_string(),
            profile: self.profile().map(str::to_string),
            app_sync: self
                .app_sync()
                .cloned()
                .ok_or_else(|| missing("custom.appSync"))?,
        })
    }

    /// Stack the service deploys to, `<service>-<stage>`.
    pub fn stack_name(&self) -> Option<String> {
        Some(format!("{}-{}", self.service_name()?, self.stage()))
    }
}

/// What the host deployment tool hands the `graphiql` command.
#[derive(Clone, Debug)]
pub struct HostContext {
    pub service_name: String,
    pub stage: String,
    pub region: String,
    pub profile: Option<String>,
    pub app_sync: AppSyncConfig,
}

impl HostContext {
    pub fn stack_name(&self) -> String {
        format!("{}-{}", self.service_name, self.stage)
    }
}

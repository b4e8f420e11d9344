pub mod aws;
pub mod cli;
pub mod config;
pub mod console;
pub mod credential_obtainer;
pub mod endpoint_resolver;
pub mod error;
pub mod identity_provider;
pub mod pipeline;
pub mod stack_inventory;
pub mod telemetry;
pub mod value_resolver;

pub use config::{AppSyncConfig, AuthenticationType, HostContext, ServiceDescriptor};
pub use console::{ConsoleLauncher, GraphiqlConsole, SystemBrowser};
pub use credential_obtainer::CredentialObtainer;
pub use endpoint_resolver::EndpointResolver;
pub use error::{Error, Result};
pub use identity_provider::{CognitoIdentityProvider, IdentityProvider};
pub use pipeline::{LaunchPlan, Pipeline};
pub use stack_inventory::{CloudFormationInventory, StackInventory};
pub use value_resolver::ValueResolver;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::fmt;

/// Stack output (and output file key) holding the AppSync endpoint.
pub const GRAPHQL_API_URL: &str = "GraphQlApiUrl";

pub const DEFAULT_PORT: u16 = 3000;

/// A configuration value that is either used as-is or names a resource in the
/// deployed stack.
///
/// References are accepted both as `Ref: Name` and as the short-form
/// `!Ref Name` tag. Any other intrinsic (`!GetAtt`, `Fn::Join`, ...) is kept
/// as `Unsupported` so resolution can report it.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Literal(String),
    StackResourceRef { logical_id: String },
    Unsupported(Value),
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ConfigValue::from_yaml)
    }
}

impl ConfigValue {
    pub fn literal(value: impl Into<String>) -> Self {
        ConfigValue::Literal(value.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        ConfigValue::StackResourceRef {
            logical_id: logical_id.into(),
        }
    }

    fn from_yaml(value: Value) -> Self {
        match value {
            Value::String(literal) => ConfigValue::Literal(literal),
            Value::Mapping(ref mapping) => match mapping.get("Ref") {
                Some(Value::String(logical_id)) => ConfigValue::reference(logical_id.as_str()),
                _ => ConfigValue::Unsupported(value),
            },
            Value::Tagged(ref tagged) => match (&tagged.value, tagged.tag == "Ref") {
                (Value::String(logical_id), true) => ConfigValue::reference(logical_id.as_str()),
                _ => ConfigValue::Unsupported(value),
            },
            other => ConfigValue::Unsupported(other),
        }
    }
}

/// Username and password handed over on the command line. Empty strings count
/// as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    username: Option<String>,
    password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Credentials {
            username: username.filter(|u| !u.is_empty()),
            password: password.filter(|p| !p.is_empty()),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Header the console attaches to every request it sends upstream.
///
/// Rendered as the literal `"Authorization": "<token>"` fragment, which is
/// spliced straight into the console's fetch headers.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    token: String,
}

impl AuthHeader {
    pub const NAME: &'static str = "Authorization";

    pub fn from_id_token(token: impl Into<String>) -> Self {
        AuthHeader {
            token: token.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.token
    }

    pub fn pass_header(&self) -> String {
        format!("\"{}\": \"{}\"", Self::NAME, self.token)
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &Self::NAME)
            .field("token_len", &self.token.len())
            .finish()
    }
}

impl fmt::Display for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pass_header())
    }
}

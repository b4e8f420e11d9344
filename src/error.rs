use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way a launch can fail. None of these are retried; the launch sequence
/// stops at the first one and the console is never started.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{field}: Ref \"{reference}\" not found in stack {stack_name}")]
    Resolution {
        field: String,
        reference: String,
        stack_name: String,
    },

    #[error("{field} not recognised: {value}")]
    UnsupportedReference { field: String, value: String },

    #[error("Username and Password required for authentication type (missing {missing})")]
    MissingCredentials { missing: &'static str },

    #[error("Authentication Failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Unsupported output file format: {path} (expected .json, .yml or .yaml)")]
    UnsupportedOutputFormat { path: PathBuf },

    #[error("{path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{name}: Output not found in stack {stack_name}")]
    OutputNotFound { name: String, stack_name: String },

    #[error("Stack {stack_name} not found")]
    StackNotFound { stack_name: String },

    #[error("Expected exactly one stack named {stack_name}, found {count}")]
    AmbiguousStack { stack_name: String, count: usize },

    #[error("Invalid configuration in {path}: {}", problems.join("; "))]
    ConfigValidation {
        path: PathBuf,
        problems: Vec<String>,
    },

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read output file {path}: {source}")]
    OutputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse output file {path}: {message}")]
    OutputParse { path: PathBuf, message: String },

    #[error("{service} request failed: {message}")]
    Provider {
        service: &'static str,
        message: String,
    },

    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn provider(service: &'static str, message: impl Into<String>) -> Self {
        Error::Provider {
            service,
            message: message.into(),
        }
    }
}

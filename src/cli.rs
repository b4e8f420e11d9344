use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::{Credentials, DEFAULT_PORT, config::DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(
    name = "appsync-graphiql",
    version,
    about = "Run a graphiql server using serverless config",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Cognito username
    pub username: Option<String>,

    /// Cognito password
    pub password: Option<String>,

    /// Serverless config file (yml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Port to serve GraphiQL on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

// `args_conflicts_with_subcommands` makes a leading `graphiql` positional the subcommand.
const GRAPHIQL_USERNAME_NOTE: &str = "Note: a standalone username of `graphiql` is read as this \
subcommand. Log in as that user with `appsync-graphiql graphiql -u graphiql -p <password>`.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a graphiql server using appsync config and the deployed stack
    #[command(after_help = GRAPHIQL_USERNAME_NOTE)]
    Graphiql(GraphiqlArgs),
}

#[derive(Debug, Args)]
pub struct GraphiqlArgs {
    /// Specify your cognito username
    #[arg(short, long)]
    pub username: Option<String>,

    /// Specify your cognito password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Specify graphiql port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Stage of the deployed service (defaults to provider.stage)
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Region of the deployed service (defaults to provider.region)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Serverless config file (yml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl GraphiqlArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

/// What a parsed command line asks for.
#[derive(Debug)]
pub enum Invocation {
    Standalone {
        config: PathBuf,
        credentials: Credentials,
        port: u16,
    },
    Plugin(GraphiqlArgs),
    Help,
}

impl Cli {
    pub fn into_invocation(self) -> Invocation {
        match self.command {
            Some(Command::Graphiql(args)) => Invocation::Plugin(args),
            None => match (self.username, self.password) {
                (Some(username), Some(password)) => Invocation::Standalone {
                    config: self.config,
                    credentials: Credentials::new(Some(username), Some(password)),
                    port: self.port,
                },
                _ => Invocation::Help,
            },
        }
    }
}

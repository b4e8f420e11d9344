use std::{env, path::PathBuf, process::ExitCode};

use appsync_graphiql::{
    CloudFormationInventory, CognitoIdentityProvider, Credentials, Error, GraphiqlConsole,
    Pipeline, Result, ServiceDescriptor,
    aws::AwsContext,
    cli::{Cli, GraphiqlArgs, Invocation},
    telemetry,
};
use clap::{CommandFactory, Parser};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();

    let result = match Cli::parse().into_invocation() {
        Invocation::Help => {
            let _ = Cli::command().print_help();
            return ExitCode::SUCCESS;
        }
        Invocation::Standalone {
            config,
            credentials,
            port,
        } => run_standalone(config, credentials, port).await,
        Invocation::Plugin(args) => run_graphiql(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::AuthenticationFailed { reason }) => {
            error!(reason = reason.as_str(), "Authentication failed");
            println!("Login Failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Launch failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_standalone(
    config: PathBuf,
    credentials: Credentials,
    port: u16,
) -> Result<()> {
    let cwd = env::current_dir()?;
    let descriptor = ServiceDescriptor::load_from_path(cwd.join(config))?;

    let aws = AwsContext::load(descriptor.region(), descriptor.profile()).await;
    let inventory = CloudFormationInventory::new(&aws);
    let identity = CognitoIdentityProvider::new(&aws);
    let console = GraphiqlConsole::default();

    Pipeline::new(&inventory, &identity, &console)
        .run_standalone(&descriptor, &cwd, &credentials, port)
        .await
}

async fn run_graphiql(args: GraphiqlArgs) -> Result<()> {
    let cwd = env::current_dir()?;
    let descriptor = ServiceDescriptor::load_from_path(cwd.join(&args.config))?;
    let host = descriptor.host_context(args.stage.as_deref(), args.region.as_deref())?;

    let aws = AwsContext::load(&host.region, host.profile.as_deref()).await;
    let inventory = CloudFormationInventory::new(&aws);
    let identity = CognitoIdentityProvider::new(&aws);
    let console = GraphiqlConsole::default();

    Pipeline::new(&inventory, &identity, &console)
        .run_live(&host, &args.credentials(), args.port)
        .await
}

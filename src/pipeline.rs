//! Wires the resolvers together for both launch modes.
//!
//! Endpoint and credential resolution share nothing, so they run side by side
//! and must both succeed before the console is started.

use futures::future::try_join;
use std::path::Path;
use tracing::{info, instrument};

use crate::{
    AuthHeader, Credentials, Error, GRAPHQL_API_URL, Result,
    config::{HostContext, Mode, ServiceDescriptor},
    console::ConsoleLauncher,
    credential_obtainer::CredentialObtainer,
    endpoint_resolver::EndpointResolver,
    identity_provider::IdentityProvider,
    stack_inventory::StackInventory,
    value_resolver::ValueResolver,
};

/// Everything the console needs, fixed once resolution is done.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchPlan {
    pub endpoint: String,
    pub auth_header: Option<AuthHeader>,
}

pub struct Pipeline<'a> {
    inventory: &'a dyn StackInventory,
    identity: &'a dyn IdentityProvider,
    launcher: &'a dyn ConsoleLauncher,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        inventory: &'a dyn StackInventory,
        identity: &'a dyn IdentityProvider,
        launcher: &'a dyn ConsoleLauncher,
    ) -> Self {
        Pipeline {
            inventory,
            identity,
            launcher,
        }
    }

    /// Endpoint from the deployment-output file named in the descriptor.
    /// Relative output paths are taken from `base_dir`.
    #[instrument(skip_all, fields(config = %descriptor.source_path().display()))]
    pub async fn resolve_standalone(
        &self,
        descriptor: &ServiceDescriptor,
        base_dir: &Path,
        credentials: &Credentials,
    ) -> Result<LaunchPlan> {
        descriptor.validate(Mode::Standalone)?;

        let invalid = |problem: &str| Error::ConfigValidation {
            path: descriptor.source_path().to_path_buf(),
            problems: vec![problem.to_string()],
        };
        let output_file = base_dir.join(
            descriptor
                .output_file()
                .ok_or_else(|| invalid("custom.output.file is required"))?,
        );
        let stack_name = descriptor
            .stack_name()
            .ok_or_else(|| invalid("service is required"))?;
        let app_sync = descriptor
            .app_sync()
            .ok_or_else(|| invalid("custom.appSync is required"))?;

        let obtainer = CredentialObtainer::new(
            ValueResolver::new(self.inventory, &stack_name),
            self.identity,
        );

        let (auth_header, endpoint) = try_join(
            obtainer.obtain_auth_header(app_sync, credentials),
            async { EndpointResolver::from_output_file(&output_file) },
        )
        .await?;

        Ok(LaunchPlan {
            endpoint,
            auth_header,
        })
    }

    /// Endpoint from the live stack's `GraphQlApiUrl` output.
    #[instrument(skip_all, fields(stack = %host.stack_name()))]
    pub async fn resolve_live(
        &self,
        host: &HostContext,
        credentials: &Credentials,
    ) -> Result<LaunchPlan> {
        let stack_name = host.stack_name();
        let obtainer = CredentialObtainer::new(
            ValueResolver::new(self.inventory, &stack_name),
            self.identity,
        );

        // Header first: missing credentials must fail before describe_stacks runs.
        let (auth_header, endpoint) = try_join(
            obtainer.obtain_auth_header(&host.app_sync, credentials),
            EndpointResolver::from_stack_output(self.inventory, &stack_name, GRAPHQL_API_URL),
        )
        .await?;

        Ok(LaunchPlan {
            endpoint,
            auth_header,
        })
    }

    pub async fn launch(&self, plan: &LaunchPlan, port: u16) -> Result<()> {
        info!(
            endpoint = plan.endpoint.as_str(),
            port,
            authorized = plan.auth_header.is_some(),
            "Starting console"
        );
        self.launcher
            .launch(&plan.endpoint, plan.auth_header.as_ref(), port)
            .await
    }

    pub async fn run_standalone(
        &self,
        descriptor: &ServiceDescriptor,
        base_dir: &Path,
        credentials: &Credentials,
        port: u16,
    ) -> Result<()> {
        let plan = self
            .resolve_standalone(descriptor, base_dir, credentials)
            .await?;
        self.launch(&plan, port).await
    }

    pub async fn run_live(
        &self,
        host: &HostContext,
        credentials: &Credentials,
        port: u16,
    ) -> Result<()> {
        let plan = self.resolve_live(host, credentials).await?;
        self.launch(&plan, port).await
    }
}

use futures::future::try_join;
use tracing::{debug, info};

use crate::{
    AuthHeader, ConfigValue, Credentials, Error, Result,
    config::AppSyncConfig,
    identity_provider::{AdminAuthRequest, IdentityProvider},
    value_resolver::ValueResolver,
};

pub struct CredentialObtainer<'a> {
    resolver: ValueResolver<'a>,
    identity: &'a dyn IdentityProvider,
}

impl<'a> CredentialObtainer<'a> {
    pub fn new(resolver: ValueResolver<'a>, identity: &'a dyn IdentityProvider) -> Self {
        CredentialObtainer { resolver, identity }
    }

    /// Log in against the user pool when the API is protected by one.
    ///
    /// Returns `None` for every other authentication type without touching the
    /// network. Credentials are checked before anything is resolved.
    pub async fn obtain_auth_header(
        &self,
        app_sync: &AppSyncConfig,
        credentials: &Credentials,
    ) -> Result<Option<AuthHeader>> {
        if !app_sync.requires_user_pool_login() {
            debug!("API does not use user pool auth; no header needed");
            return Ok(None);
        }

        let username = credentials
            .username()
            .ok_or(Error::MissingCredentials { missing: "username" })?;
        let password = credentials
            .password()
            .ok_or(Error::MissingCredentials { missing: "password" })?;

        let (user_pool_id, client_id) = try_join(
            self.resolve_required("userPoolId", app_sync.user_pool_id()),
            self.resolve_required("graphiqlClientId", app_sync.client_id()),
        )
        .await?;

        let result = self
            .identity
            .admin_initiate_auth(AdminAuthRequest {
                user_pool_id: &user_pool_id,
                client_id: &client_id,
                username,
                password,
            })
            .await?
            .ok_or_else(|| Error::AuthenticationFailed {
                reason: "no authentication result returned".to_string(),
            })?;

        let id_token = result
            .id_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::AuthenticationFailed {
                reason: "authentication result has no id token".to_string(),
            })?;

        info!(username, user_pool_id = user_pool_id.as_str(), "Logged in");
        Ok(Some(AuthHeader::from_id_token(id_token)))
    }

    async fn resolve_required(&self, field: &str, value: Option<&ConfigValue>) -> Result<String> {
        let value = value.ok_or_else(|| Error::ConfigValidation {
            path: "custom.appSync.userPoolConfig".into(),
            problems: vec![format!("{} is required", field)],
        })?;
        self.resolver.resolve(field, value).await
    }
}

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::{error::DisplayErrorContext, types::AuthFlowType};
use tracing::{debug, warn};

use crate::{Error, Result, aws::AwsContext};

const SERVICE: &str = "CognitoIdentityProvider";

/// Parameters for an `ADMIN_NO_SRP_AUTH` login.
#[derive(Clone, Copy)]
pub struct AdminAuthRequest<'a> {
    pub user_pool_id: &'a str,
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Log the user in on their behalf. `Ok(None)` means the provider returned
    /// no authentication result: bad credentials, unknown user, or a challenge.
    async fn admin_initiate_auth(
        &self,
        request: AdminAuthRequest<'_>,
    ) -> Result<Option<AuthenticationResult>>;
}

pub struct CognitoIdentityProvider {
    client: aws_sdk_cognitoidentityprovider::Client,
}

impl CognitoIdentityProvider {
    pub fn new(context: &AwsContext) -> Self {
        CognitoIdentityProvider {
            client: aws_sdk_cognitoidentityprovider::Client::new(context.sdk_config()),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn admin_initiate_auth(
        &self,
        request: AdminAuthRequest<'_>,
    ) -> Result<Option<AuthenticationResult>> {
        debug!(
            user_pool_id = request.user_pool_id,
            client_id = request.client_id,
            username = request.username,
            "Initiating admin auth"
        );

        let response = self
            .client
            .admin_initiate_auth()
            .auth_flow(AuthFlowType::AdminNoSrpAuth)
            .user_pool_id(request.user_pool_id)
            .client_id(request.client_id)
            .auth_parameters("USERNAME", request.username)
            .auth_parameters("PASSWORD", request.password)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(err) => {
                let rejected = err.as_service_error().is_some_and(|e| {
                    e.is_not_authorized_exception() || e.is_user_not_found_exception()
                });
                if rejected {
                    warn!(username = request.username, "Cognito rejected the login");
                    return Ok(None);
                }
                return Err(Error::provider(SERVICE, DisplayErrorContext(&err).to_string()));
            }
        };

        if let Some(challenge) = output.challenge_name() {
            warn!(challenge = challenge.as_str(), "Login requires a challenge response");
        }

        Ok(output.authentication_result().map(|result| AuthenticationResult {
            id_token: result.id_token().map(str::to_string),
            access_token: result.access_token().map(str::to_string),
        }))
    }
}

//! Reqwest-backed identity provider over the Identity Toolkit REST API.
//!
//! The adapter keeps the signed-in session (account id and ID token) in
//! memory and publishes identity changes on a `watch` channel. The ID
//! token doubles as the bearer token for document store requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    AccountResponseDto, ErrorEnvelopeDto, PasswordRequestDto, UpdateProfileRequestDto,
};
use crate::domain::ports::{IdentityProvider, IdentityProviderError};
use crate::domain::{DisplayName, SignInCredentials, UserId, UserIdentity};
use crate::outbound::firestore::AccessTokenSource;

/// Connection settings for the Identity Toolkit API.
#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    /// API root, e.g. `https://identitytoolkit.googleapis.com`.
    pub endpoint: Url,
    /// Web API key of the project.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

struct Session {
    user_id: UserId,
    id_token: Zeroizing<String>,
}

/// [`IdentityProvider`] backed by the hosted Identity Toolkit service.
pub struct IdentityToolkitProvider {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    session: RwLock<Option<Session>>,
    identity: watch::Sender<Option<UserIdentity>>,
}

impl IdentityToolkitProvider {
    /// Build a provider using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let (identity, _) = watch::channel(None);
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: Zeroizing::new(config.api_key),
            session: RwLock::new(None),
            identity,
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, IdentityProviderError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                IdentityProviderError::connection(format!(
                    "identity endpoint {} cannot carry a path",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(["v1", method]);
        url.query_pairs_mut().append_pair("key", self.api_key.as_str());
        Ok(url)
    }

    async fn call<B: Serialize + Sync>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<AccountResponseDto, IdentityProviderError> {
        let response = self
            .client
            .post(self.method_url(method)?)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        serde_json::from_slice(bytes.as_ref()).map_err(|err| {
            IdentityProviderError::connection(format!("invalid identity payload: {err}"))
        })
    }

    async fn establish(
        &self,
        account: AccountResponseDto,
    ) -> Result<UserIdentity, IdentityProviderError> {
        let identity = identity_from(&account)?;
        let Some(id_token) = account.id_token else {
            return Err(IdentityProviderError::connection(
                "identity response carried no ID token",
            ));
        };
        *self.session.write().await = Some(Session {
            user_id: identity.id().clone(),
            id_token: Zeroizing::new(id_token),
        });
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }
}

fn identity_from(account: &AccountResponseDto) -> Result<UserIdentity, IdentityProviderError> {
    let id = UserId::new(account.local_id.as_str()).map_err(|err| {
        IdentityProviderError::connection(format!("identity response carried a bad id: {err}"))
    })?;
    let display_name = account
        .display_name
        .as_deref()
        .and_then(|name| DisplayName::new(name).ok());
    Ok(UserIdentity::new(id, display_name, account.email.clone()))
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    async fn create_account(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, IdentityProviderError> {
        let account = self
            .call(
                "accounts:signUp",
                &PasswordRequestDto {
                    email: credentials.email(),
                    password: credentials.password(),
                    return_secure_token: true,
                },
            )
            .await?;
        debug!(user_id = %account.local_id, "identity toolkit account created");
        self.establish(account).await
    }

    async fn set_display_name(
        &self,
        user_id: &UserId,
        display_name: &DisplayName,
    ) -> Result<UserIdentity, IdentityProviderError> {
        let id_token = {
            let session = self.session.read().await;
            match session.as_ref() {
                Some(session) if &session.user_id == user_id => session.id_token.clone(),
                _ => return Err(IdentityProviderError::no_session(user_id.to_string())),
            }
        };
        let mut account = self
            .call(
                "accounts:update",
                &UpdateProfileRequestDto {
                    id_token: id_token.as_str(),
                    display_name: display_name.as_ref(),
                    return_secure_token: true,
                },
            )
            .await?;
        if account.id_token.is_none() {
            account.id_token = Some(id_token.as_str().to_owned());
        }
        self.establish(account).await
    }

    async fn sign_in(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, IdentityProviderError> {
        let account = self
            .call(
                "accounts:signInWithPassword",
                &PasswordRequestDto {
                    email: credentials.email(),
                    password: credentials.password(),
                    return_secure_token: true,
                },
            )
            .await?;
        self.establish(account).await
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        self.session.write().await.take();
        self.identity.send_replace(None);
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.identity.subscribe()
    }
}

#[async_trait]
impl AccessTokenSource for IdentityToolkitProvider {
    async fn access_token(&self) -> Option<Zeroizing<String>> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.id_token.clone())
    }
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    IdentityProviderError::connection(error.to_string())
}

/// Map a provider error code such as `EMAIL_EXISTS` or
/// `WEAK_PASSWORD : Password should be at least 6 characters` to a message
/// fit for the user.
fn readable_rejection(raw: &str) -> String {
    let (code, detail) = raw
        .split_once(" : ")
        .map_or((raw.trim(), None), |(code, detail)| {
            (code.trim(), Some(detail.trim()))
        });
    match code {
        "EMAIL_EXISTS" => "An account already exists for this email.".to_owned(),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Incorrect email or password.".to_owned()
        }
        "INVALID_EMAIL" | "MISSING_EMAIL" => "Email address is not valid.".to_owned(),
        "MISSING_PASSWORD" => "Password must not be empty.".to_owned(),
        "WEAK_PASSWORD" => "Password should be at least 6 characters.".to_owned(),
        "USER_DISABLED" => "This account has been disabled.".to_owned(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Too many attempts. Please try again later.".to_owned()
        }
        "TOKEN_EXPIRED" | "INVALID_ID_TOKEN" | "USER_NOT_FOUND" => {
            "Your session has expired. Please sign in again.".to_owned()
        }
        "OPERATION_NOT_ALLOWED" => "Password sign-in is disabled for this project.".to_owned(),
        other => detail.map_or_else(
            || format!("Authentication failed ({other})."),
            |detail| format!("Authentication failed ({other}): {detail}"),
        ),
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    if status.is_server_error() {
        return IdentityProviderError::connection(format!("status {}", status.as_u16()));
    }
    match serde_json::from_slice::<ErrorEnvelopeDto>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            IdentityProviderError::rejected(readable_rejection(&envelope.error.message))
        }
        _ => IdentityProviderError::connection(format!(
            "status {} without an error payload",
            status.as_u16()
        )),
    }
}

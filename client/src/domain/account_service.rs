//! Account provisioning and session services.
//!
//! Sign-up is a three-step sequence against two collaborators: create the
//! provider account, give it a display name, then write the companion
//! profile document. The provider offers no transaction spanning these
//! steps, so a failure after the first leaves a half-provisioned account.
//! Such failures are reported with `details.provisioning = "incomplete"`
//! and repaired the next time the account signs in.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, UserProfile, UserProfileRepository,
    UserProfileRepositoryError,
};
use crate::domain::{
    ANONYMOUS_AUTHOR, DisplayName, DomainError, SignInCredentials, SignUpRequest, UserIdentity,
};

/// Sign-up step that failed after the account already existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProvisioningStage {
    DisplayName,
    Profile,
}

impl ProvisioningStage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::DisplayName => "display_name",
            Self::Profile => "profile",
        }
    }
}

/// Handle returned by [`AccountService::subscribe`].
///
/// Delivery stops when the handle is dropped or
/// [`IdentitySubscription::unsubscribe`] is called.
#[derive(Debug)]
pub struct IdentitySubscription {
    task: JoinHandle<()>,
}

impl IdentitySubscription {
    /// Stop delivering identity changes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for IdentitySubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Identity adapter service: sign-up, sign-in, sign-out and the current
/// identity stream.
pub struct AccountService<P, R> {
    provider: Arc<P>,
    profiles: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<P, R> Clone for AccountService<P, R> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            profiles: Arc::clone(&self.profiles),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<P, R> AccountService<P, R> {
    /// Create a new service over the given collaborators.
    pub fn new(provider: Arc<P>, profiles: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            profiles,
            clock,
        }
    }
}

impl<P, R> AccountService<P, R>
where
    P: IdentityProvider,
    R: UserProfileRepository,
{
    fn map_provider_error(error: IdentityProviderError) -> DomainError {
        match error {
            IdentityProviderError::Rejected { message } => DomainError::auth_failure(message),
            IdentityProviderError::Connection { .. } | IdentityProviderError::NoSession { .. } => {
                DomainError::auth_failure(error.to_string())
            }
        }
    }

    fn map_profile_error(error: &UserProfileRepositoryError) -> String {
        match error {
            UserProfileRepositoryError::Connection { message } => {
                format!("profile store unavailable: {message}")
            }
            UserProfileRepositoryError::Query { message } => {
                format!("profile store error: {message}")
            }
        }
    }

    fn incomplete(stage: ProvisioningStage, identity: &UserIdentity, cause: &str) -> DomainError {
        DomainError::auth_failure(format!(
            "Account created, but {} setup failed: {cause}. It will be completed at next sign-in.",
            match stage {
                ProvisioningStage::DisplayName => "display name",
                ProvisioningStage::Profile => "profile",
            }
        ))
        .with_details(json!({
            "stage": stage.as_str(),
            "provisioning": "incomplete",
            "userId": identity.id().to_string(),
        }))
    }

    /// Create an account, set its display name and write its profile.
    ///
    /// # Errors
    /// Returns [`crate::domain::ErrorCode::AuthFailure`] for any failed step;
    /// failures after account creation carry `details.stage`.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<UserIdentity, DomainError> {
        let account = self
            .provider
            .create_account(request.credentials())
            .await
            .map_err(Self::map_provider_error)?;
        info!(user_id = %account.id(), "account created");

        let identity = match self
            .provider
            .set_display_name(account.id(), request.nickname())
            .await
        {
            Ok(identity) => identity,
            Err(err) => {
                warn!(user_id = %account.id(), error = %err, "display name setup failed");
                return Err(Self::incomplete(
                    ProvisioningStage::DisplayName,
                    &account,
                    &err.to_string(),
                ));
            }
        };

        let profile = UserProfile {
            user_id: identity.id().clone(),
            email: request.credentials().email().to_owned(),
            nickname: request.nickname().to_string(),
            created_at: self.clock.utc(),
        };
        if let Err(err) = self.profiles.upsert_profile(&profile).await {
            warn!(user_id = %identity.id(), error = %err, "profile document write failed");
            return Err(Self::incomplete(
                ProvisioningStage::Profile,
                &identity,
                &Self::map_profile_error(&err),
            ));
        }

        info!(user_id = %identity.id(), "account provisioned");
        Ok(identity)
    }

    /// Sign in and repair any half-finished provisioning.
    ///
    /// # Errors
    /// Returns [`crate::domain::ErrorCode::AuthFailure`] when the provider
    /// rejects the credentials. Repair failures are logged only.
    pub async fn sign_in(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, DomainError> {
        let identity = self
            .provider
            .sign_in(credentials)
            .await
            .map_err(Self::map_provider_error)?;
        info!(user_id = %identity.id(), "signed in");
        Ok(self.repair_provisioning(identity).await)
    }

    /// End the current session. Safe to call while signed out.
    ///
    /// # Errors
    /// Returns [`crate::domain::ErrorCode::AuthFailure`] if the provider
    /// cannot be reached.
    pub async fn sign_out(&self) -> Result<(), DomainError> {
        self.provider
            .sign_out()
            .await
            .map_err(Self::map_provider_error)
    }

    /// Current identity, `None` while signed out.
    pub fn current_identity(&self) -> Option<UserIdentity> {
        self.provider.identity_changes().borrow().clone()
    }

    /// Receiver over the current identity.
    pub fn identity_changes(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.provider.identity_changes()
    }

    /// Deliver the current identity to `callback` now and again on every
    /// change until the returned handle is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F>(&self, mut callback: F) -> IdentitySubscription
    where
        F: FnMut(Option<&UserIdentity>) + Send + 'static,
    {
        let mut receiver = self.provider.identity_changes();
        let task = tokio::spawn(async move {
            let initial = receiver.borrow_and_update().clone();
            callback(initial.as_ref());
            while receiver.changed().await.is_ok() {
                let latest = receiver.borrow_and_update().clone();
                callback(latest.as_ref());
            }
        });
        IdentitySubscription { task }
    }

    async fn repair_provisioning(&self, identity: UserIdentity) -> UserIdentity {
        let existing = match self.profiles.find_profile(identity.id()).await {
            Ok(found) => found,
            Err(err) => {
                warn!(
                    user_id = %identity.id(),
                    error = %err,
                    "profile lookup failed; skipping repair"
                );
                return identity;
            }
        };

        match (existing, identity.display_name().cloned()) {
            (Some(_), Some(_)) => identity,
            (Some(profile), None) => self.restore_display_name(identity, &profile.nickname).await,
            (None, display_name) => {
                let Some(nickname) = display_name.or_else(|| fallback_nickname(&identity)) else {
                    return identity;
                };
                let profile = UserProfile {
                    user_id: identity.id().clone(),
                    email: identity.email().unwrap_or_default().to_owned(),
                    nickname: nickname.to_string(),
                    created_at: self.clock.utc(),
                };
                match self.profiles.upsert_profile(&profile).await {
                    Ok(()) => info!(user_id = %identity.id(), "missing profile document recreated"),
                    Err(err) => {
                        warn!(user_id = %identity.id(), error = %err, "profile repair failed");
                    }
                }
                if identity.display_name().is_some() {
                    identity
                } else {
                    self.restore_display_name(identity, nickname.as_ref()).await
                }
            }
        }
    }

    async fn restore_display_name(&self, identity: UserIdentity, nickname: &str) -> UserIdentity {
        let Ok(display_name) = DisplayName::new(nickname) else {
            warn!(user_id = %identity.id(), "stored nickname is not a valid display name");
            return identity;
        };
        match self
            .provider
            .set_display_name(identity.id(), &display_name)
            .await
        {
            Ok(updated) => {
                info!(user_id = %updated.id(), "display name restored");
                updated
            }
            Err(err) => {
                warn!(user_id = %identity.id(), error = %err, "display name repair failed");
                identity
            }
        }
    }
}

/// Nickname for an account that lost its profile: the email local part,
/// else the anonymous author name.
fn fallback_nickname(identity: &UserIdentity) -> Option<DisplayName> {
    identity
        .email()
        .and_then(|email| email.split('@').next())
        .and_then(|local| DisplayName::new(local).ok())
        .or_else(|| DisplayName::new(ANONYMOUS_AUTHOR).ok())
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;

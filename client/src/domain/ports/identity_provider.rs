//! Driven port for the hosted identity provider.
//!
//! The provider owns accounts, credentials and the current session. The
//! client observes the session through a `watch` channel so the current
//! identity is always readable without polling.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{DisplayName, SignInCredentials, UserId, UserIdentity};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// The provider refused the request (bad credentials, duplicate email, disabled account).
        Rejected { message: String } => "{message}",
        /// The provider could not be reached.
        Connection { message: String } => "identity provider unavailable: {message}",
        /// The operation needs a signed-in session for this account.
        NoSession { user_id: String } => "no active session for account {user_id}",
    }
}

/// Hosted identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn create_account(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, IdentityProviderError>;

    /// Set the display name of the signed-in account `user_id`.
    async fn set_display_name(
        &self,
        user_id: &UserId,
        display_name: &DisplayName,
    ) -> Result<UserIdentity, IdentityProviderError>;

    /// Sign in with email and password.
    async fn sign_in(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, IdentityProviderError>;

    /// End the current session. Succeeds when already signed out.
    async fn sign_out(&self) -> Result<(), IdentityProviderError>;

    /// Subscribe to the current identity; `None` while signed out.
    fn identity_changes(&self) -> watch::Receiver<Option<UserIdentity>>;
}

//! Process-local identity provider and profile repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{
    IdentityProvider, IdentityProviderError, UserProfile, UserProfileRepository,
    UserProfileRepositoryError,
};
use crate::domain::{DisplayName, SignInCredentials, UserId, UserIdentity};

const MIN_PASSWORD_CHARS: usize = 6;

struct Account {
    id: UserId,
    email: String,
    password: Zeroizing<String>,
    display_name: Option<DisplayName>,
}

impl Account {
    fn identity(&self) -> UserIdentity {
        UserIdentity::new(
            self.id.clone(),
            self.display_name.clone(),
            Some(self.email.clone()),
        )
    }
}

/// In-memory [`IdentityProvider`] with email/password accounts.
///
/// Rejections use the same wording as the hosted provider adapter.
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: watch::Sender<Option<UserIdentity>>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    /// Create a provider with no accounts and no session.
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
        }
    }

    fn account_key(email: &str) -> String {
        email.to_lowercase()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, IdentityProviderError> {
        if credentials.password().chars().count() < MIN_PASSWORD_CHARS {
            return Err(IdentityProviderError::rejected(
                "Password should be at least 6 characters.",
            ));
        }
        let key = Self::account_key(credentials.email());
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(&key) {
            return Err(IdentityProviderError::rejected(
                "An account already exists for this email.",
            ));
        }
        let id = UserId::new(Uuid::new_v4().simple().to_string())
            .map_err(|err| IdentityProviderError::connection(err.to_string()))?;
        let account = Account {
            id,
            email: credentials.email().to_owned(),
            password: Zeroizing::new(credentials.password().to_owned()),
            display_name: None,
        };
        let identity = account.identity();
        accounts.insert(key, account);
        drop(accounts);

        debug!(user_id = %identity.id(), "in-memory account created");
        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn set_display_name(
        &self,
        user_id: &UserId,
        display_name: &DisplayName,
    ) -> Result<UserIdentity, IdentityProviderError> {
        let signed_in = self
            .session
            .borrow()
            .as_ref()
            .is_some_and(|identity| identity.id() == user_id);
        if !signed_in {
            return Err(IdentityProviderError::no_session(user_id.to_string()));
        }

        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .values_mut()
            .find(|candidate| &candidate.id == user_id)
            .ok_or_else(|| IdentityProviderError::no_session(user_id.to_string()))?;
        account.display_name = Some(display_name.clone());
        let identity = account.identity();
        drop(accounts);

        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<UserIdentity, IdentityProviderError> {
        let accounts = self.accounts.lock().await;
        let identity = accounts
            .get(&Self::account_key(credentials.email()))
            .filter(|account| account.password.as_str() == credentials.password())
            .map(Account::identity)
            .ok_or_else(|| IdentityProviderError::rejected("Incorrect email or password."))?;
        drop(accounts);

        self.session.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityProviderError> {
        self.session.send_replace(None);
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.session.subscribe()
    }
}

/// In-memory [`UserProfileRepository`].
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProfileRepository for InMemoryProfileRepository {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        self.profiles
            .lock()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn find_profile(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        Ok(self.profiles.lock().await.get(user_id).cloned())
    }
}

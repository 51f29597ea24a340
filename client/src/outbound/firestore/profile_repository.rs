//! Firestore-backed profile repository over the `users` collection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::client::{FirestoreClient, FirestoreError};
use super::dto::{DocumentDto, Fields, ValueDto};
use crate::domain::UserId;
use crate::domain::ports::{UserProfile, UserProfileRepository, UserProfileRepositoryError};

const USERS: &str = "users";

/// [`UserProfileRepository`] over the Firestore REST API.
pub struct FirestoreProfileRepository {
    client: Arc<FirestoreClient>,
}

impl FirestoreProfileRepository {
    /// Create a repository sharing `client`.
    pub fn new(client: Arc<FirestoreClient>) -> Self {
        Self { client }
    }
}

fn map_error(error: FirestoreError) -> UserProfileRepositoryError {
    match error {
        FirestoreError::Transport { message } => UserProfileRepositoryError::connection(message),
        FirestoreError::NotFound { message }
        | FirestoreError::Rejected { message }
        | FirestoreError::Decode { message } => UserProfileRepositoryError::query(message),
    }
}

fn profile_fields(profile: &UserProfile) -> Fields {
    Fields::from([
        ("email".to_owned(), ValueDto::string(profile.email.as_str())),
        (
            "nickname".to_owned(),
            ValueDto::string(profile.nickname.as_str()),
        ),
        (
            "createdAt".to_owned(),
            ValueDto::timestamp(profile.created_at),
        ),
    ])
}

fn profile_from_document(
    user_id: &UserId,
    document: &DocumentDto,
) -> Result<UserProfile, UserProfileRepositoryError> {
    let text = |name: &str| match document.fields.get(name) {
        Some(ValueDto::StringValue(value)) => Ok(value.clone()),
        None => Ok(String::new()),
        Some(other) => Err(UserProfileRepositoryError::query(format!(
            "profile {user_id}: field {name} is not a string: {other:?}"
        ))),
    };
    let created_at = match document.fields.get("createdAt") {
        Some(ValueDto::TimestampValue(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|err| {
                UserProfileRepositoryError::query(format!(
                    "profile {user_id}: malformed createdAt {raw:?}: {err}"
                ))
            })?,
        _ => DateTime::<Utc>::UNIX_EPOCH,
    };
    Ok(UserProfile {
        user_id: user_id.clone(),
        email: text("email")?,
        nickname: text("nickname")?,
        created_at,
    })
}

#[async_trait]
impl UserProfileRepository for FirestoreProfileRepository {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), UserProfileRepositoryError> {
        self.client
            .patch_document(
                USERS,
                profile.user_id.as_ref(),
                profile_fields(profile),
                None,
                false,
            )
            .await
            .map(drop)
            .map_err(map_error)
    }

    async fn find_profile(
        &self,
        user_id: &UserId,
    ) -> Result<Option<UserProfile>, UserProfileRepositoryError> {
        self.client
            .get_document(USERS, user_id.as_ref())
            .await
            .map_err(map_error)?
            .map(|document| profile_from_document(user_id, &document))
            .transpose()
    }
}

//! User identity model.
//!
//! Identities are owned by the identity provider; the client only holds
//! copies. Identifiers are opaque provider strings, not UUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Author snapshot written when the signed-in identity has no display name.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

/// Validation errors returned by the identity constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must not contain whitespace or slashes")]
    InvalidId,
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
}

/// Borrowing, display and `String` conversions shared by the validated
/// string newtypes below. Each type supplies `from_owned`.
macro_rules! validated_string {
    ($($ty:ident),+ $(,)?) => {$(
        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $ty {
            type Error = UserValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    )+};
}

validated_string!(UserId, DisplayName);

/// Stable provider-assigned account identifier.
///
/// The value doubles as the profile document key, so it must not contain
/// path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

/// Human readable display name, also used as the nickname at sign-up.
///
/// Surrounding whitespace is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

/// Signed-in account as reported by the identity provider.
///
/// ## Invariants
/// - `id` is the provider's stable account id.
/// - `display_name` is `None` until the account has been given one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    id: UserId,
    display_name: Option<DisplayName>,
    email: Option<String>,
}

impl UserIdentity {
    /// Build an identity from validated components.
    pub fn new(id: UserId, display_name: Option<DisplayName>, email: Option<String>) -> Self {
        Self {
            id,
            display_name,
            email,
        }
    }

    /// Stable account identifier.
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name, when one has been set.
    pub const fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    /// Email address registered with the provider.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Author snapshot to stamp on submissions and comments.
    ///
    /// # Examples
    /// ```
    /// use sharelinks::domain::{UserId, UserIdentity};
    ///
    /// let id = UserId::new("uid-1").unwrap();
    /// let identity = UserIdentity::new(id, None, None);
    /// assert_eq!(identity.author_name(), "Anonymous");
    /// ```
    pub fn author_name(&self) -> &str {
        self.display_name
            .as_ref()
            .map_or(ANONYMOUS_AUTHOR, AsRef::as_ref)
    }

    /// Return a copy of this identity carrying `display_name`.
    #[must_use]
    pub fn with_display_name(mut self, display_name: DisplayName) -> Self {
        self.display_name = Some(display_name);
        self
    }
}

//! Authentication primitives such as sign-in credentials.
//!
//! Keep raw input parsing outside the provider adapters by exposing
//! constructors that validate string inputs before any remote call.

use std::fmt;

use zeroize::Zeroizing;

use crate::domain::user::{DisplayName, UserValidationError};

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
    /// Nickname failed display-name validation.
    InvalidNickname(UserValidationError),
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::InvalidNickname(err) => write!(f, "nickname is invalid: {err}"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated sign-in credentials.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use sharelinks::domain::SignInCredentials;
///
/// let creds = SignInCredentials::try_from_parts("ada@example.com", "pw").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "pw");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated sign-up request: credentials plus the nickname that becomes
/// the account's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    credentials: SignInCredentials,
    nickname: DisplayName,
}

impl SignUpRequest {
    /// Construct a sign-up request from raw inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        nickname: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let credentials = SignInCredentials::try_from_parts(email, password)?;
        let display_name =
            DisplayName::new(nickname).map_err(CredentialsValidationError::InvalidNickname)?;
        Ok(Self {
            credentials,
            nickname: display_name,
        })
    }

    /// Credentials for the account being created.
    pub const fn credentials(&self) -> &SignInCredentials {
        &self.credentials
    }

    /// Nickname requested for the account.
    pub const fn nickname(&self) -> &DisplayName {
        &self.nickname
    }
}

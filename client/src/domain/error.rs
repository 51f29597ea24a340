//! Errors surfaced by board and account intents.
//!
//! Every failed intent yields a [`DomainError`] whose message doubles as the
//! board notice. Nothing here is fatal to the client.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure category of an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A document store read or write failed (network, permission, bad request).
    StoreUnavailable,
    /// The identity provider rejected the request.
    AuthFailure,
    /// A required field was empty; no remote call was made.
    ValidationFailure,
    /// The intent needs an authenticated identity.
    SignInRequired,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The targeted link is not on the board.
    NotFound,
    /// A store record broke an invariant the client relies on.
    InternalError,
}

impl ErrorCode {
    /// Wire name of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "store_unavailable",
            Self::AuthFailure => "auth_failure",
            Self::ValidationFailure => "validation_failure",
            Self::SignInRequired => "sign_in_required",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::InternalError => "internal_error",
        }
    }

    /// Notice used when a caller supplies no message of its own.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::StoreUnavailable => "The link store is unavailable. Please try again later.",
            Self::AuthFailure => "Authentication failed.",
            Self::ValidationFailure => "Some required fields are missing.",
            Self::SignInRequired => "Please sign in first.",
            Self::Forbidden => "You are not allowed to do that.",
            Self::NotFound => "That link is no longer on the board.",
            Self::InternalError => "Something went wrong.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed intent failure: a code, a user-facing message and optional
/// structured details (failing field, provisioning stage, cause).
///
/// The message is never blank.
///
/// # Examples
/// ```
/// use sharelinks::domain::{DomainError, ErrorCode};
///
/// let err = DomainError::sign_in_required("Please sign in to vote.");
/// assert_eq!(err.code(), ErrorCode::SignInRequired);
/// assert_eq!(err.to_string(), "Please sign in to vote.");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

/// Raised when a decoded error payload carries a blank message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty once trimmed.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl DomainError {
    /// Build an error; a blank `message` is replaced by the code's
    /// fallback notice.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let supplied = message.into();
        Self {
            code,
            message: if supplied.trim().is_empty() {
                code.fallback_message().to_owned()
            } else {
                supplied
            },
            details: None,
        }
    }

    /// Build an error, refusing a blank `message`.
    ///
    /// # Errors
    /// [`ErrorValidationError::EmptyMessage`] when `message` is blank.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let supplied = message.into();
        if supplied.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self::new(code, supplied))
    }

    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Message shown as the board notice.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details, replacing any present.
    #[must_use]
    pub fn with_details(self, details: Value) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    /// [`ErrorCode::StoreUnavailable`] error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    /// [`ErrorCode::AuthFailure`] error.
    pub fn auth_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthFailure, message)
    }

    /// [`ErrorCode::ValidationFailure`] error.
    pub fn validation_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailure, message)
    }

    /// [`ErrorCode::SignInRequired`] error.
    pub fn sign_in_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SignInRequired, message)
    }

    /// [`ErrorCode::Forbidden`] error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// [`ErrorCode::NotFound`] error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// [`ErrorCode::InternalError`] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DomainError {}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<DomainError> for ErrorDto {
    fn from(DomainError { code, message, details }: DomainError) -> Self {
        Self {
            code,
            message,
            details,
        }
    }
}

impl TryFrom<ErrorDto> for DomainError {
    type Error = ErrorValidationError;

    fn try_from(dto: ErrorDto) -> Result<Self, Self::Error> {
        let base = Self::try_new(dto.code, dto.message)?;
        Ok(Self {
            details: dto.details,
            ..base
        })
    }
}

//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed domain entities used by the client shell
//! and adapters. Keep invariants close to the types and avoid leaking
//! transport or backend concerns.
//!
//! Public surface:
//! - DomainError / ErrorCode: transport agnostic error payload surfaced as notices.
//! - UserId / DisplayName / UserIdentity: identity copies owned by the
//!   provider.
//! - SignInCredentials / SignUpRequest: validated account inputs.
//! - Link / Comment / VoteCounters: the link aggregate, denormalised from
//!   raw [`LinkRecord`]s.
//! - LinkSubmission / LinkPatch / CommentDraft: validated write inputs.
//! - LinkBoard: the application controller owning board state.
//! - AccountService: sign-up provisioning, sign-in repair and identity
//!   subscriptions.

pub mod account_service;
pub mod auth;
pub mod error;
pub mod link;
pub mod link_board;
pub mod ports;
pub mod user;

pub use self::account_service::{AccountService, IdentitySubscription};
pub use self::auth::{CredentialsValidationError, SignInCredentials, SignUpRequest};
pub use self::error::{DomainError, ErrorCode, ErrorValidationError};
pub use self::link::{
    Comment, CommentDraft, CommentId, CommentRecord, Link, LinkId, LinkPatch, LinkRecord,
    LinkRecordError, LinkSubmission, LinkValidationError, StoreTimestamp, VoteCounters, VoteKind,
};
pub use self::link_board::{BoardOptions, BoardSnapshot, LinkBoard, may_edit};
pub use self::user::{
    ANONYMOUS_AUTHOR, DISPLAY_NAME_MAX, DisplayName, UserId, UserIdentity, UserValidationError,
};

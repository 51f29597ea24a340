//! Identity Toolkit outbound adapter.
//!
//! Email/password accounts, display names and the signed-in session. The
//! provider also hands its ID token to the document store client.

mod dto;
mod http_provider;

pub use http_provider::{IdentityToolkitConfig, IdentityToolkitProvider};

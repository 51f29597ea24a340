//! In-memory adapters.
//!
//! Used when no hosted backend is configured and by integration tests. They
//! honour the same port contracts as the HTTP adapters.

mod identity;
mod link_store;

pub use identity::{InMemoryIdentityProvider, InMemoryProfileRepository};
pub use link_store::InMemoryLinkStore;

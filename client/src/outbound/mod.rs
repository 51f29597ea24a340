//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **firestore**: document store adapters for links and user profiles
//! - **identity_toolkit**: hosted email/password identity provider
//! - **memory**: process-local adapters used offline and in tests
//!
//! Adapters are thin translators between domain records and wire
//! representations. They contain no business logic.

pub mod firestore;
pub mod identity_toolkit;
pub mod memory;

//! Firestore outbound adapters.
//!
//! A shared [`FirestoreClient`] speaks the Firestore REST API; the link
//! store and profile repository translate its documents into port records.

mod client;
mod dto;
mod link_store;
mod profile_repository;

pub use client::{
    AccessTokenSource, AnonymousAccess, FirestoreClient, FirestoreConfig, FirestoreSetupError,
};
pub use link_store::FirestoreLinkStore;
pub use profile_repository::FirestoreProfileRepository;

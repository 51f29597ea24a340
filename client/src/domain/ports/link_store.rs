//! Driven port for the remote document store holding links.
//!
//! Adapters are pure translators between the store's wire shape and
//! [`LinkRecord`]s. They own no business rules: guards, validation and
//! reconciliation live in [`crate::domain::LinkBoard`].

use async_trait::async_trait;

use crate::domain::{CommentDraft, CommentRecord, LinkId, LinkPatch, LinkRecord, UserId, VoteKind};

use super::define_port_error;

define_port_error! {
    /// Errors raised by link store adapters.
    pub enum LinkStoreError {
        /// The store could not be reached.
        Connection { message: String } => "link store connection failed: {message}",
        /// The store rejected or failed the request.
        Query { message: String } => "link store query failed: {message}",
        /// The targeted document does not exist.
        NotFound { id: String } => "link {id} does not exist",
        /// A document could not be decoded into a record.
        Decode { message: String } => "link store returned an undecodable document: {message}",
    }
}

/// Fields written when a link document is created.
///
/// Counters start at zero, comments empty and the timestamp is stamped by
/// the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Display-name snapshot of the submitter.
    pub author: String,
    /// Stable identity of the submitter.
    pub owner: UserId,
}

/// Link document store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// List every link, newest first.
    async fn list_links(&self) -> Result<Vec<LinkRecord>, LinkStoreError>;

    /// Read a single link document.
    async fn get_link(&self, id: &LinkId) -> Result<Option<LinkRecord>, LinkStoreError>;

    /// Create a link document and return its store-assigned id.
    async fn create_link(&self, link: &NewLink) -> Result<LinkId, LinkStoreError>;

    /// Merge the supplied fields into an existing document.
    async fn patch_link(&self, id: &LinkId, patch: &LinkPatch) -> Result<(), LinkStoreError>;

    /// Overwrite one vote counter with an absolute value.
    ///
    /// Concurrent writers computing `value` from stale reads lose updates.
    /// [`LinkStore::increment_vote`] is the lossless alternative.
    async fn set_vote_counter(
        &self,
        id: &LinkId,
        kind: VoteKind,
        value: u64,
    ) -> Result<(), LinkStoreError>;

    /// Atomically add one to a vote counter on the store side.
    async fn increment_vote(&self, id: &LinkId, kind: VoteKind) -> Result<(), LinkStoreError>;

    /// Append a comment to the document's comment array and return the
    /// stored element.
    async fn append_comment(
        &self,
        id: &LinkId,
        comment: &CommentDraft,
    ) -> Result<CommentRecord, LinkStoreError>;
}

//! Firestore-backed link store.
//!
//! Link documents live in the `links` collection with comments embedded as
//! an array of maps. Vote increments and comment appends go through
//! `:commit` field transforms so concurrent writers do not lose updates.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, warn};

use super::client::{FirestoreClient, FirestoreError};
use super::dto::{
    ArrayValueDto, DocumentDto, FieldTransformDto, Fields, TransformOperationDto, ValueDto,
    WriteDto, comment_to_value, newest_first_query,
};
use crate::domain::ports::{LinkStore, LinkStoreError, NewLink};
use crate::domain::{
    CommentDraft, CommentId, CommentRecord, LinkId, LinkPatch, LinkRecord, StoreTimestamp,
    VoteKind,
};

const LINKS: &str = "links";

/// [`LinkStore`] over the Firestore REST API.
pub struct FirestoreLinkStore {
    client: Arc<FirestoreClient>,
    clock: Arc<dyn Clock>,
}

impl FirestoreLinkStore {
    /// Create a store sharing `client`; `clock` stamps new documents and
    /// comments.
    pub fn new(client: Arc<FirestoreClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }
}

fn map_error(id: Option<&LinkId>, error: FirestoreError) -> LinkStoreError {
    match error {
        FirestoreError::Transport { message } => LinkStoreError::connection(message),
        FirestoreError::NotFound { message } => id.map_or_else(
            || LinkStoreError::query(message),
            |target| LinkStoreError::not_found(target.to_string()),
        ),
        FirestoreError::Rejected { message } => LinkStoreError::query(message),
        FirestoreError::Decode { message } => LinkStoreError::decode(message),
    }
}

/// Decode a listing, dropping documents that do not decode so one bad
/// document cannot hide the rest of the board.
fn decode_listing(documents: Vec<DocumentDto>) -> Vec<LinkRecord> {
    documents
        .into_iter()
        .filter_map(|document| {
            LinkRecord::try_from(document)
                .inspect_err(|err| warn!(error = %err, "skipping undecodable link document"))
                .ok()
        })
        .collect()
}

fn new_link_fields(link: &NewLink, at: chrono::DateTime<chrono::Utc>) -> Fields {
    Fields::from([
        ("title".to_owned(), ValueDto::string(link.title.as_str())),
        ("url".to_owned(), ValueDto::string(link.url.as_str())),
        (
            "description".to_owned(),
            ValueDto::string(link.description.as_str()),
        ),
        ("author".to_owned(), ValueDto::string(link.author.as_str())),
        ("owner".to_owned(), ValueDto::string(link.owner.to_string())),
        ("timestamp".to_owned(), ValueDto::timestamp(at)),
        ("upvotes".to_owned(), ValueDto::integer(0)),
        ("downvotes".to_owned(), ValueDto::integer(0)),
        ("comments".to_owned(), ValueDto::empty_array()),
    ])
}

fn patch_fields(patch: &LinkPatch) -> Fields {
    [
        ("title", patch.title()),
        ("url", patch.url()),
        ("description", patch.description()),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|value| (name.to_owned(), ValueDto::string(value))))
    .collect()
}

#[async_trait]
impl LinkStore for FirestoreLinkStore {
    async fn list_links(&self) -> Result<Vec<LinkRecord>, LinkStoreError> {
        let documents = self
            .client
            .run_query(&newest_first_query(LINKS))
            .await
            .map_err(|err| map_error(None, err))?;
        debug!(count = documents.len(), "listed link documents");
        Ok(decode_listing(documents))
    }

    async fn get_link(&self, id: &LinkId) -> Result<Option<LinkRecord>, LinkStoreError> {
        self.client
            .get_document(LINKS, id.as_ref())
            .await
            .map_err(|err| map_error(Some(id), err))?
            .map(|document| LinkRecord::try_from(document).map_err(LinkStoreError::decode))
            .transpose()
    }

    async fn create_link(&self, link: &NewLink) -> Result<LinkId, LinkStoreError> {
        let created = self
            .client
            .create_document(LINKS, new_link_fields(link, self.clock.utc()))
            .await
            .map_err(|err| map_error(None, err))?;
        let id = created.id().map_err(LinkStoreError::decode)?;
        LinkId::new(id).map_err(|err| LinkStoreError::decode(err.to_string()))
    }

    async fn patch_link(&self, id: &LinkId, patch: &LinkPatch) -> Result<(), LinkStoreError> {
        let mask = patch.field_paths();
        self.client
            .patch_document(LINKS, id.as_ref(), patch_fields(patch), Some(mask.as_slice()), true)
            .await
            .map(drop)
            .map_err(|err| map_error(Some(id), err))
    }

    async fn set_vote_counter(
        &self,
        id: &LinkId,
        kind: VoteKind,
        value: u64,
    ) -> Result<(), LinkStoreError> {
        let stored = i64::try_from(value)
            .map_err(|_| LinkStoreError::query(format!("{} counter overflow", kind.field_name())))?;
        let fields = Fields::from([(kind.field_name().to_owned(), ValueDto::integer(stored))]);
        self.client
            .patch_document(LINKS, id.as_ref(), fields, Some(&[kind.field_name()][..]), true)
            .await
            .map(drop)
            .map_err(|err| map_error(Some(id), err))
    }

    async fn increment_vote(&self, id: &LinkId, kind: VoteKind) -> Result<(), LinkStoreError> {
        let write = WriteDto::transform(
            self.client.document_name(LINKS, id.as_ref()),
            FieldTransformDto {
                field_path: kind.field_name().to_owned(),
                operation: TransformOperationDto::Increment(ValueDto::integer(1)),
            },
        );
        self.client
            .commit(vec![write])
            .await
            .map_err(|err| map_error(Some(id), err))
    }

    async fn append_comment(
        &self,
        id: &LinkId,
        comment: &CommentDraft,
    ) -> Result<CommentRecord, LinkStoreError> {
        let now = self.clock.utc();
        let stored = CommentRecord {
            id: CommentId::from_instant(now).as_ref().to_owned(),
            text: comment.text().to_owned(),
            author: comment.author().to_owned(),
            timestamp: StoreTimestamp::from_datetime(now),
        };
        let write = WriteDto::transform(
            self.client.document_name(LINKS, id.as_ref()),
            FieldTransformDto {
                field_path: "comments".to_owned(),
                operation: TransformOperationDto::AppendMissingElements(ArrayValueDto {
                    values: vec![comment_to_value(&stored, now)],
                }),
            },
        );
        self.client
            .commit(vec![write])
            .await
            .map_err(|err| map_error(Some(id), err))?;
        Ok(stored)
    }
}

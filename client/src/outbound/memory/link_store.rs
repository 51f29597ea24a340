//! Process-local link store.
//!
//! Documents live in a map guarded by an async mutex, so every operation,
//! including the counter increment, is atomic with respect to the others.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{LinkStore, LinkStoreError, NewLink};
use crate::domain::{
    CommentDraft, CommentId, CommentRecord, LinkId, LinkPatch, LinkRecord, StoreTimestamp,
    VoteKind,
};

/// In-memory [`LinkStore`] used for offline runs and tests.
pub struct InMemoryLinkStore {
    clock: Arc<dyn Clock>,
    documents: Mutex<HashMap<String, LinkRecord>>,
}

impl InMemoryLinkStore {
    /// Create an empty store stamping documents with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a raw record as-is, replacing any document with the same id.
    pub async fn seed(&self, record: LinkRecord) {
        self.documents
            .lock()
            .await
            .insert(record.id.clone(), record);
    }

    fn now(&self) -> StoreTimestamp {
        StoreTimestamp::from_datetime(self.clock.utc())
    }
}

fn counter_value(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn list_links(&self) -> Result<Vec<LinkRecord>, LinkStoreError> {
        let documents = self.documents.lock().await;
        let mut records: Vec<_> = documents.values().cloned().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn get_link(&self, id: &LinkId) -> Result<Option<LinkRecord>, LinkStoreError> {
        Ok(self.documents.lock().await.get(id.as_ref()).cloned())
    }

    async fn create_link(&self, link: &NewLink) -> Result<LinkId, LinkStoreError> {
        let raw_id = Uuid::new_v4().simple().to_string();
        let id = LinkId::new(raw_id.clone())
            .map_err(|err| LinkStoreError::query(format!("generated id rejected: {err}")))?;
        let record = LinkRecord {
            id: raw_id.clone(),
            title: link.title.clone(),
            url: link.url.clone(),
            description: link.description.clone(),
            author: link.author.clone(),
            owner: Some(link.owner.to_string()),
            timestamp: self.now(),
            upvotes: 0,
            downvotes: 0,
            comments: Vec::new(),
        };
        self.documents.lock().await.insert(raw_id, record);
        Ok(id)
    }

    async fn patch_link(&self, id: &LinkId, patch: &LinkPatch) -> Result<(), LinkStoreError> {
        let mut documents = self.documents.lock().await;
        let record = documents
            .get_mut(id.as_ref())
            .ok_or_else(|| LinkStoreError::not_found(id.as_ref()))?;
        if let Some(title) = patch.title() {
            title.clone_into(&mut record.title);
        }
        if let Some(url) = patch.url() {
            url.clone_into(&mut record.url);
        }
        if let Some(description) = patch.description() {
            description.clone_into(&mut record.description);
        }
        Ok(())
    }

    async fn set_vote_counter(
        &self,
        id: &LinkId,
        kind: VoteKind,
        value: u64,
    ) -> Result<(), LinkStoreError> {
        let mut documents = self.documents.lock().await;
        let record = documents
            .get_mut(id.as_ref())
            .ok_or_else(|| LinkStoreError::not_found(id.as_ref()))?;
        let stored = counter_value(value);
        match kind {
            VoteKind::Upvote => record.upvotes = stored,
            VoteKind::Downvote => record.downvotes = stored,
        }
        Ok(())
    }

    async fn increment_vote(&self, id: &LinkId, kind: VoteKind) -> Result<(), LinkStoreError> {
        let mut documents = self.documents.lock().await;
        let record = documents
            .get_mut(id.as_ref())
            .ok_or_else(|| LinkStoreError::not_found(id.as_ref()))?;
        let counter = match kind {
            VoteKind::Upvote => &mut record.upvotes,
            VoteKind::Downvote => &mut record.downvotes,
        };
        *counter = counter.saturating_add(1);
        Ok(())
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
        let mut documents = self.documents.lock().await;
        let record = documents
            .get_mut(id.as_ref())
            .ok_or_else(|| LinkStoreError::not_found(id.as_ref()))?;
        record.comments.push(stored.clone());
        Ok(stored)
    }
}

//! Application controller for the shared link board.
//!
//! Every user intent follows the same shape: guard on the current
//! identity, validate the input, apply the store operation, reload the
//! board and report the outcome as a notice. The board lock is never held
//! across a remote call.
//!
//! By default a vote writes the locally bumped counter as an absolute value
//! and every mutation is followed by a full reload of the link list.
//! [`BoardOptions`] opts into store-side increments and single-document
//! refreshes instead.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    IdentityProvider, LinkStore, LinkStoreError, NewLink, UserProfileRepository,
};
use crate::domain::{
    AccountService, CommentDraft, CredentialsValidationError, DomainError, Link, LinkId, LinkPatch,
    LinkSubmission, LinkValidationError, SignInCredentials, SignUpRequest, UserIdentity,
    VoteCounters, VoteKind,
};

const LOAD_FAILED: &str = "Failed to load links. Please try again later.";

/// Opt-in alternatives to the reload-everything, last-write-wins board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardOptions {
    /// After a mutation, re-read only the mutated document and patch it
    /// into the board by id instead of reloading the whole list.
    pub targeted_refresh: bool,
    /// Vote through the store's atomic increment instead of writing the
    /// locally bumped counter, so concurrent votes all count.
    pub atomic_votes: bool,
}

/// Owned view of the board handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub links: Vec<Link>,
    pub loading: bool,
    pub notice: Option<String>,
    pub identity: Option<UserIdentity>,
}

#[derive(Debug)]
struct BoardState {
    links: Vec<Link>,
    loading: bool,
    notice: Option<String>,
}

impl BoardState {
    fn find(&self, id: &LinkId) -> Option<&Link> {
        self.links.iter().find(|link| &link.id == id)
    }

    fn find_mut(&mut self, id: &LinkId) -> Option<&mut Link> {
        self.links.iter_mut().find(|link| &link.id == id)
    }

    /// Replace by id, or insert keeping newest-first order.
    fn upsert(&mut self, link: Link) {
        if let Some(existing) = self.find_mut(&link.id) {
            *existing = link;
            return;
        }
        let position = self
            .links
            .iter()
            .position(|other| other.timestamp < link.timestamp)
            .unwrap_or(self.links.len());
        self.links.insert(position, link);
    }

    fn remove(&mut self, id: &LinkId) {
        self.links.retain(|link| &link.id != id);
    }
}

/// Whether `identity` may edit `link`: its display name must string-equal
/// the link's author snapshot.
///
/// The gate is advisory. The store does not re-check it, and the recorded
/// `owner` plays no part.
pub fn may_edit(identity: Option<&UserIdentity>, link: &Link) -> bool {
    identity
        .and_then(UserIdentity::display_name)
        .is_some_and(|name| name.as_ref() == link.author)
}

fn store_failure(message: &str, error: &LinkStoreError) -> DomainError {
    DomainError::store_unavailable(message)
        .with_details(json!({ "cause": error.to_string(), "kind": error.kind() }))
}

fn link_validation(error: &LinkValidationError) -> DomainError {
    let base = DomainError::validation_failure(capitalise(&error.to_string()));
    if let Some(field) = error.field() {
        return base.with_details(json!({ "field": field }));
    }
    base
}

fn credentials_validation(error: &CredentialsValidationError) -> DomainError {
    DomainError::validation_failure(capitalise(&error.to_string()))
}

fn capitalise(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>() + "."
    })
}

/// The application controller.
pub struct LinkBoard<S, P, R> {
    store: Arc<S>,
    accounts: AccountService<P, R>,
    identity: watch::Receiver<Option<UserIdentity>>,
    options: BoardOptions,
    state: Mutex<BoardState>,
}

impl<S, P, R> LinkBoard<S, P, R>
where
    S: LinkStore,
    P: IdentityProvider,
    R: UserProfileRepository,
{
    /// Build a board over a link store and the account service. The board
    /// starts empty and loading until [`LinkBoard::start`] runs.
    pub fn new(store: Arc<S>, accounts: AccountService<P, R>) -> Self {
        let identity = accounts.identity_changes();
        Self {
            store,
            accounts,
            identity,
            options: BoardOptions::default(),
            state: Mutex::new(BoardState {
                links: Vec::new(),
                loading: true,
                notice: None,
            }),
        }
    }

    /// Replace the default options.
    #[must_use]
    pub const fn with_options(mut self, options: BoardOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    pub const fn options(&self) -> BoardOptions {
        self.options
    }

    /// Account service used for identity intents and subscriptions.
    pub const fn accounts(&self) -> &AccountService<P, R> {
        &self.accounts
    }

    /// Current identity, `None` while signed out.
    pub fn current_identity(&self) -> Option<UserIdentity> {
        self.identity.borrow().clone()
    }

    /// Owned copy of the board for rendering.
    pub async fn snapshot(&self) -> BoardSnapshot {
        let identity = self.current_identity();
        let state = self.state.lock().await;
        BoardSnapshot {
            links: state.links.clone(),
            loading: state.loading,
            notice: state.notice.clone(),
            identity,
        }
    }

    /// Whether the signed-in identity may edit `link`.
    pub fn can_edit(&self, link: &Link) -> bool {
        may_edit(self.identity.borrow().as_ref(), link)
    }

    /// Load the link list for the first time.
    ///
    /// # Errors
    /// See [`LinkBoard::reconcile`].
    pub async fn start(&self) -> Result<(), DomainError> {
        info!("loading link board");
        self.reconcile().await
    }

    /// Reload the full link list from the store.
    ///
    /// Records that cannot be denormalised are skipped with a warning. On
    /// failure the current links are kept.
    ///
    /// # Errors
    /// Returns [`crate::domain::ErrorCode::StoreUnavailable`] when the list
    /// cannot be read.
    pub async fn reconcile(&self) -> Result<(), DomainError> {
        self.state.lock().await.loading = true;
        let result = self.store.list_links().await;

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(records) => {
                let total = records.len();
                state.links = records
                    .into_iter()
                    .filter_map(|record| {
                        let id = record.id.clone();
                        Link::try_from(record)
                            .inspect_err(|err| {
                                warn!(link_id = %id, error = %err, "skipping undecodable link");
                            })
                            .ok()
                    })
                    .collect();
                state.notice = None;
                debug!(total, loaded = state.links.len(), "link board reconciled");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "loading links failed");
                state.notice = Some(LOAD_FAILED.to_owned());
                Err(store_failure(LOAD_FAILED, &err))
            }
        }
    }

    /// Spawn a task reloading the board every `every` until aborted.
    pub fn spawn_periodic_reconcile(self: &Arc<Self>, every: Duration) -> JoinHandle<()>
    where
        S: 'static,
        P: 'static,
        R: 'static,
    {
        let board = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = board.reconcile().await {
                    debug!(error = %err, "periodic reload failed; notice updated");
                }
            }
        })
    }

    /// Share a new link as the signed-in identity.
    ///
    /// # Errors
    /// `SignInRequired` when signed out, `ValidationFailure` for a blank
    /// title or url, `StoreUnavailable` when the write fails.
    pub async fn submit_link(
        &self,
        title: &str,
        url: &str,
        description: &str,
    ) -> Result<LinkId, DomainError> {
        let result = self.try_submit_link(title, url, description).await;
        self.report(result).await
    }

    async fn try_submit_link(
        &self,
        title: &str,
        url: &str,
        description: &str,
    ) -> Result<LinkId, DomainError> {
        let identity = self.require_identity("Please sign in to share links.")?;
        let submission =
            LinkSubmission::try_new(title, url, description).map_err(|e| link_validation(&e))?;
        let new_link = NewLink {
            title: submission.title().to_owned(),
            url: submission.url().to_owned(),
            description: submission.description().to_owned(),
            author: identity.author_name().to_owned(),
            owner: identity.id().clone(),
        };
        let id = self
            .store
            .create_link(&new_link)
            .await
            .map_err(|err| store_failure("Failed to share link. Please try again.", &err))?;
        info!(link_id = %id, user_id = %identity.id(), "link shared");
        self.settle(&id).await?;
        Ok(id)
    }

    /// Record one vote of `kind` on a link.
    ///
    /// The local counter is bumped before the store call and the bumped
    /// value is written as the new absolute counter, so two clients voting
    /// from the same stale read leave only the last write. A failed write
    /// restores the previous counters unless a reload replaced them
    /// meanwhile. The reload after a successful write is the source of
    /// truth.
    ///
    /// # Errors
    /// `SignInRequired`, `NotFound` when the link is not on the board, or
    /// `StoreUnavailable`.
    pub async fn vote(&self, id: &LinkId, kind: VoteKind) -> Result<(), DomainError> {
        let result = self.try_vote(id, kind).await;
        self.report(result).await
    }

    async fn try_vote(&self, id: &LinkId, kind: VoteKind) -> Result<(), DomainError> {
        self.require_identity("Please sign in to vote.")?;
        let (before, bumped) = {
            let mut state = self.state.lock().await;
            let link = state.find_mut(id).ok_or_else(|| missing_link(id))?;
            let previous = link.votes;
            link.votes = previous.bumped(kind);
            (previous, link.votes)
        };

        let written = if self.options.atomic_votes {
            self.store.increment_vote(id, kind).await
        } else {
            self.store.set_vote_counter(id, kind, bumped.get(kind)).await
        };
        if let Err(err) = written {
            warn!(link_id = %id, vote = %kind, error = %err, "vote failed; rolling back");
            self.roll_back_vote(id, before, bumped).await;
            return Err(store_failure("Failed to record your vote.", &err));
        }
        debug!(link_id = %id, vote = %kind, local = bumped.get(kind), "vote recorded");
        self.settle(id).await
    }

    async fn roll_back_vote(&self, id: &LinkId, before: VoteCounters, bumped: VoteCounters) {
        let mut state = self.state.lock().await;
        match state.find_mut(id) {
            Some(link) if link.votes == bumped => link.votes = before,
            _ => debug!(link_id = %id, "counters replaced since the vote; nothing to roll back"),
        }
    }

    /// Append a comment to a link as the signed-in identity.
    ///
    /// # Errors
    /// `SignInRequired`, `ValidationFailure` for blank text, `NotFound`, or
    /// `StoreUnavailable`.
    pub async fn add_comment(&self, id: &LinkId, text: &str) -> Result<(), DomainError> {
        let result = self.try_add_comment(id, text).await;
        self.report(result).await
    }

    async fn try_add_comment(&self, id: &LinkId, text: &str) -> Result<(), DomainError> {
        let identity = self.require_identity("Please sign in to comment.")?;
        let draft =
            CommentDraft::try_new(text, identity.author_name()).map_err(|e| link_validation(&e))?;
        self.ensure_on_board(id).await?;
        let stored = self
            .store
            .append_comment(id, &draft)
            .await
            .map_err(|err| store_failure("Failed to add comment.", &err))?;
        debug!(link_id = %id, comment_id = %stored.id, "comment added");
        self.settle(id).await
    }

    /// Change a link's title, url and/or description.
    ///
    /// # Errors
    /// `SignInRequired`, `ValidationFailure`, `NotFound`, `Forbidden` when
    /// the caller's display name differs from the author, or
    /// `StoreUnavailable`.
    pub async fn edit_link(
        &self,
        id: &LinkId,
        title: Option<&str>,
        url: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), DomainError> {
        let result = self.try_edit_link(id, title, url, description).await;
        self.report(result).await
    }

    async fn try_edit_link(
        &self,
        id: &LinkId,
        title: Option<&str>,
        url: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), DomainError> {
        let identity = self.require_identity("Please sign in to edit links.")?;
        let patch = LinkPatch::try_new(title, url, description).map_err(|e| link_validation(&e))?;
        {
            let state = self.state.lock().await;
            let link = state.find(id).ok_or_else(|| missing_link(id))?;
            if !may_edit(Some(&identity), link) {
                warn!(
                    link_id = %id,
                    user_id = %identity.id(),
                    "edit refused; caller is not the author"
                );
                return Err(DomainError::forbidden("Only the author can edit this link."));
            }
        }
        self.store
            .patch_link(id, &patch)
            .await
            .map_err(|err| store_failure("Failed to update link.", &err))?;
        info!(link_id = %id, fields = ?patch.field_paths(), "link edited");
        self.settle(id).await
    }

    /// Create an account.
    ///
    /// # Errors
    /// `ValidationFailure` for blank inputs, otherwise `AuthFailure`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        nickname: &str,
    ) -> Result<UserIdentity, DomainError> {
        let result = match SignUpRequest::try_from_parts(email, password, nickname) {
            Ok(request) => self.accounts.sign_up(&request).await,
            Err(err) => Err(credentials_validation(&err)),
        };
        self.report(result).await
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    /// `ValidationFailure` for blank inputs, otherwise `AuthFailure`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, DomainError> {
        let result = match SignInCredentials::try_from_parts(email, password) {
            Ok(credentials) => self.accounts.sign_in(&credentials).await,
            Err(err) => Err(credentials_validation(&err)),
        };
        self.report(result).await
    }

    /// Sign out. Succeeds while already signed out.
    ///
    /// # Errors
    /// `AuthFailure` when the provider cannot be reached.
    pub async fn sign_out(&self) -> Result<(), DomainError> {
        let result = self.accounts.sign_out().await;
        self.report(result).await
    }

    fn require_identity(&self, notice: &str) -> Result<UserIdentity, DomainError> {
        self.current_identity()
            .ok_or_else(|| DomainError::sign_in_required(notice))
    }

    async fn ensure_on_board(&self, id: &LinkId) -> Result<(), DomainError> {
        let state = self.state.lock().await;
        state.find(id).map(|_| ()).ok_or_else(|| missing_link(id))
    }

    /// Pick up the effect of a mutation on `id`.
    async fn settle(&self, id: &LinkId) -> Result<(), DomainError> {
        if self.options.targeted_refresh {
            self.refresh_link(id).await
        } else {
            self.reconcile().await
        }
    }

    /// Re-read one document and patch it into the board by id.
    async fn refresh_link(&self, id: &LinkId) -> Result<(), DomainError> {
        let record = self.store.get_link(id).await.map_err(|err| {
            store_failure("Saved, but the board could not be refreshed.", &err)
        })?;
        let link = record
            .map(Link::try_from)
            .transpose()
            .map_err(|err| {
                DomainError::internal("The store returned a link that could not be read.")
                    .with_details(json!({ "cause": err.to_string() }))
            })?;

        let mut state = self.state.lock().await;
        match link {
            Some(link) => state.upsert(link),
            None => {
                debug!(link_id = %id, "link vanished; dropping from board");
                state.remove(id);
            }
        }
        Ok(())
    }

    async fn report<T>(&self, result: Result<T, DomainError>) -> Result<T, DomainError> {
        let mut state = self.state.lock().await;
        match &result {
            Ok(_) => state.notice = None,
            Err(err) => {
                debug!(code = ?err.code(), message = err.message(), "intent failed");
                state.notice = Some(err.message().to_owned());
            }
        }
        result
    }
}

fn missing_link(id: &LinkId) -> DomainError {
    DomainError::not_found("That link is no longer on the board.")
        .with_details(json!({ "linkId": id.to_string() }))
}

#[cfg(test)]
#[path = "link_board_tests.rs"]
mod tests;

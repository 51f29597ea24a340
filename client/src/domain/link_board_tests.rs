//! Tests for the link board controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rstest::rstest;
use tokio::sync::{Notify, watch};

use super::*;
use crate::domain::ports::{
    MockIdentityProvider, MockLinkStore, MockUserProfileRepository, NewLink,
};
use crate::domain::{CommentRecord, ErrorCode, LinkRecord};
use crate::test_support::{comment_record, fixture_clock, identity, link_record};

type Board<S> = LinkBoard<S, MockIdentityProvider, MockUserProfileRepository>;
type TestBoard = Board<MockLinkStore>;
type IdentityTx = watch::Sender<Option<UserIdentity>>;

fn make_board_over<S: LinkStore>(
    store: Arc<S>,
    mut provider: MockIdentityProvider,
    signed_in: Option<UserIdentity>,
) -> (Board<S>, IdentityTx) {
    let (sender, receiver) = watch::channel(signed_in);
    provider
        .expect_identity_changes()
        .returning(move || receiver.clone());
    let accounts = AccountService::new(
        Arc::new(provider),
        Arc::new(MockUserProfileRepository::new()),
        fixture_clock(),
    );
    (LinkBoard::new(store, accounts), sender)
}

fn make_board_with_provider(
    store: MockLinkStore,
    provider: MockIdentityProvider,
    signed_in: Option<UserIdentity>,
) -> (TestBoard, IdentityTx) {
    make_board_over(Arc::new(store), provider, signed_in)
}

fn make_board(store: MockLinkStore, signed_in: Option<UserIdentity>) -> (TestBoard, IdentityTx) {
    make_board_with_provider(store, MockIdentityProvider::new(), signed_in)
}

fn make_board_with_options(
    store: MockLinkStore,
    signed_in: Option<UserIdentity>,
    options: BoardOptions,
) -> (TestBoard, IdentityTx) {
    let (board, sender) = make_board(store, signed_in);
    (board.with_options(options), sender)
}

fn alice() -> UserIdentity {
    identity("uid-alice", Some("alice"))
}

fn link_id(raw: &str) -> LinkId {
    LinkId::new(raw).expect("link id")
}

fn expect_listing(store: &mut MockLinkStore, records: Vec<LinkRecord>) {
    store
        .expect_list_links()
        .times(1)
        .return_once(move || Ok(records));
}

/// One listing per expected `list_links` call, in order.
fn expect_listings(store: &mut MockLinkStore, listings: Vec<Vec<LinkRecord>>) {
    let calls = listings.len();
    let mut pending = listings.into_iter();
    store
        .expect_list_links()
        .times(calls)
        .returning(move || Ok(pending.next().unwrap_or_default()));
}

/// Lets a test hold a vote write open while it reloads the board.
#[derive(Clone, Default)]
struct VoteGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

/// Lists `initial` on the first call and `later` afterwards. Vote writes
/// wait on the gate and then fail.
struct StalledVoteStore {
    initial: LinkRecord,
    later: LinkRecord,
    listed: AtomicBool,
    gate: VoteGate,
}

#[async_trait]
impl LinkStore for StalledVoteStore {
    async fn list_links(&self) -> Result<Vec<LinkRecord>, LinkStoreError> {
        let record = if self.listed.swap(true, Ordering::SeqCst) {
            &self.later
        } else {
            &self.initial
        };
        Ok(vec![record.clone()])
    }

    async fn get_link(&self, _id: &LinkId) -> Result<Option<LinkRecord>, LinkStoreError> {
        Ok(Some(self.later.clone()))
    }

    async fn create_link(&self, _link: &NewLink) -> Result<LinkId, LinkStoreError> {
        Err(LinkStoreError::query("read-only store"))
    }

    async fn patch_link(&self, _id: &LinkId, _patch: &LinkPatch) -> Result<(), LinkStoreError> {
        Err(LinkStoreError::query("read-only store"))
    }

    async fn set_vote_counter(
        &self,
        _id: &LinkId,
        _kind: VoteKind,
        _value: u64,
    ) -> Result<(), LinkStoreError> {
        self.gate.entered.notify_one();
        self.gate.release.notified().await;
        Err(LinkStoreError::connection("offline"))
    }

    async fn increment_vote(&self, _id: &LinkId, _kind: VoteKind) -> Result<(), LinkStoreError> {
        Err(LinkStoreError::query("read-only store"))
    }

    async fn append_comment(
        &self,
        _id: &LinkId,
        _comment: &CommentDraft,
    ) -> Result<CommentRecord, LinkStoreError> {
        Err(LinkStoreError::query("read-only store"))
    }
}

#[tokio::test]
async fn new_board_is_loading_until_started() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("b", 200), link_record("a", 100)]);
    let (board, _identity) = make_board(store, None);

    assert!(board.snapshot().await.loading);
    board.start().await.expect("start");

    let snapshot = board.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.notice, None);
    assert_eq!(snapshot.identity, None);
    let ids: Vec<_> = snapshot.links.iter().map(|l| l.id.to_string()).collect();
    assert_eq!(ids, ["b", "a"]);
}

#[tokio::test]
async fn reconcile_skips_undecodable_records() {
    let mut broken = link_record("broken", 50);
    broken.upvotes = -1;
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("a", 100), broken]);
    let (board, _identity) = make_board(store, None);

    board.start().await.expect("start");

    assert_eq!(board.snapshot().await.links.len(), 1);
}

#[tokio::test]
async fn failed_reload_keeps_links_and_sets_notice() {
    let mut store = MockLinkStore::new();
    let mut calls = 0;
    store.expect_list_links().times(2).returning(move || {
        calls += 1;
        if calls == 1 {
            Ok(vec![link_record("a", 100)])
        } else {
            Err(LinkStoreError::connection("offline"))
        }
    });
    let (board, _identity) = make_board(store, None);

    board.start().await.expect("first load");
    let err = board.reconcile().await.expect_err("second load fails");

    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    let snapshot = board.snapshot().await;
    assert_eq!(
        snapshot.notice.as_deref(),
        Some("Failed to load links. Please try again later.")
    );
    assert_eq!(snapshot.links.len(), 1);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn signed_out_intents_never_reach_the_store() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("a", 100)]);
    let (board, _identity) = make_board(store, None);
    board.start().await.expect("start");
    let before = board.snapshot().await.links;
    let id = link_id("a");

    let submit = board
        .submit_link("Example", "https://example.com", "d")
        .await
        .expect_err("submit refused");
    assert_eq!(submit.code(), ErrorCode::SignInRequired);
    assert_eq!(submit.message(), "Please sign in to share links.");

    let vote = board
        .vote(&id, VoteKind::Upvote)
        .await
        .expect_err("vote refused");
    assert_eq!(vote.message(), "Please sign in to vote.");

    let comment = board
        .add_comment(&id, "nice")
        .await
        .expect_err("comment refused");
    assert_eq!(comment.message(), "Please sign in to comment.");

    let edit = board
        .edit_link(&id, Some("New"), None, None)
        .await
        .expect_err("edit refused");
    assert_eq!(edit.code(), ErrorCode::SignInRequired);
    assert_eq!(edit.message(), "Please sign in to edit links.");

    let snapshot = board.snapshot().await;
    assert_eq!(snapshot.links, before);
    assert_eq!(
        snapshot.notice.as_deref(),
        Some("Please sign in to edit links.")
    );
}

#[rstest]
#[case("", "https://example.com", "title")]
#[case("Example", "  ", "url")]
#[case("Example", "not a url", "url")]
#[tokio::test]
async fn submit_rejects_invalid_input_before_any_store_call(
    #[case] title: &str,
    #[case] url: &str,
    #[case] field: &str,
) {
    let (board, _identity) = make_board(MockLinkStore::new(), Some(alice()));

    let err = board
        .submit_link(title, url, "")
        .await
        .expect_err("validation failure");

    assert_eq!(err.code(), ErrorCode::ValidationFailure);
    assert_eq!(err.details().expect("details")["field"], field);
}

#[tokio::test]
async fn submit_stamps_author_and_owner_then_reloads_the_board() {
    let mut store = MockLinkStore::new();
    let mut created = link_record("new", 300);
    created.title = "Example".to_owned();
    created.url = "https://example.com".to_owned();
    created.description = "d".to_owned();
    expect_listings(&mut store, vec![Vec::new(), vec![created]]);
    store
        .expect_create_link()
        .withf(|link| {
            link.title == "Example"
                && link.url == "https://example.com"
                && link.description == "d"
                && link.author == "alice"
                && link.owner.as_ref() == "uid-alice"
        })
        .times(1)
        .return_once(|_| Ok(LinkId::new("new").expect("id")));
    store.expect_get_link().never();
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    let id = board
        .submit_link("Example", "https://example.com", "d")
        .await
        .expect("submit");

    let snapshot = board.snapshot().await;
    assert_eq!(id.as_ref(), "new");
    assert_eq!(snapshot.links.len(), 1);
    let link = &snapshot.links[0];
    assert_eq!(link.author, "alice");
    assert_eq!(link.votes, VoteCounters::default());
    assert!(link.comments.is_empty());
    assert_eq!(snapshot.notice, None);
}

#[tokio::test]
async fn reload_after_a_mutation_picks_up_other_writers() {
    let mut store = MockLinkStore::new();
    let mut voted = link_record("a", 100);
    voted.upvotes = 1;
    expect_listings(
        &mut store,
        vec![vec![link_record("a", 100)], vec![link_record("b", 200), voted]],
    );
    store
        .expect_set_vote_counter()
        .return_once(|_, _, _| Ok(()));
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    board
        .vote(&link_id("a"), VoteKind::Upvote)
        .await
        .expect("vote");

    let ids: Vec<_> = board
        .snapshot()
        .await
        .links
        .iter()
        .map(|l| l.id.to_string())
        .collect();
    assert_eq!(ids, ["b", "a"]);
}

#[tokio::test]
async fn targeted_refresh_inserts_the_new_link_in_timestamp_order() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("c", 300), link_record("a", 100)]);
    store
        .expect_create_link()
        .return_once(|_| Ok(LinkId::new("b").expect("id")));
    store
        .expect_get_link()
        .withf(|id| id.as_ref() == "b")
        .times(1)
        .return_once(|_| Ok(Some(link_record("b", 200))));
    let (board, _identity) = make_board_with_options(
        store,
        Some(alice()),
        BoardOptions {
            targeted_refresh: true,
            ..BoardOptions::default()
        },
    );
    board.start().await.expect("start");

    board
        .submit_link("B", "https://example.com/b", "")
        .await
        .expect("submit");

    let ids: Vec<_> = board
        .snapshot()
        .await
        .links
        .iter()
        .map(|l| l.id.to_string())
        .collect();
    assert_eq!(ids, ["c", "b", "a"]);
}

#[tokio::test]
async fn failed_submit_reports_a_notice() {
    let mut store = MockLinkStore::new();
    store
        .expect_create_link()
        .return_once(|_| Err(LinkStoreError::query("permission denied")));
    let (board, _identity) = make_board(store, Some(alice()));

    let err = board
        .submit_link("Example", "https://example.com", "")
        .await
        .expect_err("store failure");

    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    assert_eq!(
        board.snapshot().await.notice.as_deref(),
        Some("Failed to share link. Please try again.")
    );
}

#[tokio::test]
async fn vote_writes_the_locally_bumped_counter_then_reloads() {
    let mut store = MockLinkStore::new();
    let mut seen = link_record("a", 100);
    seen.downvotes = 3;
    let mut reloaded = seen.clone();
    reloaded.downvotes = 4;
    expect_listings(&mut store, vec![vec![seen], vec![reloaded]]);
    store
        .expect_set_vote_counter()
        .withf(|id, kind, value| id.as_ref() == "a" && *kind == VoteKind::Downvote && *value == 4)
        .times(1)
        .return_once(|_, _, _| Ok(()));
    store.expect_increment_vote().never();
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    board
        .vote(&link_id("a"), VoteKind::Downvote)
        .await
        .expect("vote");

    let link = &board.snapshot().await.links[0];
    assert_eq!(link.votes.downvotes, 4);
    assert_eq!(link.votes.upvotes, 0);
}

#[tokio::test]
async fn votes_from_a_stale_read_overwrite_each_other() {
    // The reload after the first vote still sees the old counter, so the
    // second vote writes the same absolute value again.
    let mut store = MockLinkStore::new();
    expect_listings(
        &mut store,
        vec![
            vec![link_record("a", 100)],
            vec![link_record("a", 100)],
            vec![link_record("a", 100)],
        ],
    );
    store
        .expect_set_vote_counter()
        .withf(|_, kind, value| *kind == VoteKind::Upvote && *value == 1)
        .times(2)
        .returning(|_, _, _| Ok(()));
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    for _ in 0..2 {
        board
            .vote(&link_id("a"), VoteKind::Upvote)
            .await
            .expect("vote");
    }
}

#[tokio::test]
async fn atomic_votes_use_the_store_increment() {
    let mut store = MockLinkStore::new();
    let mut reloaded = link_record("a", 100);
    reloaded.upvotes = 7;
    expect_listings(&mut store, vec![vec![link_record("a", 100)], vec![reloaded]]);
    store
        .expect_increment_vote()
        .withf(|id, kind| id.as_ref() == "a" && *kind == VoteKind::Upvote)
        .times(1)
        .return_once(|_, _| Ok(()));
    store.expect_set_vote_counter().never();
    let (board, _identity) = make_board_with_options(
        store,
        Some(alice()),
        BoardOptions {
            atomic_votes: true,
            ..BoardOptions::default()
        },
    );
    board.start().await.expect("start");

    board
        .vote(&link_id("a"), VoteKind::Upvote)
        .await
        .expect("vote");

    assert_eq!(board.snapshot().await.links[0].votes.upvotes, 7);
}

#[tokio::test]
async fn failed_vote_rolls_back_the_optimistic_bump() {
    let mut store = MockLinkStore::new();
    let mut record = link_record("a", 100);
    record.upvotes = 2;
    record.downvotes = 5;
    expect_listing(&mut store, vec![record]);
    store
        .expect_set_vote_counter()
        .return_once(|_, _, _| Err(LinkStoreError::connection("offline")));
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    let err = board
        .vote(&link_id("a"), VoteKind::Upvote)
        .await
        .expect_err("vote fails");

    assert_eq!(err.code(), ErrorCode::StoreUnavailable);
    assert_eq!(err.details().expect("details")["kind"], "connection");
    let snapshot = board.snapshot().await;
    assert_eq!(
        snapshot.links[0].votes,
        VoteCounters {
            upvotes: 2,
            downvotes: 5,
        }
    );
    assert_eq!(
        snapshot.notice.as_deref(),
        Some("Failed to record your vote.")
    );
}

#[tokio::test]
async fn rollback_keeps_counters_a_reload_replaced() {
    let gate = VoteGate::default();
    let mut fresh = link_record("a", 100);
    fresh.upvotes = 9;
    let store = StalledVoteStore {
        initial: link_record("a", 100),
        later: fresh,
        listed: AtomicBool::new(false),
        gate: gate.clone(),
    };
    let (loaded, _identity) =
        make_board_over(Arc::new(store), MockIdentityProvider::new(), Some(alice()));
    loaded.start().await.expect("start");
    let board = Arc::new(loaded);

    let voting = {
        let voter = Arc::clone(&board);
        tokio::spawn(async move { voter.vote(&link_id("a"), VoteKind::Upvote).await })
    };
    gate.entered.notified().await;
    board.reconcile().await.expect("reload while the vote is in flight");
    gate.release.notify_one();

    voting
        .await
        .expect("vote task")
        .expect_err("vote fails");
    assert_eq!(board.snapshot().await.links[0].votes.upvotes, 9);
}

#[tokio::test]
async fn voting_on_an_unknown_link_is_not_found() {
    let (board, _identity) = make_board(MockLinkStore::new(), Some(alice()));

    let err = board
        .vote(&link_id("ghost"), VoteKind::Upvote)
        .await
        .expect_err("unknown link");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.details().expect("details")["linkId"], "ghost");
}

#[tokio::test]
async fn vanished_links_are_dropped_on_targeted_refresh() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("a", 100)]);
    store
        .expect_set_vote_counter()
        .return_once(|_, _, _| Ok(()));
    store.expect_get_link().return_once(|_| Ok(None));
    let (board, _identity) = make_board_with_options(
        store,
        Some(alice()),
        BoardOptions {
            targeted_refresh: true,
            ..BoardOptions::default()
        },
    );
    board.start().await.expect("start");

    board
        .vote(&link_id("a"), VoteKind::Upvote)
        .await
        .expect("vote");

    assert!(board.snapshot().await.links.is_empty());
}

#[tokio::test]
async fn comments_are_appended_with_the_author_snapshot() {
    let mut store = MockLinkStore::new();
    let mut commented = link_record("a", 100);
    commented.comments = vec![comment_record("1710408600000", "nice", 1_710_408_600)];
    expect_listings(&mut store, vec![vec![link_record("a", 100)], vec![commented]]);
    store
        .expect_append_comment()
        .withf(|id, draft| {
            id.as_ref() == "a" && draft.text() == "nice" && draft.author() == "alice"
        })
        .times(1)
        .return_once(|_, _| Ok(comment_record("1710408600000", "nice", 1_710_408_600)));
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    board
        .add_comment(&link_id("a"), "  nice ")
        .await
        .expect("comment");

    let comments = &board.snapshot().await.links[0].comments;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "nice");
}

#[tokio::test]
async fn blank_comments_are_rejected() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("a", 100)]);
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    let err = board
        .add_comment(&link_id("a"), "   ")
        .await
        .expect_err("blank");

    assert_eq!(err.code(), ErrorCode::ValidationFailure);
    assert_eq!(err.message(), "Text must not be empty.");
}

#[tokio::test]
async fn authors_can_edit_their_links() {
    let mut store = MockLinkStore::new();
    let mut renamed = link_record("a", 100);
    renamed.title = "Renamed".to_owned();
    expect_listings(&mut store, vec![vec![link_record("a", 100)], vec![renamed]]);
    store
        .expect_patch_link()
        .withf(|id, patch| id.as_ref() == "a" && patch.title() == Some("Renamed"))
        .times(1)
        .return_once(|_, _| Ok(()));
    let (board, _identity) = make_board(store, Some(alice()));
    board.start().await.expect("start");

    board
        .edit_link(&link_id("a"), Some("Renamed"), None, None)
        .await
        .expect("edit");

    assert_eq!(board.snapshot().await.links[0].title, "Renamed");
}

#[tokio::test]
async fn other_display_names_are_forbidden_without_a_store_call() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("a", 100)]);
    store.expect_patch_link().never();
    let (board, _identity) = make_board(store, Some(identity("uid-alice", Some("bob"))));
    board.start().await.expect("start");

    let err = board
        .edit_link(&link_id("a"), Some("Hijacked"), None, None)
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.message(), "Only the author can edit this link.");
    assert_eq!(board.snapshot().await.links[0].title, "Link a");
}

#[tokio::test]
async fn another_account_with_the_author_name_may_edit() {
    let mut store = MockLinkStore::new();
    expect_listings(
        &mut store,
        vec![vec![link_record("a", 100)], vec![link_record("a", 100)]],
    );
    store
        .expect_patch_link()
        .times(1)
        .return_once(|_, _| Ok(()));
    let (board, _identity) = make_board(store, Some(identity("uid-other", Some("alice"))));
    board.start().await.expect("start");

    board
        .edit_link(&link_id("a"), None, None, Some("updated"))
        .await
        .expect("edit by display name");
}

#[rstest]
#[case(None, "alice", false)]
#[case(Some(("uid-alice", Some("alice"))), "alice", true)]
#[case(Some(("uid-bob", Some("alice"))), "alice", true)]
#[case(Some(("uid-alice", Some("bob"))), "alice", false)]
#[case(Some(("uid-alice", Some("Alice"))), "alice", false)]
#[case(Some(("uid-bob", None)), "Anonymous", false)]
fn may_edit_compares_display_name_with_author(
    #[case] caller: Option<(&str, Option<&str>)>,
    #[case] author: &str,
    #[case] expected: bool,
) {
    let signed_in = caller.map(|(id, name)| identity(id, name));
    let mut record = link_record("a", 100);
    record.author = author.to_owned();
    let link = Link::try_from(record).expect("link");

    assert_eq!(may_edit(signed_in.as_ref(), &link), expected);
}

#[tokio::test]
async fn periodic_reload_keeps_ticking_after_a_failure() {
    let mut store = MockLinkStore::new();
    let mut calls = 0;
    store.expect_list_links().returning(move || {
        calls += 1;
        match calls {
            1 => Ok(vec![link_record("a", 100)]),
            2 => Err(LinkStoreError::connection("offline")),
            _ => Ok(vec![link_record("b", 200), link_record("a", 100)]),
        }
    });
    let (loaded, _identity) = make_board(store, None);
    loaded.start().await.expect("start");
    let board = Arc::new(loaded);

    let ticker = board.spawn_periodic_reconcile(Duration::from_millis(5));
    let recovered = tokio::time::timeout(Duration::from_secs(5), async {
        while board.snapshot().await.links.len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    ticker.abort();

    recovered.expect("a later round reloads the board");
    assert_eq!(board.snapshot().await.notice, None);
}

#[tokio::test]
async fn can_edit_follows_identity_changes() {
    let mut store = MockLinkStore::new();
    expect_listing(&mut store, vec![link_record("a", 100)]);
    let (board, identity_tx) = make_board(store, None);
    board.start().await.expect("start");
    let link = board.snapshot().await.links[0].clone();

    assert!(!board.can_edit(&link));
    identity_tx.send_replace(Some(alice()));
    assert!(board.can_edit(&link));
    assert_eq!(board.snapshot().await.identity, Some(alice()));
}

#[tokio::test]
async fn sign_in_validates_before_calling_the_provider() {
    let (board, _identity) = make_board(MockLinkStore::new(), None);

    let err = board.sign_in("  ", "pw").await.expect_err("blank email");

    assert_eq!(err.code(), ErrorCode::ValidationFailure);
    assert_eq!(err.message(), "Email must not be empty.");
}

#[tokio::test]
async fn sign_out_routes_to_the_provider_and_clears_the_notice() {
    let mut provider = MockIdentityProvider::new();
    provider.expect_sign_out().times(1).return_once(|| Ok(()));
    let (board, _identity) = make_board_with_provider(MockLinkStore::new(), provider, None);
    board
        .vote(&link_id("a"), VoteKind::Upvote)
        .await
        .expect_err("signed out vote");
    assert!(board.snapshot().await.notice.is_some());

    board.sign_out().await.expect("sign out");

    assert_eq!(board.snapshot().await.notice, None);
}

#[tokio::test]
async fn failed_sign_in_surfaces_the_provider_message() {
    let mut provider = MockIdentityProvider::new();
    provider.expect_sign_in().return_once(|_| {
        Err(crate::domain::ports::IdentityProviderError::rejected(
            "Incorrect email or password.",
        ))
    });
    let (board, _identity) = make_board_with_provider(MockLinkStore::new(), provider, None);

    let err = board
        .sign_in("alice@example.com", "wrong")
        .await
        .expect_err("rejected");

    assert_eq!(err.code(), ErrorCode::AuthFailure);
    assert_eq!(
        board.snapshot().await.notice.as_deref(),
        Some("Incorrect email or password.")
    );
}


//! Tests for the presentation shell.

use std::sync::Arc;

use tokio::sync::watch;

use super::*;
use crate::domain::ports::{MockIdentityProvider, MockLinkStore, MockUserProfileRepository};
use crate::domain::{AccountService, LinkRecord, UserIdentity};
use crate::inbound::cli::parse_line;
use crate::test_support::{fixture_clock, identity, link_record};

type TestShell = Shell<MockLinkStore, MockIdentityProvider, MockUserProfileRepository>;

async fn started_shell(
    store: MockLinkStore,
    records: Vec<LinkRecord>,
    signed_in: Option<UserIdentity>,
) -> (TestShell, watch::Sender<Option<UserIdentity>>) {
    started_shell_with_listings(store, vec![records], signed_in).await
}

/// Shell whose store answers each `list_links` call with the next listing.
async fn started_shell_with_listings(
    mut store: MockLinkStore,
    listings: Vec<Vec<LinkRecord>>,
    signed_in: Option<UserIdentity>,
) -> (TestShell, watch::Sender<Option<UserIdentity>>) {
    let calls = listings.len();
    let mut pending = listings.into_iter();
    store
        .expect_list_links()
        .times(calls)
        .returning(move || Ok(pending.next().unwrap_or_default()));
    let (sender, receiver) = watch::channel(signed_in);
    let mut provider = MockIdentityProvider::new();
    provider
        .expect_identity_changes()
        .returning(move || receiver.clone());
    let accounts = AccountService::new(
        Arc::new(provider),
        Arc::new(MockUserProfileRepository::new()),
        fixture_clock(),
    );
    let board = Arc::new(LinkBoard::new(Arc::new(store), accounts));
    board.start().await.expect("start");
    (Shell::new(board), sender)
}

async fn run_line(shell: &TestShell, line: &str) -> Step {
    let command = parse_line(line).expect("parse").expect("command");
    shell.execute(command).await
}

fn reply(step: Step) -> String {
    match step {
        Step::Continue(reply) => reply,
        Step::Quit => panic!("unexpected quit"),
    }
}

#[tokio::test]
async fn list_renders_the_started_board() {
    let (shell, _identity) = started_shell(
        MockLinkStore::new(),
        vec![link_record("b", 200), link_record("a", 100)],
        None,
    )
    .await;

    let rendered = reply(run_line(&shell, "list").await);

    let first = rendered.find("[1] Link b").expect("first link");
    let second = rendered.find("[2] Link a").expect("second link");
    assert!(first < second);
}

#[tokio::test]
async fn out_of_range_positions_touch_nothing() {
    let (shell, _identity) = started_shell(
        MockLinkStore::new(),
        vec![link_record("a", 100)],
        Some(identity("uid-alice", Some("alice"))),
    )
    .await;

    for line in ["upvote 2", "downvote 0", "comment 5 hello"] {
        let text = reply(run_line(&shell, line).await);
        assert!(text.starts_with("! No link numbered"), "{line}: {text}");
    }
}

#[tokio::test]
async fn signed_out_votes_report_the_guard() {
    let (shell, _identity) =
        started_shell(MockLinkStore::new(), vec![link_record("a", 100)], None).await;

    let text = reply(run_line(&shell, "upvote 1").await);

    assert_eq!(text, "! Please sign in to vote.\n");
}

#[tokio::test]
async fn votes_go_to_the_listed_link() {
    let mut store = MockLinkStore::new();
    store
        .expect_set_vote_counter()
        .withf(|id, kind, value| id.as_ref() == "a" && *kind == VoteKind::Downvote && *value == 1)
        .times(1)
        .returning(|_, _, _| Ok(()));
    let mut voted = link_record("a", 100);
    voted.downvotes = 1;
    let (shell, _identity) = started_shell_with_listings(
        store,
        vec![
            vec![link_record("b", 200), link_record("a", 100)],
            vec![link_record("b", 200), voted],
        ],
        Some(identity("uid-alice", Some("alice"))),
    )
    .await;

    let text = reply(run_line(&shell, "downvote 2").await);

    assert!(text.starts_with("Vote recorded.\n"));
    assert!(text.contains("[2] Link a (yours)  +0 / -1"));
}

#[tokio::test]
async fn quit_ends_the_session() {
    let (shell, _identity) = started_shell(MockLinkStore::new(), Vec::new(), None).await;
    assert_eq!(run_line(&shell, "quit").await, Step::Quit);
}

#[tokio::test]
async fn run_stops_at_quit_and_reports_parse_errors() {
    let (shell, _identity) = started_shell(MockLinkStore::new(), Vec::new(), None).await;
    let mut output = Vec::new();

    shell
        .run(&b"frobnicate\n\nlist\nquit\nlist\n"[..], &mut output)
        .await
        .expect("run");

    let text = String::from_utf8(output).expect("utf8");
    assert!(text.contains("frobnicate"));
    assert_eq!(text.matches("No links shared yet.").count(), 1);
}

//! Plain-text rendering of board snapshots.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{BoardSnapshot, Link, UserIdentity, may_edit};

const SIGNED_OUT: &str = "Signed out. Use `signin` or `signup` to share and vote.";

struct Stamp(DateTime<Utc>);

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M UTC"))
    }
}

/// Banner line describing who is signed in.
pub fn identity_banner(identity: Option<&UserIdentity>) -> String {
    identity.map_or_else(
        || SIGNED_OUT.to_owned(),
        |who| {
            who.email().map_or_else(
                || format!("Signed in as {}", who.author_name()),
                |email| format!("Signed in as {} <{email}>", who.author_name()),
            )
        },
    )
}

/// One numbered link block.
struct LinkBlock<'a> {
    index: usize,
    link: &'a Link,
    editable: bool,
}

impl fmt::Display for LinkBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = self.link;
        let marker = if self.editable { " (yours)" } else { "" };
        writeln!(
            f,
            "[{index}] {title}{marker}  +{up} / -{down}",
            index = self.index,
            title = link.title,
            up = link.votes.upvotes,
            down = link.votes.downvotes,
        )?;
        writeln!(f, "    {}", link.url)?;
        writeln!(f, "    shared by {} on {}", link.author, Stamp(link.timestamp))?;
        if !link.description.is_empty() {
            writeln!(f, "    {}", link.description)?;
        }
        match link.comments.len() {
            0 => {}
            1 => writeln!(f, "    1 comment:")?,
            n => writeln!(f, "    {n} comments:")?,
        }
        link.comments.iter().try_for_each(|comment| {
            writeln!(
                f,
                "      - {}: {} ({})",
                comment.author,
                comment.text,
                Stamp(comment.timestamp)
            )
        })
    }
}

/// Whole-board view: identity banner, notice, then one block per link
/// numbered from 1 in board order.
struct BoardView<'a>(&'a BoardSnapshot);

impl fmt::Display for BoardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        writeln!(f, "{}", identity_banner(snapshot.identity.as_ref()))?;
        if let Some(notice) = &snapshot.notice {
            writeln!(f, "! {notice}")?;
        }
        if snapshot.loading {
            return writeln!(f, "Loading links...");
        }
        if snapshot.links.is_empty() {
            return writeln!(f, "No links shared yet.");
        }
        snapshot
            .links
            .iter()
            .enumerate()
            .try_for_each(|(position, link)| {
                let block = LinkBlock {
                    index: position + 1,
                    link,
                    editable: may_edit(snapshot.identity.as_ref(), link),
                };
                write!(f, "{block}")
            })
    }
}

/// Render the whole board as text.
pub fn render_board(snapshot: &BoardSnapshot) -> String {
    BoardView(snapshot).to_string()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for board rendering.

    use super::*;
    use crate::domain::{Comment, CommentId, LinkId, UserId, VoteCounters};
    use crate::test_support::{fixture_timestamp, identity};

    fn link(id: &str, title: &str) -> Link {
        Link {
            id: LinkId::new(id).expect("id"),
            title: title.to_owned(),
            url: format!("https://example.com/{id}"),
            description: String::new(),
            author: "alice".to_owned(),
            owner: Some(UserId::new("uid-alice").expect("owner")),
            timestamp: fixture_timestamp(),
            votes: VoteCounters {
                upvotes: 3,
                downvotes: 1,
            },
            comments: Vec::new(),
        }
    }

    fn snapshot(links: Vec<Link>) -> BoardSnapshot {
        BoardSnapshot {
            links,
            loading: false,
            notice: None,
            identity: None,
        }
    }

    #[test]
    fn renders_links_in_board_order() {
        let mut first = link("a", "First");
        first.description = "worth reading".to_owned();
        first.comments.push(Comment {
            id: CommentId::from_instant(fixture_timestamp()),
            text: "nice".to_owned(),
            author: "bob".to_owned(),
            timestamp: fixture_timestamp(),
        });
        let rendered = render_board(&snapshot(vec![first, link("b", "Second")]));

        assert_eq!(
            rendered,
            "Signed out. Use `signin` or `signup` to share and vote.\n\
             [1] First  +3 / -1\n\
             \x20   https://example.com/a\n\
             \x20   shared by alice on 2024-03-14 09:30 UTC\n\
             \x20   worth reading\n\
             \x20   1 comment:\n\
             \x20     - bob: nice (2024-03-14 09:30 UTC)\n\
             [2] Second  +3 / -1\n\
             \x20   https://example.com/b\n\
             \x20   shared by alice on 2024-03-14 09:30 UTC\n"
        );
    }

    #[test]
    fn marks_links_the_identity_may_edit() {
        let mut snapshot = snapshot(vec![link("a", "Mine")]);
        snapshot.identity = Some(identity("uid-alice", Some("alice")));

        let rendered = render_board(&snapshot);

        assert!(rendered.starts_with("Signed in as alice <uid-alice@example.com>\n"));
        assert!(rendered.contains("[1] Mine (yours)"));
    }

    #[test]
    fn shows_notice_and_loading_state() {
        let mut snapshot = snapshot(vec![link("a", "Hidden")]);
        snapshot.loading = true;
        snapshot.notice = Some("Failed to load links. Please try again later.".to_owned());

        let rendered = render_board(&snapshot);

        assert!(rendered.contains("! Failed to load links. Please try again later.\n"));
        assert!(rendered.ends_with("Loading links...\n"));
        assert!(!rendered.contains("Hidden"));
    }

    #[test]
    fn empty_boards_say_so() {
        assert!(render_board(&snapshot(Vec::new())).ends_with("No links shared yet.\n"));
    }
}

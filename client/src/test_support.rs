//! Shared fixtures for unit tests inside the crate.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    CommentRecord, DisplayName, LinkRecord, StoreTimestamp, UserId, UserIdentity,
};

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixtureClock {
    pub(crate) utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 9, 30, 0)
        .single()
        .expect("fixture timestamp")
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn identity(id: &str, display_name: Option<&str>) -> UserIdentity {
    UserIdentity::new(
        UserId::new(id).expect("fixture user id"),
        display_name.map(|name| DisplayName::new(name).expect("fixture display name")),
        Some(format!("{id}@example.com")),
    )
}

pub(crate) fn link_record(id: &str, seconds: i64) -> LinkRecord {
    LinkRecord {
        id: id.to_owned(),
        title: format!("Link {id}"),
        url: format!("https://example.com/{id}"),
        description: String::new(),
        author: "alice".to_owned(),
        owner: Some("uid-alice".to_owned()),
        timestamp: StoreTimestamp { seconds, nanos: 0 },
        upvotes: 0,
        downvotes: 0,
        comments: Vec::new(),
    }
}

pub(crate) fn comment_record(id: &str, text: &str, seconds: i64) -> CommentRecord {
    CommentRecord {
        id: id.to_owned(),
        text: text.to_owned(),
        author: "bob".to_owned(),
        timestamp: StoreTimestamp { seconds, nanos: 0 },
    }
}

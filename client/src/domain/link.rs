//! Link aggregate model.
//!
//! A [`Link`] is the in-memory shape of a shared link: identity, content
//! fields, two independent vote counters and an append-only comment list.
//! Links are built from raw store records ([`LinkRecord`]) by denormalising
//! the store's timestamp representation into [`DateTime<Utc>`], recursively
//! for every comment.
//!
//! The write-side inputs ([`LinkSubmission`], [`LinkPatch`],
//! [`CommentDraft`]) validate required fields so that empty values are
//! rejected before any remote call.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::user::UserId;

/// Store-assigned link document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkId(String);

/// Errors raised while validating identifiers and link inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValidationError {
    /// Identifier was empty.
    EmptyId,
    /// Identifier contained whitespace or a path separator.
    InvalidId,
    /// A required text field was blank once trimmed.
    EmptyField { field: &'static str },
    /// The URL did not parse as an absolute URL.
    InvalidUrl,
    /// A patch carried no fields.
    EmptyPatch,
}

impl fmt::Display for LinkValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "identifier must not be empty"),
            Self::InvalidId => write!(f, "identifier must not contain whitespace or slashes"),
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::InvalidUrl => write!(f, "url must be an absolute URL"),
            Self::EmptyPatch => write!(f, "an edit must change at least one field"),
        }
    }
}

impl std::error::Error for LinkValidationError {}

impl LinkValidationError {
    /// Name of the offending field, when the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyField { field } => Some(field),
            Self::InvalidUrl => Some("url"),
            Self::EmptyId | Self::InvalidId | Self::EmptyPatch => None,
        }
    }
}

fn validate_document_id(raw: &str) -> Result<(), LinkValidationError> {
    if raw.is_empty() {
        return Err(LinkValidationError::EmptyId);
    }
    if raw.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(LinkValidationError::InvalidId);
    }
    Ok(())
}

impl LinkId {
    /// Validate and construct a [`LinkId`].
    pub fn new(id: impl Into<String>) -> Result<Self, LinkValidationError> {
        let raw = id.into();
        validate_document_id(&raw)?;
        Ok(Self(raw))
    }
}

impl AsRef<str> for LinkId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<LinkId> for String {
    fn from(value: LinkId) -> Self {
        value.0
    }
}

impl TryFrom<String> for LinkId {
    type Error = LinkValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Comment identifier derived from the creation-time timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    /// Derive an identifier from a creation instant (milliseconds since epoch).
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use sharelinks::domain::CommentId;
    ///
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    /// assert_eq!(CommentId::from_instant(at).as_ref(), "1700000000123");
    /// ```
    pub fn from_instant(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis().to_string())
    }

    /// Wrap an identifier read back from the store.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl AsRef<str> for CommentId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Which of the two vote counters an intent targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    /// Store field holding this counter.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Upvote => "upvotes",
            Self::Downvote => "downvotes",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upvote => f.write_str("upvote"),
            Self::Downvote => f.write_str("downvote"),
        }
    }
}

/// Two independent vote counters; not a signed score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCounters {
    pub upvotes: u64,
    pub downvotes: u64,
}

impl VoteCounters {
    /// Current value of one counter.
    pub const fn get(self, kind: VoteKind) -> u64 {
        match kind {
            VoteKind::Upvote => self.upvotes,
            VoteKind::Downvote => self.downvotes,
        }
    }

    /// Counters with `kind` raised by one.
    #[must_use]
    pub const fn bumped(self, kind: VoteKind) -> Self {
        match kind {
            VoteKind::Upvote => Self {
                upvotes: self.upvotes.saturating_add(1),
                downvotes: self.downvotes,
            },
            VoteKind::Downvote => Self {
                upvotes: self.upvotes,
                downvotes: self.downvotes.saturating_add(1),
            },
        }
    }
}

/// A comment embedded in its parent link. Never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    /// Display-name snapshot of the commenter.
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// A shared link.
///
/// ## Invariants
/// - `id` is assigned by the store at creation and never changes.
/// - `author` is a display-name snapshot taken at submission. Edits are
///   gated on it, not on `owner`.
/// - `comments` are in append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    pub description: String,
    pub author: String,
    /// Account that submitted the link, recorded for reference only;
    /// `None` on legacy documents.
    pub owner: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    pub votes: VoteCounters,
    pub comments: Vec<Comment>,
}

/// The store's native timestamp representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl StoreTimestamp {
    /// Capture an application instant in store form.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanos: at.timestamp_subsec_nanos(),
        }
    }

    /// Denormalise into an application instant; `None` when out of range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

/// Raw comment element as stored in a link document's array field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub text: String,
    pub author: String,
    pub timestamp: StoreTimestamp,
}

/// Raw link document as returned by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub author: String,
    pub owner: Option<String>,
    pub timestamp: StoreTimestamp,
    pub upvotes: i64,
    pub downvotes: i64,
    pub comments: Vec<CommentRecord>,
}

/// Errors raised while denormalising a [`LinkRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRecordError {
    InvalidId { id: String },
    InvalidOwner { id: String },
    TimestampOutOfRange { id: String },
    NegativeCounter { id: String, field: &'static str },
}

impl fmt::Display for LinkRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId { id } => write!(f, "link record has invalid id {id:?}"),
            Self::InvalidOwner { id } => write!(f, "link {id} has an invalid owner id"),
            Self::TimestampOutOfRange { id } => {
                write!(f, "link {id} carries an out-of-range timestamp")
            }
            Self::NegativeCounter { id, field } => {
                write!(f, "link {id} has a negative {field} counter")
            }
        }
    }
}

impl std::error::Error for LinkRecordError {}

impl TryFrom<CommentRecord> for Comment {
    type Error = CommentRecord;

    fn try_from(record: CommentRecord) -> Result<Self, Self::Error> {
        let Some(timestamp) = record.timestamp.to_datetime() else {
            return Err(record);
        };
        Ok(Self {
            id: CommentId::from_stored(record.id),
            text: record.text,
            author: record.author,
            timestamp,
        })
    }
}

impl TryFrom<LinkRecord> for Link {
    type Error = LinkRecordError;

    fn try_from(record: LinkRecord) -> Result<Self, Self::Error> {
        let LinkRecord {
            id,
            title,
            url,
            description,
            author,
            owner,
            timestamp,
            upvotes,
            downvotes,
            comments,
        } = record;

        let timestamp = timestamp
            .to_datetime()
            .ok_or_else(|| LinkRecordError::TimestampOutOfRange { id: id.clone() })?;
        let votes = VoteCounters {
            upvotes: non_negative(&id, "upvotes", upvotes)?,
            downvotes: non_negative(&id, "downvotes", downvotes)?,
        };
        let owner = owner
            .map(UserId::new)
            .transpose()
            .map_err(|_| LinkRecordError::InvalidOwner { id: id.clone() })?;
        let comments = comments
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| LinkRecordError::TimestampOutOfRange { id: id.clone() })?;
        let link_id =
            LinkId::new(id.clone()).map_err(|_| LinkRecordError::InvalidId { id: id.clone() })?;

        Ok(Self {
            id: link_id,
            title,
            url,
            description,
            author,
            owner,
            timestamp,
            votes,
            comments,
        })
    }
}

fn non_negative(id: &str, field: &'static str, value: i64) -> Result<u64, LinkRecordError> {
    u64::try_from(value).map_err(|_| LinkRecordError::NegativeCounter {
        id: id.to_owned(),
        field,
    })
}

fn required(field: &'static str, value: &str) -> Result<String, LinkValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LinkValidationError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}

fn required_url(value: &str) -> Result<String, LinkValidationError> {
    let url = required("url", value)?;
    Url::parse(&url).map_err(|_| LinkValidationError::InvalidUrl)?;
    Ok(url)
}

/// Validated content of a new link submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSubmission {
    title: String,
    url: String,
    description: String,
}

impl LinkSubmission {
    /// Validate raw form values. Title and url are required; description
    /// may be empty.
    ///
    /// # Examples
    /// ```
    /// use sharelinks::domain::LinkSubmission;
    ///
    /// let ok = LinkSubmission::try_new("Example", "https://example.com", "d").unwrap();
    /// assert_eq!(ok.url(), "https://example.com");
    /// assert!(LinkSubmission::try_new(" ", "https://example.com", "").is_err());
    /// ```
    pub fn try_new(title: &str, url: &str, description: &str) -> Result<Self, LinkValidationError> {
        Ok(Self {
            title: required("title", title)?,
            url: required_url(url)?,
            description: description.trim().to_owned(),
        })
    }

    /// Submitted title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Submitted URL, trimmed but otherwise as typed.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submitted description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Partial update of a link's editable fields. Absent fields are left
/// untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl LinkPatch {
    /// Validate the supplied fields. At least one must be present; title
    /// and url must not be blank when present.
    pub fn try_new(
        title: Option<&str>,
        url: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, LinkValidationError> {
        if title.is_none() && url.is_none() && description.is_none() {
            return Err(LinkValidationError::EmptyPatch);
        }
        Ok(Self {
            title: title.map(|value| required("title", value)).transpose()?,
            url: url.map(required_url).transpose()?,
            description: description.map(|value| value.trim().to_owned()),
        })
    }

    /// New title, if changed.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// New URL, if changed.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// New description, if changed.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Store field paths touched by this patch, in a stable order.
    pub fn field_paths(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("url", self.url.is_some()),
            ("description", self.description.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// A comment about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    text: String,
    author: String,
}

impl CommentDraft {
    /// Validate comment text; the author snapshot is taken by the caller.
    pub fn try_new(text: &str, author: impl Into<String>) -> Result<Self, LinkValidationError> {
        Ok(Self {
            text: required("text", text)?,
            author: author.into(),
        })
    }

    /// Comment body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Display-name snapshot of the commenter.
    pub fn author(&self) -> &str {
        &self.author
    }
}

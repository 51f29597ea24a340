//! DTOs for the Firestore REST document representation.
//!
//! Firestore wraps every field in a single-key object naming its type, e.g.
//! `{"stringValue": "x"}` or `{"integerValue": "3"}`. The adapter decodes
//! documents into these DTOs first, then maps them into store records in
//! one pass.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CommentRecord, LinkRecord, StoreTimestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum ValueDto {
    NullValue(Option<String>),
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    StringValue(String),
    TimestampValue(String),
    ArrayValue(ArrayValueDto),
    MapValue(MapValueDto),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct ArrayValueDto {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(super) values: Vec<ValueDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct MapValueDto {
    #[serde(default)]
    pub(super) fields: BTreeMap<String, ValueDto>,
}

pub(super) type Fields = BTreeMap<String, ValueDto>;

/// A document as returned by `GET`, `PATCH` and `runQuery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) name: Option<String>,
    #[serde(default)]
    pub(super) fields: Fields,
}

impl DocumentDto {
    pub(super) fn with_fields(fields: Fields) -> Self {
        Self { name: None, fields }
    }

    /// Last path segment of the resource name.
    pub(super) fn id(&self) -> Result<&str, String> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| "document has no resource name".to_owned())
    }
}

/// One element of a `runQuery` response stream.
#[derive(Debug, Deserialize)]
pub(super) struct RunQueryItemDto {
    #[serde(default)]
    pub(super) document: Option<DocumentDto>,
}

impl ValueDto {
    pub(super) fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    pub(super) fn integer(value: i64) -> Self {
        Self::IntegerValue(value.to_string())
    }

    pub(super) fn timestamp(at: DateTime<Utc>) -> Self {
        Self::TimestampValue(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub(super) fn empty_array() -> Self {
        Self::ArrayValue(ArrayValueDto::default())
    }

    pub(super) fn map(fields: Fields) -> Self {
        Self::MapValue(MapValueDto { fields })
    }
}

fn string_field(fields: &Fields, name: &str) -> Result<String, String> {
    match fields.get(name) {
        None | Some(ValueDto::NullValue(_)) => Ok(String::new()),
        Some(ValueDto::StringValue(value)) => Ok(value.clone()),
        Some(other) => Err(format!("field {name} is not a string: {other:?}")),
    }
}

fn optional_string_field(fields: &Fields, name: &str) -> Result<Option<String>, String> {
    match fields.get(name) {
        None | Some(ValueDto::NullValue(_)) => Ok(None),
        Some(ValueDto::StringValue(value)) => Ok(Some(value.clone())),
        Some(other) => Err(format!("field {name} is not a string: {other:?}")),
    }
}

fn integer_field(fields: &Fields, name: &str) -> Result<i64, String> {
    match fields.get(name) {
        None | Some(ValueDto::NullValue(_)) => Ok(0),
        Some(ValueDto::IntegerValue(raw)) => raw
            .parse()
            .map_err(|_| format!("field {name} holds a malformed integer {raw:?}")),
        // Whole doubles written by other clients are still counters.
        Some(ValueDto::DoubleValue(value)) => value
            .to_string()
            .parse()
            .map_err(|_| format!("field {name} holds a non-integral number {value}")),
        Some(other) => Err(format!("field {name} is not an integer: {other:?}")),
    }
}

fn timestamp_field(fields: &Fields, name: &str) -> Result<StoreTimestamp, String> {
    match fields.get(name) {
        Some(ValueDto::TimestampValue(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|at| StoreTimestamp::from_datetime(at.with_timezone(&Utc)))
            .map_err(|err| format!("field {name} holds a malformed timestamp {raw:?}: {err}")),
        Some(other) => Err(format!("field {name} is not a timestamp: {other:?}")),
        None => Err(format!("field {name} is missing")),
    }
}

fn comment_from_value(value: &ValueDto) -> Result<CommentRecord, String> {
    let ValueDto::MapValue(MapValueDto { fields }) = value else {
        return Err(format!("comment element is not a map: {value:?}"));
    };
    Ok(CommentRecord {
        id: string_field(fields, "id")?,
        text: string_field(fields, "text")?,
        author: string_field(fields, "author")?,
        timestamp: timestamp_field(fields, "timestamp")?,
    })
}

/// Encode a stored comment as an array element.
pub(super) fn comment_to_value(comment: &CommentRecord, at: DateTime<Utc>) -> ValueDto {
    ValueDto::map(Fields::from([
        ("id".to_owned(), ValueDto::string(comment.id.as_str())),
        ("text".to_owned(), ValueDto::string(comment.text.as_str())),
        ("author".to_owned(), ValueDto::string(comment.author.as_str())),
        ("timestamp".to_owned(), ValueDto::timestamp(at)),
    ]))
}

impl TryFrom<DocumentDto> for LinkRecord {
    type Error = String;

    fn try_from(document: DocumentDto) -> Result<Self, Self::Error> {
        let id = document.id()?.to_owned();
        let fields = &document.fields;
        let comments = match fields.get("comments") {
            None | Some(ValueDto::NullValue(_)) => Vec::new(),
            Some(ValueDto::ArrayValue(array)) => array
                .values
                .iter()
                .map(comment_from_value)
                .collect::<Result<_, _>>()
                .map_err(|err| format!("link {id}: {err}"))?,
            Some(other) => return Err(format!("link {id}: comments is not an array: {other:?}")),
        };
        Ok(Self {
            title: in_link(&id, string_field(fields, "title"))?,
            url: in_link(&id, string_field(fields, "url"))?,
            description: in_link(&id, string_field(fields, "description"))?,
            author: in_link(&id, string_field(fields, "author"))?,
            owner: in_link(&id, optional_string_field(fields, "owner"))?,
            timestamp: in_link(&id, timestamp_field(fields, "timestamp"))?,
            upvotes: in_link(&id, integer_field(fields, "upvotes"))?,
            downvotes: in_link(&id, integer_field(fields, "downvotes"))?,
            comments,
            id,
        })
    }
}

fn in_link<T>(id: &str, result: Result<T, String>) -> Result<T, String> {
    result.map_err(|err| format!("link {id}: {err}"))
}

/// Structured query listing a collection newest first.
pub(super) fn newest_first_query(collection: &str) -> serde_json::Value {
    serde_json::json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": "timestamp" },
                "direction": "DESCENDING"
            }]
        }
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CommitRequestDto {
    pub(super) writes: Vec<WriteDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WriteDto {
    pub(super) transform: DocumentTransformDto,
    pub(super) current_document: PreconditionDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DocumentTransformDto {
    pub(super) document: String,
    pub(super) field_transforms: Vec<FieldTransformDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FieldTransformDto {
    pub(super) field_path: String,
    #[serde(flatten)]
    pub(super) operation: TransformOperationDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) enum TransformOperationDto {
    Increment(ValueDto),
    AppendMissingElements(ArrayValueDto),
}

#[derive(Debug, Serialize)]
pub(super) struct PreconditionDto {
    pub(super) exists: bool,
}

impl WriteDto {
    /// A single field transform on an existing document.
    pub(super) fn transform(document: String, field_transform: FieldTransformDto) -> Self {
        Self {
            transform: DocumentTransformDto {
                document,
                field_transforms: vec![field_transform],
            },
            current_document: PreconditionDto { exists: true },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) message: String,
    #[serde(default)]
    pub(super) status: String,
}

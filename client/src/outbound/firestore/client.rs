//! Reqwest-backed Firestore REST client shared by the document adapters.
//!
//! This type owns transport details only: URL composition, bearer
//! authentication, timeout and HTTP error mapping, and JSON decoding into
//! document DTOs. Adapters translate its results into port records.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{CommitRequestDto, DocumentDto, ErrorEnvelopeDto, Fields, RunQueryItemDto, WriteDto};

/// Supplies the bearer token attached to Firestore requests.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Token of the signed-in session, if any.
    async fn access_token(&self) -> Option<Zeroizing<String>>;
}

/// Token source for unauthenticated access.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousAccess;

#[async_trait]
impl AccessTokenSource for AnonymousAccess {
    async fn access_token(&self) -> Option<Zeroizing<String>> {
        None
    }
}

/// Connection settings for a Firestore database.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// API root, e.g. `https://firestore.googleapis.com`.
    pub endpoint: Url,
    /// Cloud project holding the `(default)` database.
    pub project_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(super) enum FirestoreError {
    #[error("{message}")]
    Transport { message: String },
    #[error("{message}")]
    NotFound { message: String },
    #[error("{message}")]
    Rejected { message: String },
    #[error("{message}")]
    Decode { message: String },
}

/// Thin Firestore REST client.
pub struct FirestoreClient {
    client: Client,
    documents_url: Url,
    database_name: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl FirestoreClient {
    /// Build a client using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint cannot carry path segments or the
    /// reqwest client cannot be constructed.
    pub fn new(
        config: &FirestoreConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, FirestoreSetupError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| FirestoreSetupError::Client(err.to_string()))?;
        let database_name = format!("projects/{}/databases/(default)", config.project_id);
        let mut documents_url = config.endpoint.clone();
        documents_url
            .path_segments_mut()
            .map_err(|()| FirestoreSetupError::Endpoint(config.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["v1", "projects", config.project_id.as_str(), "databases", "(default)"])
            .push("documents");
        Ok(Self {
            client,
            documents_url,
            database_name,
            tokens,
        })
    }

    fn url_with(&self, segments: &[&str]) -> Result<Url, FirestoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|()| FirestoreError::Transport {
                message: "documents URL cannot carry path segments".to_owned(),
            })?
            .extend(segments);
        Ok(url)
    }

    /// URL of the `documents` root with `suffix` appended to its last
    /// segment, as used by the `:runQuery` and `:commit` methods.
    fn documents_method_url(&self, suffix: &str) -> Result<Url, FirestoreError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|()| FirestoreError::Transport {
                message: "documents URL cannot carry path segments".to_owned(),
            })?
            .pop()
            .push(&format!("documents{suffix}"));
        Ok(url)
    }

    /// Full resource name of a document, as used inside commit writes.
    pub(super) fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{collection}/{id}", self.database_name)
    }

    pub(super) async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<DocumentDto>, FirestoreError> {
        let url = self.url_with(&[collection, id])?;
        match self.send(self.client.get(url)).await {
            Ok(body) => decode(&body).map(Some),
            Err(FirestoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub(super) async fn create_document(
        &self,
        collection: &str,
        fields: Fields,
    ) -> Result<DocumentDto, FirestoreError> {
        let url = self.url_with(&[collection])?;
        let body = self
            .send(self.client.post(url).json(&DocumentDto::with_fields(fields)))
            .await?;
        decode(&body)
    }

    /// Write `fields` into a document.
    ///
    /// With a `mask`, only the named fields change; without one the
    /// document is replaced. `must_exist` stops the write from creating
    /// a missing document.
    pub(super) async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: Option<&[&str]>,
        must_exist: bool,
    ) -> Result<DocumentDto, FirestoreError> {
        let mut url = self.url_with(&[collection, id])?;
        {
            let mut query = url.query_pairs_mut();
            for path in mask.unwrap_or_default() {
                query.append_pair("updateMask.fieldPaths", path);
            }
            if must_exist {
                query.append_pair("currentDocument.exists", "true");
            }
        }
        let body = self
            .send(self.client.patch(url).json(&DocumentDto::with_fields(fields)))
            .await?;
        decode(&body)
    }

    pub(super) async fn run_query(
        &self,
        query: &serde_json::Value,
    ) -> Result<Vec<DocumentDto>, FirestoreError> {
        let url = self.documents_method_url(":runQuery")?;
        let body = self.send(self.client.post(url).json(query)).await?;
        let items: Vec<RunQueryItemDto> = decode(&body)?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    pub(super) async fn commit(&self, writes: Vec<WriteDto>) -> Result<(), FirestoreError> {
        let url = self.documents_method_url(":commit")?;
        self.send(self.client.post(url).json(&CommitRequestDto { writes }))
            .await
            .map(drop)
    }

    async fn send(&self, mut request: RequestBuilder) -> Result<Vec<u8>, FirestoreError> {
        if let Some(token) = self.tokens.access_token().await {
            request = request.bearer_auth(token.as_str());
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}

/// Errors raised while building a [`FirestoreClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FirestoreSetupError {
    /// The endpoint URL cannot be a base for document paths.
    #[error("firestore endpoint {0} cannot carry a path")]
    Endpoint(String),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, FirestoreError> {
    serde_json::from_slice(body).map_err(|error| FirestoreError::Decode {
        message: format!("invalid Firestore JSON payload: {error}"),
    })
}

fn map_transport_error(error: reqwest::Error) -> FirestoreError {
    FirestoreError::Transport {
        message: error.to_string(),
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> FirestoreError {
    let detail = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .map(|envelope| format!("{}: {}", envelope.error.status, envelope.error.message))
        .unwrap_or_else(|_| body_preview(body));
    let message = if detail.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), detail)
    };

    match status {
        StatusCode::NOT_FOUND => FirestoreError::NotFound { message },
        StatusCode::REQUEST_TIMEOUT
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => FirestoreError::Transport { message },
        _ => FirestoreError::Rejected { message },
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

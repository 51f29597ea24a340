//! Client configuration loaded via OrthoConfig.
//!
//! Values layer CLI flags over `SHARELINKS_*` environment variables over
//! configuration files.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::BoardOptions;

const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";
const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Configuration values controlling the backend and its connections.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SHARELINKS")]
pub struct Settings {
    /// Use process-local adapters instead of the hosted backend.
    #[ortho_config(default = false)]
    pub in_memory: bool,
    /// Web API key of the hosted project.
    pub api_key: Option<String>,
    /// Hosted project identifier.
    pub project_id: Option<String>,
    /// Document store API root override.
    pub firestore_endpoint: Option<String>,
    /// Identity provider API root override.
    pub identity_endpoint: Option<String>,
    /// Per-request timeout for hosted calls, in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Reload the whole board this often, in seconds.
    pub reconcile_interval_secs: Option<u64>,
    /// Re-read only the mutated link after an intent instead of the whole
    /// board.
    #[ortho_config(default = false)]
    pub targeted_refresh: bool,
    /// Vote with store-side increments instead of absolute counter writes.
    #[ortho_config(default = false)]
    pub atomic_votes: bool,
}

/// Errors raised while interpreting [`Settings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// An endpoint override is not an absolute URL.
    #[error("invalid {setting} {value:?}: {source}")]
    Endpoint {
        setting: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Connection details for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedBackend {
    /// Web API key.
    pub api_key: String,
    /// Project identifier.
    pub project_id: String,
    /// Document store API root.
    pub firestore_endpoint: Url,
    /// Identity provider API root.
    pub identity_endpoint: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Which adapters the client should wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// In-memory adapters were requested.
    InMemory,
    /// Hosted backend settings are complete.
    Hosted(HostedBackend),
    /// Hosted settings are incomplete; `missing` names the absent keys.
    Incomplete {
        /// Names of the missing settings.
        missing: Vec<&'static str>,
    },
}

fn parse_endpoint(
    setting: &'static str,
    value: Option<&str>,
    default: &str,
) -> Result<Url, SettingsError> {
    let raw = value.unwrap_or(default);
    Url::parse(raw).map_err(|source| SettingsError::Endpoint {
        setting,
        value: raw.to_owned(),
        source,
    })
}

fn non_blank(value: Option<&String>) -> Option<&String> {
    value.filter(|raw| !raw.trim().is_empty())
}

impl Settings {
    /// Per-request timeout, falling back to ten seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Periodic reconciliation interval; `None` or zero disables it.
    pub fn reconcile_interval(&self) -> Option<Duration> {
        self.reconcile_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Board behaviour flags; both default to off.
    pub const fn board_options(&self) -> BoardOptions {
        BoardOptions {
            targeted_refresh: self.targeted_refresh,
            atomic_votes: self.atomic_votes,
        }
    }

    /// Decide which backend to wire.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Endpoint`] when an endpoint override does
    /// not parse.
    pub fn backend(&self) -> Result<Backend, SettingsError> {
        if self.in_memory {
            return Ok(Backend::InMemory);
        }
        let api_key = non_blank(self.api_key.as_ref());
        let project_id = non_blank(self.project_id.as_ref());
        let (Some(api_key), Some(project_id)) = (api_key, project_id) else {
            let missing = [("api_key", api_key), ("project_id", project_id)]
                .into_iter()
                .filter_map(|(name, value)| value.is_none().then_some(name))
                .collect();
            return Ok(Backend::Incomplete { missing });
        };
        Ok(Backend::Hosted(HostedBackend {
            api_key: api_key.clone(),
            project_id: project_id.clone(),
            firestore_endpoint: parse_endpoint(
                "firestore_endpoint",
                self.firestore_endpoint.as_deref(),
                DEFAULT_FIRESTORE_ENDPOINT,
            )?,
            identity_endpoint: parse_endpoint(
                "identity_endpoint",
                self.identity_endpoint.as_deref(),
                DEFAULT_IDENTITY_ENDPOINT,
            )?,
            request_timeout: self.request_timeout(),
        }))
    }
}

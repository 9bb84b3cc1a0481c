// File: crates/calbridge_gcal/src/auth.rs
//! Service account credentials for the Google Calendar hub.
//!
//! The hub is built on first use and cached. [`CredentialProvider::invalidate`]
//! drops it, so the next [`CredentialProvider::acquire`] re-reads the key
//! material from its source.

use base64::{engine::general_purpose, Engine as _};
use calbridge_config::{env_vars::SECRET_MARKER, GcalConfig};
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{parse_service_account_key, ServiceAccountAuthenticator, ServiceAccountKey},
    CalendarHub,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

// Type aliases for clarity
type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("no service account key configured (set GOOGLE_SERVICE_ACCOUNT_KEY or gcal.key_path)")]
    Missing,
    #[error("failed to read service account key {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("service account key is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error("service account key is malformed: {0}")]
    Malformed(String),
    #[error("failed to build Google Calendar client: {0}")]
    Client(String),
}

/// Where the service account key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Base64 encoded key JSON. Raw JSON is accepted as well.
    Inline(String),
    /// Path to a key JSON file.
    File(PathBuf),
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Inline(_) => f.write_str("Inline(<redacted>)"),
            CredentialSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl CredentialSource {
    /// Picks the inline key over the file path when both are configured.
    pub fn from_config(config: &GcalConfig) -> Option<Self> {
        let usable = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != SECRET_MARKER)
                .map(str::to_string)
        };
        usable(&config.service_account_key)
            .map(CredentialSource::Inline)
            .or_else(|| usable(&config.key_path).map(|p| CredentialSource::File(PathBuf::from(p))))
    }

    /// Reads and parses the key material.
    pub async fn load_key(&self) -> Result<ServiceAccountKey, CredentialError> {
        match self {
            CredentialSource::Inline(blob) => decode_inline_key(blob),
            CredentialSource::File(path) => {
                let bytes =
                    tokio::fs::read(path)
                        .await
                        .map_err(|source| CredentialError::Unreadable {
                            path: path.display().to_string(),
                            source,
                        })?;
                parse_key(&bytes)
            }
        }
    }
}

/// Decodes an inline key blob: base64 of the key JSON, or the JSON itself.
pub fn decode_inline_key(blob: &str) -> Result<ServiceAccountKey, CredentialError> {
    let trimmed = blob.trim();
    if trimmed.starts_with('{') {
        return parse_key(trimmed.as_bytes());
    }
    let bytes = general_purpose::STANDARD.decode(trimmed)?;
    parse_key(&bytes)
}

fn parse_key(bytes: &[u8]) -> Result<ServiceAccountKey, CredentialError> {
    parse_service_account_key(bytes).map_err(|e| CredentialError::Malformed(e.to_string()))
}

pub async fn create_calendar_hub(sa_key: ServiceAccountKey) -> Result<HubType, CredentialError> {
    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| CredentialError::Malformed(e.to_string()))?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| CredentialError::Client(e.to_string()))?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    Ok(CalendarHub::new(client, auth))
}

/// Lazily built, cached and invalidatable calendar hub.
pub struct CredentialProvider {
    source: Option<CredentialSource>,
    hub: RwLock<Option<Arc<HubType>>>,
}

impl CredentialProvider {
    pub fn new(source: Option<CredentialSource>) -> Self {
        Self {
            source,
            hub: RwLock::new(None),
        }
    }

    pub fn from_config(config: &GcalConfig) -> Self {
        Self::new(CredentialSource::from_config(config))
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Returns the cached hub, building it from the key source if needed.
    ///
    /// Concurrent first callers wait on the write lock, so the key is read
    /// and the authenticator built only once.
    pub async fn acquire(&self) -> Result<Arc<HubType>, CredentialError> {
        if let Some(hub) = self.hub.read().await.as_ref() {
            return Ok(hub.clone());
        }

        let mut slot = self.hub.write().await;
        if let Some(hub) = slot.as_ref() {
            return Ok(hub.clone());
        }

        let source = self.source.as_ref().ok_or(CredentialError::Missing)?;
        debug!("Loading service account key from {:?}", source);
        let key = source.load_key().await?;
        let client_email = key.client_email.clone();
        let hub = Arc::new(create_calendar_hub(key).await?);
        info!("Google Calendar client ready for {}", client_email);

        *slot = Some(hub.clone());
        Ok(hub)
    }

    /// Drops the cached hub; the next `acquire` starts from the key source.
    pub async fn invalidate(&self) {
        if self.hub.write().await.take().is_some() {
            info!("Service account credentials invalidated");
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.hub.read().await.is_some()
    }
}

// --- File: crates/calbridge_common/src/error.rs ---
use crate::services::GatewayError;
use std::fmt;
use thiserror::Error;

/// The error type surfaced by the HTTP layer.
///
/// Gateway failures convert into it through `From<GatewayError>`; the
/// `AlreadyDeleted` kind is expected to be resolved to success before it gets
/// here and maps to `NotFound` otherwise.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Malformed or missing request fields
    #[error("{0}")]
    ValidationError(String),

    /// The calendar or event does not exist
    #[error("{0}")]
    NotFound(String),

    /// The service credential lacks access
    #[error("{0}")]
    PermissionDenied(String),

    /// Key material missing or unusable. Operators should be alerted.
    #[error("Service account credential error: {0}")]
    CredentialError(String),

    /// Any other upstream failure
    #[error("{message}")]
    UpstreamError {
        message: String,
        details: Option<serde_json::Value>,
    },
}

impl BridgeError {
    /// Upstream detail payload, if any, for the `details` field of error bodies.
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            BridgeError::UpstreamError { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BridgeError {
    fn status_code(&self) -> u16 {
        match self {
            BridgeError::ValidationError(_) => 400,
            BridgeError::NotFound(_) => 404,
            BridgeError::PermissionDenied(_) => 403,
            BridgeError::CredentialError(_) => 500,
            BridgeError::UpstreamError { .. } => 500,
        }
    }
}

impl From<GatewayError> for BridgeError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(msg) | GatewayError::AlreadyDeleted(msg) => {
                BridgeError::NotFound(msg)
            }
            GatewayError::PermissionDenied(msg) => BridgeError::PermissionDenied(msg),
            GatewayError::InvalidDestination(msg) => BridgeError::ValidationError(msg),
            GatewayError::Credential(msg) => BridgeError::CredentialError(msg),
            GatewayError::Upstream { message, detail } => BridgeError::UpstreamError {
                message,
                details: detail,
            },
        }
    }
}

/// A request body that is not the expected JSON.
impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::ValidationError(format!("Invalid request body: {}", err))
    }
}

// Utility functions for error handling
pub fn validation_error<T: fmt::Display>(message: T) -> BridgeError {
    BridgeError::ValidationError(message.to_string())
}

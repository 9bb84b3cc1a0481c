// --- File: crates/calbridge_common/src/services.rs ---
//! Service abstractions for the upstream calendar provider.
//!
//! The [`CalendarGateway`] trait decouples the request handlers and the retry
//! sweeper from the concrete Google Calendar client, so both can be exercised
//! against an in-memory implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Failure kinds reported by a calendar gateway.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// The calendar or event does not exist (or is invisible to the credential).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The credential may not access the resource.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The resource existed but was removed earlier. Callers treat this as success.
    #[error("Already deleted: {0}")]
    AlreadyDeleted(String),

    /// A move targeted a calendar the shared credential cannot reach.
    #[error("Invalid destination calendar: {0}")]
    InvalidDestination(String),

    /// Key material missing, unreadable, malformed or rejected.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Any other upstream failure.
    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        detail: Option<serde_json::Value>,
    },
}

impl GatewayError {
    pub fn upstream<T: fmt::Display>(message: T) -> Self {
        GatewayError::Upstream {
            message: message.to_string(),
            detail: None,
        }
    }

    /// Not found and already deleted both mean "nothing left to delete".
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            GatewayError::NotFound(_) | GatewayError::AlreadyDeleted(_)
        )
    }
}

/// Who gets notified about a change.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SendUpdates {
    #[default]
    All,
    ExternalOnly,
    None,
}

impl SendUpdates {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendUpdates::All => "all",
            SendUpdates::ExternalOnly => "externalOnly",
            SendUpdates::None => "none",
        }
    }
}

/// An event to be inserted upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone name the event is displayed in.
    pub time_zone: String,
    /// Attendee email addresses. Empty for redelivered events.
    pub attendees: Vec<String>,
    /// Reminder settings in the provider's JSON shape, passed through untouched.
    pub reminders: Option<serde_json::Value>,
}

/// Filters for listing events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub max_results: Option<i32>,
}

/// An event as returned by the provider.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// RFC 3339 date-time, or a plain date for all-day events.
    pub start: Option<String>,
    pub end: Option<String>,
    pub time_zone: Option<String>,
    pub status: Option<String>,
    pub html_link: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarColors {
    pub color_id: Option<String>,
    pub background: Option<String>,
    pub foreground: Option<String>,
}

/// A calendar visible to the service credential.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub time_zone: Option<String>,
    pub access_role: Option<String>,
    pub colors: CalendarColors,
    pub selected: bool,
    pub primary: bool,
}

/// Uniform call contract over the provider's event and calendar operations.
///
/// Implementations own any credential handling; callers only see
/// [`GatewayError`] kinds.
pub trait CalendarGateway: Send + Sync {
    /// Insert an event into `calendar_id`.
    fn create_event(
        &self,
        calendar_id: &str,
        draft: EventDraft,
    ) -> BoxFuture<'_, EventRecord, GatewayError>;

    /// List events of `calendar_id`, recurring events expanded, ordered by start.
    fn list_events(
        &self,
        calendar_id: &str,
        query: EventQuery,
    ) -> BoxFuture<'_, Vec<EventRecord>, GatewayError>;

    fn get_event(&self, calendar_id: &str, event_id: &str)
        -> BoxFuture<'_, EventRecord, GatewayError>;

    /// Delete a single event. Does not search other calendars.
    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        send_updates: SendUpdates,
    ) -> BoxFuture<'_, (), GatewayError>;

    /// Move an event to `destination_id`, returning the moved event.
    fn move_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        destination_id: &str,
        send_updates: SendUpdates,
    ) -> BoxFuture<'_, EventRecord, GatewayError>;

    /// Calendars on the credential's calendar list.
    fn list_calendar_list(&self) -> BoxFuture<'_, Vec<CalendarEntry>, GatewayError>;

    /// Metadata of one calendar; doubles as an access check.
    fn get_calendar(&self, calendar_id: &str) -> BoxFuture<'_, CalendarEntry, GatewayError>;
}

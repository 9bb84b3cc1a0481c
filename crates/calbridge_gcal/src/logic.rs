// --- File: crates/calbridge_gcal/src/logic.rs ---
use calbridge_common::error::{validation_error, BridgeError};
use calbridge_common::services::{
    CalendarEntry, CalendarGateway, EventDraft, EventQuery, EventRecord, GatewayError,
    SendUpdates,
};
use calbridge_config::GcalConfig;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::queue::NewPendingEvent;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Largest page Google accepts for `events.list`.
pub const MAX_LIST_RESULTS: i32 = 2500;
pub const DEFAULT_LIST_RESULTS: i32 = 10;

// --- Data Structures ---

/// An attendee given either as a bare address or as `{"email": ...}`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(untagged)]
pub enum AttendeeInput {
    Email(String),
    Object { email: String },
}

impl AttendeeInput {
    pub fn email(&self) -> &str {
        match self {
            AttendeeInput::Email(email) | AttendeeInput::Object { email } => email,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct CreateEventRequest {
    pub calendar_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "Sync"))]
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// RFC 3339, or a local date-time read in `timeZone`
    #[cfg_attr(feature = "openapi", schema(example = "2025-01-01T10:00:00Z"))]
    pub start_date_time: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "2025-01-01T11:00:00Z"))]
    pub end_date_time: Option<String>,
    /// IANA zone name
    #[cfg_attr(feature = "openapi", schema(example = "Europe/Zurich"))]
    pub time_zone: Option<String>,
    pub attendees: Option<Vec<AttendeeInput>>,
    /// Passed through in Google's `reminders` shape
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub reminders: Option<serde_json::Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    /// Queue length after enqueueing; informational only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

/// Query parameters of `GET /list-events`, kept as strings so malformed
/// values can be reported in the JSON error body.
#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    pub calendar_id: Option<String>,
    /// Lower bound (RFC 3339); defaults to now
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    /// 1..=2500, defaults to 10
    pub max_results: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListEventsResponse {
    pub success: bool,
    pub events: Vec<EventRecord>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteEventRequest {
    pub event_id: Option<String>,
    pub calendar_id: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct MoveEventRequest {
    pub event_id: Option<String>,
    pub destination_calendar_id: Option<String>,
    pub calendar_id: Option<String>,
    pub send_updates: Option<SendUpdates>,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MoveEventResponse {
    pub success: bool,
    pub message: String,
    pub event: EventRecord,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListCalendarsResponse {
    pub success: bool,
    pub calendars: Vec<CalendarEntry>,
}

#[derive(Serialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub pending_events: usize,
    pub has_service_account: bool,
    pub default_calendar_id: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
}

/// Calendar and zone applied when a request leaves them out.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDefaults {
    pub calendar_id: String,
    pub time_zone: String,
}

impl EventDefaults {
    pub fn from_config(config: &GcalConfig) -> Self {
        Self {
            calendar_id: config.calendar_id.clone(),
            time_zone: config.time_zone.clone(),
        }
    }
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvent {
    pub calendar_id: String,
    pub draft: EventDraft,
    pub raw_start: String,
    pub raw_end: String,
}

impl ValidatedEvent {
    /// The queued form: same fields, attendees dropped.
    pub fn into_pending(self) -> NewPendingEvent {
        NewPendingEvent {
            calendar_id: self.calendar_id,
            summary: self.draft.summary,
            description: self.draft.description,
            location: self.draft.location,
            start_date_time: self.raw_start,
            end_date_time: self.raw_end,
            time_zone: self.draft.time_zone,
            reminders: self.draft.reminders,
        }
    }
}

// --- Validation ---

pub fn parse_time_zone(name: &str) -> Result<Tz, BridgeError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| validation_error(format!("Unknown time zone: {}", name)))
}

/// Parses an RFC 3339 timestamp, or a date-time without offset read in `tz`.
pub fn parse_event_time(value: &str, tz: Tz) -> Result<DateTime<Utc>, BridgeError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_minute_precision_with_offset(value) {
        return Ok(dt);
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| validation_error(format!("Invalid date-time: {}", value)))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| validation_error(format!("{} does not exist in {}", value, tz)))
}

/// `2025-01-01T10:00Z` and `2025-01-01T10:00+01:00`: ISO 8601 without seconds.
fn parse_minute_precision_with_offset(value: &str) -> Option<DateTime<Utc>> {
    if let Some(local) = value.strip_suffix(['Z', 'z']) {
        return NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M")
            .ok()
            .map(|naive| naive.and_utc());
    }
    ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"]
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn required(field: &str, value: Option<String>) -> Result<String, BridgeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| validation_error(format!("Missing required field: {}", field)))
}

fn optional_id(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Checks required fields, the zone and the time range of a create request.
pub fn validate_create_request(
    request: CreateEventRequest,
    defaults: &EventDefaults,
) -> Result<ValidatedEvent, BridgeError> {
    let summary = required("summary", request.summary)?;
    let raw_start = required("startDateTime", request.start_date_time)?;
    let raw_end = required("endDateTime", request.end_date_time)?;

    let time_zone = optional_id(request.time_zone, &defaults.time_zone);
    let tz = parse_time_zone(&time_zone)?;
    let start = parse_event_time(&raw_start, tz)?;
    let end = parse_event_time(&raw_end, tz)?;
    if end <= start {
        return Err(validation_error(
            "endDateTime must be after startDateTime",
        ));
    }

    let attendees = request
        .attendees
        .unwrap_or_default()
        .iter()
        .map(|a| a.email().trim().to_string())
        .filter(|email| !email.is_empty())
        .collect();

    Ok(ValidatedEvent {
        calendar_id: optional_id(request.calendar_id, &defaults.calendar_id),
        draft: EventDraft {
            summary,
            description: request.description,
            location: request.location,
            start,
            end,
            time_zone,
            attendees,
            reminders: request.reminders,
        },
        raw_start,
        raw_end,
    })
}

/// Resolves list-events query parameters against the defaults.
pub fn parse_list_query(
    query: ListEventsQuery,
    defaults: &EventDefaults,
    now: DateTime<Utc>,
) -> Result<(String, EventQuery), BridgeError> {
    let parse_bound = |name: &str, value: &str| {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| validation_error(format!("Invalid {}: {}", name, value)))
    };

    let time_min = match query.time_min.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(value) => parse_bound("timeMin", value)?,
        None => now,
    };
    let time_max = query
        .time_max
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|value| parse_bound("timeMax", value))
        .transpose()?;
    if let Some(time_max) = time_max {
        if time_max <= time_min {
            return Err(validation_error("timeMax must be after timeMin"));
        }
    }

    let max_results = match query.max_results.as_deref().filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|n| (1..=MAX_LIST_RESULTS).contains(n))
            .ok_or_else(|| {
                validation_error(format!(
                    "maxResults must be between 1 and {} (got {})",
                    MAX_LIST_RESULTS, value
                ))
            })?,
        None => DEFAULT_LIST_RESULTS,
    };

    Ok((
        optional_id(query.calendar_id, &defaults.calendar_id),
        EventQuery {
            time_min: Some(time_min),
            time_max,
            max_results: Some(max_results),
        },
    ))
}

// --- Delete & move ---

/// How a delete request was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Deleted from `calendar_id`, which may differ from the requested one.
    Deleted { calendar_id: String },
    /// Nothing left to delete; reported as success.
    AlreadyGone,
}

/// Deletes `event_id`, searching the other visible calendars when it is not in
/// `calendar_id`. Missing and already deleted events resolve to
/// [`DeleteOutcome::AlreadyGone`].
pub async fn delete_event_resolving(
    gateway: &dyn CalendarGateway,
    calendar_id: &str,
    event_id: &str,
) -> Result<DeleteOutcome, GatewayError> {
    gateway.get_calendar(calendar_id).await?;

    let resolved = match gateway.get_event(calendar_id, event_id).await {
        Ok(_) => calendar_id.to_string(),
        Err(e) if e.is_gone() => {
            debug!(
                "Event {} not in {}, searching other calendars",
                event_id, calendar_id
            );
            match find_event_elsewhere(gateway, calendar_id, event_id).await? {
                Some(found) => found,
                None => {
                    info!("Event {} not found anywhere, treating as deleted", event_id);
                    return Ok(DeleteOutcome::AlreadyGone);
                }
            }
        }
        Err(e) => return Err(e),
    };

    match gateway
        .delete_event(&resolved, event_id, SendUpdates::All)
        .await
    {
        Ok(()) => {
            info!("Deleted event {} from {}", event_id, resolved);
            Ok(DeleteOutcome::Deleted {
                calendar_id: resolved,
            })
        }
        Err(e) if e.is_gone() => {
            info!("Event {} was already deleted from {}", event_id, resolved);
            Ok(DeleteOutcome::AlreadyGone)
        }
        Err(e) => Err(e),
    }
}

async fn find_event_elsewhere(
    gateway: &dyn CalendarGateway,
    skip: &str,
    event_id: &str,
) -> Result<Option<String>, GatewayError> {
    for calendar in gateway.list_calendar_list().await? {
        if calendar.id == skip {
            continue;
        }
        match gateway.get_event(&calendar.id, event_id).await {
            Ok(_) => {
                debug!("Event {} found in {}", event_id, calendar.id);
                return Ok(Some(calendar.id));
            }
            // Calendars we cannot read simply do not hold the event for us.
            Err(e) => debug!("Event {} not readable in {}: {}", event_id, calendar.id, e),
        }
    }
    Ok(None)
}

/// Moves an event after checking access to both calendars.
///
/// `primary` as destination is refused before any upstream call: the shared
/// credential cannot reach a person's primary calendar.
pub async fn move_event_checked(
    gateway: &dyn CalendarGateway,
    calendar_id: &str,
    event_id: &str,
    destination_id: &str,
    send_updates: SendUpdates,
) -> Result<EventRecord, GatewayError> {
    let calendar_id = calendar_id.trim();
    let destination_id = destination_id.trim();
    if destination_id == "primary" {
        return Err(GatewayError::InvalidDestination(
            "Cannot move events to 'primary': use an explicit calendar id shared with the service account"
                .to_string(),
        ));
    }

    gateway.get_calendar(calendar_id).await?;
    gateway.get_calendar(destination_id).await?;

    let moved = gateway
        .move_event(calendar_id, event_id, destination_id, send_updates)
        .await?;
    info!(
        "Moved event {} from {} to {}",
        event_id, calendar_id, destination_id
    );
    Ok(moved)
}

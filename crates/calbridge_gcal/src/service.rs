// --- File: crates/calbridge_gcal/src/service.rs ---
//! Google Calendar implementation of [`CalendarGateway`].
//!
//! Every upstream call acquires the hub from the [`CredentialProvider`], runs
//! under the configured timeout, and has its failure classified into a
//! [`GatewayError`] kind from Google's structured error body.

use calbridge_common::services::{
    BoxFuture, CalendarColors, CalendarEntry, CalendarGateway, EventDraft, EventQuery,
    EventRecord, GatewayError, SendUpdates,
};
use google_calendar3::api::{
    Calendar, CalendarListEntry, Event, EventAttendee, EventDateTime, EventReminders,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{CredentialProvider, HubType};

/// Reasons Google reports with a 403 that are quota problems, not missing access.
const QUOTA_REASONS: [&str; 4] = [
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

/// Calendar gateway backed by the Google Calendar v3 API.
pub struct GoogleCalendarGateway {
    credentials: Arc<CredentialProvider>,
    timeout: Duration,
}

impl GoogleCalendarGateway {
    pub fn new(credentials: Arc<CredentialProvider>, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
        }
    }

    async fn hub(&self) -> Result<Arc<HubType>, GatewayError> {
        self.credentials
            .acquire()
            .await
            .map_err(|e| GatewayError::Credential(e.to_string()))
    }

    /// Runs one upstream request under the timeout and classifies its failure.
    /// Credential failures drop the cached hub.
    async fn call<T, F>(&self, op: &str, request: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, google_calendar3::Error>>,
    {
        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify_api_error(&e)),
            Err(_) => Err(GatewayError::upstream(format!(
                "{} timed out after {}s",
                op,
                self.timeout.as_secs()
            ))),
        };

        if let Err(err) = &result {
            debug!("Google Calendar {} failed: {}", op, err);
            if matches!(err, GatewayError::Credential(_)) {
                warn!("Credential rejected during {}, dropping cached client", op);
                self.credentials.invalidate().await;
            }
        }
        result
    }
}

impl CalendarGateway for GoogleCalendarGateway {
    fn create_event(
        &self,
        calendar_id: &str,
        draft: EventDraft,
    ) -> BoxFuture<'_, EventRecord, GatewayError> {
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            let hub = self.hub().await?;
            let send_updates = if draft.attendees.is_empty() {
                SendUpdates::None
            } else {
                SendUpdates::All
            };
            let event = draft_to_event(draft);

            let (_response, created) = self
                .call(
                    "events.insert",
                    hub.events()
                        .insert(event, &calendar_id)
                        .send_updates(send_updates.as_str())
                        .doit(),
                )
                .await?;
            Ok(event_to_record(created))
        })
    }

    fn list_events(
        &self,
        calendar_id: &str,
        query: EventQuery,
    ) -> BoxFuture<'_, Vec<EventRecord>, GatewayError> {
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            let hub = self.hub().await?;
            let mut request = hub
                .events()
                .list(&calendar_id)
                .single_events(true)
                .order_by("startTime");
            if let Some(time_min) = query.time_min {
                request = request.time_min(time_min);
            }
            if let Some(time_max) = query.time_max {
                request = request.time_max(time_max);
            }
            if let Some(max_results) = query.max_results {
                request = request.max_results(max_results);
            }

            let (_response, events) = self.call("events.list", request.doit()).await?;
            Ok(events
                .items
                .unwrap_or_default()
                .into_iter()
                .map(event_to_record)
                .collect())
        })
    }

    fn get_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, EventRecord, GatewayError> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();

        Box::pin(async move {
            let hub = self.hub().await?;
            let (_response, event) = self
                .call("events.get", hub.events().get(&calendar_id, &event_id).doit())
                .await?;
            Ok(event_to_record(event))
        })
    }

    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        send_updates: SendUpdates,
    ) -> BoxFuture<'_, (), GatewayError> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();

        Box::pin(async move {
            let hub = self.hub().await?;
            self.call(
                "events.delete",
                hub.events()
                    .delete(&calendar_id, &event_id)
                    .send_updates(send_updates.as_str())
                    .doit(),
            )
            .await?;
            Ok(())
        })
    }

    fn move_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        destination_id: &str,
        send_updates: SendUpdates,
    ) -> BoxFuture<'_, EventRecord, GatewayError> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        let destination_id = destination_id.to_string();

        Box::pin(async move {
            let hub = self.hub().await?;
            let (_response, moved) = self
                .call(
                    "events.move",
                    hub.events()
                        .move_(&calendar_id, &event_id, &destination_id)
                        .send_updates(send_updates.as_str())
                        .doit(),
                )
                .await?;
            Ok(event_to_record(moved))
        })
    }

    fn list_calendar_list(&self) -> BoxFuture<'_, Vec<CalendarEntry>, GatewayError> {
        Box::pin(async move {
            let hub = self.hub().await?;
            let mut entries = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut request = hub.calendar_list().list();
                if let Some(token) = page_token.as_deref() {
                    request = request.page_token(token);
                }
                let (_response, page) = self.call("calendarList.list", request.doit()).await?;
                entries.extend(
                    page.items
                        .unwrap_or_default()
                        .into_iter()
                        .map(calendar_list_entry_to_entry),
                );
                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }

            Ok(entries)
        })
    }

    fn get_calendar(&self, calendar_id: &str) -> BoxFuture<'_, CalendarEntry, GatewayError> {
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            let hub = self.hub().await?;
            let (_response, calendar) = self
                .call("calendars.get", hub.calendars().get(&calendar_id).doit())
                .await?;
            Ok(calendar_to_entry(calendar))
        })
    }
}

/// Maps a client error onto the gateway's failure kinds.
pub fn classify_api_error(err: &google_calendar3::Error) -> GatewayError {
    use google_calendar3::Error;

    match err {
        Error::BadRequest(body) => classify_error_body(body),
        Error::Failure(response) => classify_status(
            response.status().as_u16(),
            &[],
            format!("Google Calendar returned HTTP {}", response.status()),
            None,
        ),
        Error::MissingToken(e) => {
            GatewayError::Credential(format!("could not obtain access token: {}", e))
        }
        Error::MissingAPIKey => GatewayError::Credential("no API key or token".to_string()),
        other => GatewayError::upstream(other),
    }
}

/// Classifies a Google JSON error body:
/// `{"error": {"code": 404, "message": "...", "errors": [{"reason": "notFound"}]}}`.
pub fn classify_error_body(body: &Value) -> GatewayError {
    let error = body.get("error").unwrap_or(body);
    let code = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|c| u16::try_from(c).ok())
        .unwrap_or(0);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Google Calendar request failed")
        .to_string();
    let reasons: Vec<&str> = error
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("reason").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    classify_status(code, &reasons, message, Some(body.clone()))
}

/// Maps an HTTP status plus Google's error reasons to a failure kind.
pub fn classify_status(
    code: u16,
    reasons: &[&str],
    message: String,
    detail: Option<Value>,
) -> GatewayError {
    let has_reason = |wanted: &str| reasons.iter().any(|r| *r == wanted);

    if code == 410 || has_reason("deleted") {
        return GatewayError::AlreadyDeleted(message);
    }
    if code == 404 || has_reason("notFound") {
        return GatewayError::NotFound(message);
    }
    if code == 401 || has_reason("authError") {
        return GatewayError::Credential(message);
    }
    if code == 403 && !reasons.iter().any(|r| QUOTA_REASONS.contains(r)) {
        return GatewayError::PermissionDenied(message);
    }
    GatewayError::Upstream { message, detail }
}

fn draft_to_event(draft: EventDraft) -> Event {
    let attendees = if draft.attendees.is_empty() {
        None
    } else {
        Some(
            draft
                .attendees
                .into_iter()
                .map(|email| EventAttendee {
                    email: Some(email),
                    ..Default::default()
                })
                .collect(),
        )
    };

    let reminders = draft
        .reminders
        .and_then(|value| match serde_json::from_value::<EventReminders>(value) {
            Ok(reminders) => Some(reminders),
            Err(e) => {
                warn!("Ignoring reminders that do not match the API shape: {}", e);
                None
            }
        });

    Event {
        summary: Some(draft.summary),
        description: draft.description,
        location: draft.location,
        start: Some(EventDateTime {
            date_time: Some(draft.start),
            time_zone: Some(draft.time_zone.clone()),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(draft.end),
            time_zone: Some(draft.time_zone),
            ..Default::default()
        }),
        attendees,
        reminders,
        ..Default::default()
    }
}

fn event_time(time: Option<&EventDateTime>) -> Option<String> {
    time.and_then(|t| {
        t.date_time
            .map(|dt| dt.to_rfc3339())
            .or_else(|| t.date.map(|d| d.to_string()))
    })
}

pub(crate) fn event_to_record(event: Event) -> EventRecord {
    EventRecord {
        id: event.id.unwrap_or_default(),
        summary: event.summary,
        description: event.description,
        location: event.location,
        start: event_time(event.start.as_ref()),
        end: event_time(event.end.as_ref()),
        time_zone: event.start.and_then(|s| s.time_zone),
        status: event.status,
        html_link: event.html_link,
        attendees: event
            .attendees
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.email)
            .collect(),
        created: event.created.map(|dt| dt.to_rfc3339()),
        updated: event.updated.map(|dt| dt.to_rfc3339()),
    }
}

fn calendar_list_entry_to_entry(entry: CalendarListEntry) -> CalendarEntry {
    CalendarEntry {
        id: entry.id.unwrap_or_default(),
        summary: entry.summary_override.or(entry.summary),
        description: entry.description,
        location: entry.location,
        time_zone: entry.time_zone,
        access_role: entry.access_role,
        colors: CalendarColors {
            color_id: entry.color_id,
            background: entry.background_color,
            foreground: entry.foreground_color,
        },
        selected: entry.selected.unwrap_or(false),
        primary: entry.primary.unwrap_or(false),
    }
}

fn calendar_to_entry(calendar: Calendar) -> CalendarEntry {
    CalendarEntry {
        id: calendar.id.unwrap_or_default(),
        summary: calendar.summary,
        description: calendar.description,
        location: calendar.location,
        time_zone: calendar.time_zone,
        ..Default::default()
    }
}

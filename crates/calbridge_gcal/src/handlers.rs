// File: crates/calbridge_gcal/src/handlers.rs
use crate::auth::CredentialProvider;
use crate::logic::{
    delete_event_resolving, move_event_checked, parse_list_query, validate_create_request,
    CreateEventRequest, CreateEventResponse, DeleteEventRequest, DeleteOutcome, EventDefaults,
    ListCalendarsResponse, ListEventsQuery, ListEventsResponse, MessageResponse,
    MoveEventRequest, MoveEventResponse, StatusResponse,
};
use crate::queue::PendingEventQueue;
use crate::service::GoogleCalendarGateway;
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Json,
};
use calbridge_common::error::{validation_error, BridgeError};
use calbridge_common::services::CalendarGateway;
use calbridge_config::AppConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// Shared state for the calendar handlers
#[derive(Clone)]
pub struct GcalState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn CalendarGateway>,
    pub queue: Arc<PendingEventQueue>,
}

impl GcalState {
    pub fn new(
        config: Arc<AppConfig>,
        gateway: Arc<dyn CalendarGateway>,
        queue: Arc<PendingEventQueue>,
    ) -> Self {
        Self {
            config,
            gateway,
            queue,
        }
    }

    /// Wires the Google gateway from configuration with an empty queue.
    ///
    /// Missing credentials are not fatal here: every upstream call then fails
    /// with a credential error, and creates end up queued.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let credentials = Arc::new(CredentialProvider::from_config(&config.gcal));
        if !credentials.is_configured() {
            warn!("No service account key configured; calendar calls will fail");
        }
        let timeout = Duration::from_secs(config.gcal.request_timeout_secs.max(1));
        let gateway = Arc::new(GoogleCalendarGateway::new(credentials, timeout));
        Self::new(config, gateway, Arc::new(PendingEventQueue::new()))
    }

    pub fn defaults(&self) -> EventDefaults {
        EventDefaults::from_config(&self.config.gcal)
    }
}

fn json_error(rejection: JsonRejection) -> BridgeError {
    validation_error(format!("Invalid request body: {}", rejection.body_text()))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates an event, queueing it for redelivery when the direct call fails.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/create-event",
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Created, or queued for retry", body = CreateEventResponse),
        (status = 400, description = "Missing fields or invalid time range")
    ),
    tag = "Calendar"
))]
pub async fn create_event_handler(
    State(state): State<Arc<GcalState>>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<Json<CreateEventResponse>, BridgeError> {
    let Json(request) = payload.map_err(json_error)?;
    let event = validate_create_request(request, &state.defaults())?;

    match state
        .gateway
        .create_event(&event.calendar_id, event.draft.clone())
        .await
    {
        Ok(created) => {
            info!("Created event {} in {}", created.id, event.calendar_id);
            Ok(Json(CreateEventResponse {
                success: true,
                message: "Event created successfully".to_string(),
                event_id: Some(created.id),
                html_link: created.html_link,
                queue_position: None,
            }))
        }
        Err(e) => {
            warn!(
                "Direct create in {} failed, queueing for retry: {}",
                event.calendar_id, e
            );
            let had_attendees = !event.draft.attendees.is_empty();
            let (queued_id, position) = state.queue.enqueue(event.into_pending());

            let mut message =
                "Calendar temporarily unavailable; event queued and will be retried".to_string();
            if had_attendees {
                message.push_str(" (attendees are not invited on retry)");
            }
            Ok(Json(CreateEventResponse {
                success: true,
                message,
                event_id: Some(queued_id),
                html_link: None,
                queue_position: Some(position),
            }))
        }
    }
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/list-events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Events ordered by start", body = ListEventsResponse),
        (status = 400, description = "Invalid query parameter"),
        (status = 403, description = "No access to the calendar"),
        (status = 404, description = "Calendar not found")
    ),
    tag = "Calendar"
))]
pub async fn list_events_handler(
    State(state): State<Arc<GcalState>>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<Json<ListEventsResponse>, BridgeError> {
    let Query(query) = query.map_err(|e| validation_error(e.body_text()))?;
    let (calendar_id, query) = parse_list_query(query, &state.defaults(), Utc::now())?;

    let events = state.gateway.list_events(&calendar_id, query).await?;
    Ok(Json(ListEventsResponse {
        success: true,
        events,
    }))
}

/// Deletes an event; missing and already deleted events count as success.
///
/// Accepts the ids as a JSON body or as query parameters, so it can be
/// mounted on both DELETE and POST.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/delete-event",
    request_body = DeleteEventRequest,
    responses(
        (status = 200, description = "Deleted or already gone", body = MessageResponse),
        (status = 400, description = "Missing eventId"),
        (status = 403, description = "No access to the calendar"),
        (status = 404, description = "Calendar not found")
    ),
    tag = "Calendar"
))]
pub async fn delete_event_handler(
    State(state): State<Arc<GcalState>>,
    query: Result<Query<DeleteEventRequest>, QueryRejection>,
    body: Bytes,
) -> Result<Json<MessageResponse>, BridgeError> {
    let Query(from_query) = query.map_err(|e| validation_error(e.body_text()))?;
    let from_body: DeleteEventRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DeleteEventRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let event_id = trimmed(from_body.event_id.or(from_query.event_id))
        .ok_or_else(|| validation_error("Missing required field: eventId"))?;
    let calendar_id = trimmed(from_body.calendar_id.or(from_query.calendar_id))
        .unwrap_or_else(|| state.config.gcal.calendar_id.clone());

    let outcome =
        delete_event_resolving(state.gateway.as_ref(), &calendar_id, &event_id).await?;
    let message = match outcome {
        DeleteOutcome::Deleted { calendar_id: found } if found != calendar_id => {
            format!("Event deleted successfully from calendar {}", found)
        }
        DeleteOutcome::Deleted { .. } => "Event deleted successfully".to_string(),
        DeleteOutcome::AlreadyGone => "Event was already deleted or does not exist".to_string(),
    };

    Ok(Json(MessageResponse {
        success: true,
        message,
    }))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/move-event",
    request_body = MoveEventRequest,
    responses(
        (status = 200, description = "Moved event", body = MoveEventResponse),
        (status = 400, description = "Missing fields or destination is primary"),
        (status = 403, description = "No access to a calendar"),
        (status = 404, description = "Calendar or event not found")
    ),
    tag = "Calendar"
))]
pub async fn move_event_handler(
    State(state): State<Arc<GcalState>>,
    payload: Result<Json<MoveEventRequest>, JsonRejection>,
) -> Result<Json<MoveEventResponse>, BridgeError> {
    let Json(request) = payload.map_err(json_error)?;

    let event_id = trimmed(request.event_id)
        .ok_or_else(|| validation_error("Missing required field: eventId"))?;
    let destination = trimmed(request.destination_calendar_id)
        .ok_or_else(|| validation_error("Missing required field: destinationCalendarId"))?;
    let calendar_id = trimmed(request.calendar_id)
        .unwrap_or_else(|| state.config.gcal.calendar_id.clone());

    let event = move_event_checked(
        state.gateway.as_ref(),
        &calendar_id,
        &event_id,
        &destination,
        request.send_updates.unwrap_or_default(),
    )
    .await?;

    Ok(Json(MoveEventResponse {
        success: true,
        message: format!("Event moved to calendar {}", destination),
        event,
    }))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/list-calendars",
    responses(
        (status = 200, description = "Calendars visible to the service account", body = ListCalendarsResponse)
    ),
    tag = "Calendar"
))]
pub async fn list_calendars_handler(
    State(state): State<Arc<GcalState>>,
) -> Result<Json<ListCalendarsResponse>, BridgeError> {
    let calendars = state.gateway.list_calendar_list().await?;
    Ok(Json(ListCalendarsResponse {
        success: true,
        calendars,
    }))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Service status and pending queue size", body = StatusResponse)
    ),
    tag = "Calendar"
))]
pub async fn status_handler(State(state): State<Arc<GcalState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        pending_events: state.queue.len(),
        has_service_account: state.config.gcal.has_service_account(),
        default_calendar_id: state.config.gcal.calendar_id.clone(),
        timestamp: Utc::now(),
        environment: state.config.environment.clone(),
    })
}

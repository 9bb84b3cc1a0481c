// File: crates/calbridge_gcal/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::logic::{
    AttendeeInput, CreateEventRequest, CreateEventResponse, DeleteEventRequest,
    ListCalendarsResponse, ListEventsQuery, ListEventsResponse, MessageResponse,
    MoveEventRequest, MoveEventResponse, StatusResponse,
};
use calbridge_common::services::{CalendarColors, CalendarEntry, EventRecord, SendUpdates};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::create_event_handler,
        crate::handlers::list_events_handler,
        crate::handlers::delete_event_handler,
        crate::handlers::move_event_handler,
        crate::handlers::list_calendars_handler,
        crate::handlers::status_handler,
    ),
    components(schemas(
        AttendeeInput,
        CreateEventRequest,
        CreateEventResponse,
        ListEventsQuery,
        ListEventsResponse,
        DeleteEventRequest,
        MessageResponse,
        MoveEventRequest,
        MoveEventResponse,
        ListCalendarsResponse,
        StatusResponse,
        EventRecord,
        CalendarEntry,
        CalendarColors,
        SendUpdates,
    )),
    tags(
        (name = "Calendar", description = "Calendar operations through the shared service account")
    )
)]
pub struct GcalApiDoc;

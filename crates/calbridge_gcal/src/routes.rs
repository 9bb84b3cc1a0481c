// --- File: crates/calbridge_gcal/src/routes.rs ---

use crate::handlers::{
    create_event_handler, delete_event_handler, list_calendars_handler, list_events_handler,
    move_event_handler, status_handler, GcalState,
};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all calendar routes, to be nested under `/api`.
pub fn routes(state: Arc<GcalState>) -> Router {
    Router::new()
        .route("/create-event", post(create_event_handler))
        .route("/list-events", get(list_events_handler))
        .route(
            "/delete-event",
            delete(delete_event_handler).post(delete_event_handler),
        )
        .route("/move-event", post(move_event_handler))
        .route("/list-calendars", get(list_calendars_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

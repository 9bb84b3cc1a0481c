// --- File: crates/calbridge_common/src/lib.rs ---

pub mod error; // Error handling
pub mod handlers; // Shared HTTP handlers
pub mod http; // Error to response mapping
pub mod logging; // Logging utilities
pub mod routes; // Shared routes (health)
pub mod services; // Calendar gateway contract

pub use routes::routes;

pub use error::{validation_error, BridgeError, HttpStatusCode};

pub use http::IntoHttpResponse;

pub use services::{
    BoxFuture, CalendarEntry, CalendarGateway, EventDraft, EventQuery, EventRecord, GatewayError,
    SendUpdates,
};

// --- File: crates/calbridge_common/src/routes.rs ---

use axum::{routing::get, Router};

use crate::handlers::health_handler;

/// Routes shared by every deployment, mounted at the root (not under `/api`).
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_handler))
}

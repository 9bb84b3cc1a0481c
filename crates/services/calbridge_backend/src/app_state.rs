// --- File: crates/services/calbridge_backend/src/app_state.rs ---
use axum::Router;
use calbridge_config::AppConfig;
use calbridge_gcal::routes as gcal_routes;
use calbridge_gcal::{GcalState, RetrySweeper, SweeperSettings};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Process-wide state: configuration plus the calendar state shared by the
/// handlers and the retry sweeper.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gcal: Arc<GcalState>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let gcal = Arc::new(GcalState::from_config(config.clone()));
        Self::with_gcal(config, gcal)
    }

    pub fn with_gcal(config: Arc<AppConfig>, gcal: Arc<GcalState>) -> Self {
        Self { config, gcal }
    }

    /// A sweeper draining this state's queue through its gateway.
    pub fn sweeper(&self) -> Arc<RetrySweeper> {
        Arc::new(RetrySweeper::new(
            self.gcal.queue.clone(),
            self.gcal.gateway.clone(),
            SweeperSettings::from_config(&self.config.retry),
        ))
    }

    /// `/health` at the root, calendar routes under `/api`, and static files
    /// as fallback when `server.static_dir` exists.
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .merge(calbridge_common::routes())
            .nest("/api", gcal_routes::routes(self.gcal.clone()));

        if let Some(dir) = self.config.server.static_dir.as_deref() {
            if Path::new(dir).is_dir() {
                info!("Serving static files from {}", dir);
                app = app.fallback_service(ServeDir::new(dir));
            } else {
                warn!("Static directory {} does not exist, not serving files", dir);
            }
        }

        app.layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }
}

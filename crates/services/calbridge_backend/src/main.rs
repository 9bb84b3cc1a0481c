// File: services/calbridge_backend/src/main.rs
mod app_state;

use app_state::AppState;
use calbridge_common::logging;
use calbridge_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // No-op when logging is already up; covers config load failures.
        logging::init();
        error!("calbridge failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(load_config()?);
    logging::init_with_level(logging::parse_level(&config.log_level));
    info!(
        "Starting calbridge ({} environment), default calendar {}",
        config.environment, config.gcal.calendar_id
    );

    let state = AppState::new(config.clone());
    let sweeper = state.sweeper().start();

    #[allow(unused_mut)] // for the features it needs to be mutable
    let mut app = state.router();

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use calbridge_gcal::doc::GcalApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "calbridge API",
                version = "0.1.0",
                description = "Calendar facade over a shared Google service account",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(GcalApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = logging::log_result(
        TcpListener::bind(&addr).await,
        &format!("Listening on http://{}", addr),
        &format!("Failed to bind {}", addr),
    )?;
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    let pending = state.gcal.queue.len();
    if pending > 0 {
        warn!("Shutting down with {} undelivered pending events", pending);
    }
    info!("calbridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

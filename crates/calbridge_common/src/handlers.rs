// --- File: crates/calbridge_common/src/handlers.rs ---

/// Liveness probe. Plain text so load balancers need no JSON parsing.
pub async fn health_handler() -> &'static str {
    "OK"
}

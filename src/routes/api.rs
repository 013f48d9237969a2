use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// Endpoints the SPA calls directly. They are not pages, so the navigation guard does not
/// run in front of them.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe.
        .route("/health", get(|| async { "ok" }))
        // GET /api/routes
        // The route table, so the SPA can build its own matcher from the same source.
        .route("/api/routes", get(handlers::get_routes))
        // POST /api/navigate
        // Asks the guard about a client-side transition.
        .route("/api/navigate", post(handlers::navigate))
        // POST/DELETE /api/session
        // Login completion (stores the session, consumes `redirectTo`) and logout.
        .route(
            "/api/session",
            post(handlers::complete_login).delete(handlers::logout),
        )
}

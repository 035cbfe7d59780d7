// ABOUTME: Route definitions for the agentdir HTTP API.
// ABOUTME: Assembles agent, category, and auth routes into one Axum Router guarded by SessionLayer.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;
use crate::auth::SessionLayer;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    let session = SessionLayer::new(state.auth.clone());

    Router::new()
        .route("/health", get(health))
        .route(
            "/agents",
            get(api::agents::list_agents)
                .post(api::agents::create_agent)
                .put(api::agents::update_agent)
                .delete(api::agents::delete_agent),
        )
        .route("/categories", get(api::agents::list_categories))
        .route("/auth/login", post(api::session::login))
        .route("/auth/logout", post(api::session::logout))
        .route("/auth/session", get(api::session::session_status))
        .with_state(state)
        .layer(session)
        .layer(TraceLayer::new_for_http())
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

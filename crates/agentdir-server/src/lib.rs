// ABOUTME: HTTP server for agentdir, providing the agent directory JSON API.
// ABOUTME: Uses Axum with a shared SQLite store and a single-administrator session gate.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use auth::{AuthError, AuthGate, SessionLayer};
pub use config::{AgentdirConfig, ConfigError, database_path};
pub use error::ApiError;
pub use routes::create_router;

// ABOUTME: Shared application state for the agentdir HTTP server.
// ABOUTME: Holds the agent store behind an async mutex and the process-wide AuthGate.

use std::sync::Arc;

use agentdir_store::AgentStore;
use tokio::sync::Mutex;

use crate::auth::AuthGate;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    /// The SQLite connection is not `Sync`; handlers take the lock for the
    /// duration of one schema check plus one statement.
    pub store: Arc<Mutex<AgentStore>>,
    pub auth: AuthGate,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: AgentStore, auth: AuthGate) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            auth,
        }
    }
}

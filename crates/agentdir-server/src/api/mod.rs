// ABOUTME: API module containing all HTTP handler functions for the agentdir JSON API.
// ABOUTME: Organized into sub-modules for agent CRUD and administrator session handling.

pub mod agents;
pub mod session;

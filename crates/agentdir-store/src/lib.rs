// ABOUTME: Persistence layer for agentdir, backed by a single SQLite agents table.
// ABOUTME: Provides schema bootstrap, CRUD operations, and sample-data seeding.

pub mod seed;
pub mod sqlite;

pub use seed::{sample_agents, seed};
pub use sqlite::{AgentStore, StoreError};

// ABOUTME: SQLite-backed store for the agents table: idempotent schema bootstrap plus CRUD.
// ABOUTME: Every operation is a single statement; uniqueness of ids is left to the primary key.

use std::path::Path;

use agentdir_core::input::DATE_FORMAT;
use agentdir_core::{Agent, Status};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("agent with id '{0}' already exists")]
    Conflict(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored agent '{id}' could not be decoded: {reason}")]
    Decode { id: String, reason: String },
}

/// The agents table as written by `ensure_schema`. `tech_stack` holds a JSON
/// array so entry order survives storage; `last_updated` is ISO `YYYY-MM-DD`
/// text, which sorts the same way a date column would.
const CREATE_AGENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS agents (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    github_url TEXT NOT NULL,
    category TEXT NOT NULL,
    status TEXT NOT NULL,
    tech_stack TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    demo_url TEXT
);";

/// A raw row from the agents table before decoding into an `Agent`.
#[derive(Debug, Clone)]
struct AgentRow {
    id: String,
    name: String,
    description: String,
    github_url: String,
    category: String,
    status: String,
    tech_stack: String,
    last_updated: String,
    demo_url: Option<String>,
}

impl AgentRow {
    fn decode(self) -> Result<Agent, StoreError> {
        let fail = |reason: String| StoreError::Decode {
            id: self.id.clone(),
            reason,
        };

        let status = self
            .status
            .parse::<Status>()
            .map_err(|e| fail(e.to_string()))?;
        let tech_stack: Vec<String> = serde_json::from_str(&self.tech_stack)
            .map_err(|e| fail(format!("tech_stack: {}", e)))?;
        let last_updated = NaiveDate::parse_from_str(&self.last_updated, DATE_FORMAT)
            .map_err(|e| fail(format!("last_updated: {}", e)))?;

        Ok(Agent {
            id: self.id,
            name: self.name,
            description: self.description,
            github_url: self.github_url,
            category: self.category,
            status,
            tech_stack,
            last_updated,
            demo_url: self.demo_url,
        })
    }
}

/// Store for directory entries. Holds a single SQLite connection; callers
/// share it behind a lock.
pub struct AgentStore {
    conn: Connection,
}

impl AgentStore {
    /// Open or create the SQLite database at the given path. The schema is
    /// not created here; call `ensure_schema` before data operations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Create the agents table if it does not exist. Safe to call before
    /// every operation.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(CREATE_AGENTS_TABLE)?;
        Ok(())
    }

    /// All agents, most recently updated first. Rows that cannot be decoded
    /// into an `Agent` are logged and left out of the listing.
    pub fn list_all(&self) -> Result<Vec<Agent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, github_url, category, status, tech_stack, last_updated, demo_url
             FROM agents ORDER BY last_updated DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(AgentRow {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                github_url: row.get(3)?,
                category: row.get(4)?,
                status: row.get(5)?,
                tech_stack: row.get(6)?,
                last_updated: row.get(7)?,
                demo_url: row.get(8)?,
            })
        })?;

        let mut agents = Vec::new();
        for row in rows {
            match row?.decode() {
                Ok(agent) => agents.push(agent),
                Err(e) => tracing::warn!(error = %e, "skipping undecodable agent row"),
            }
        }
        Ok(agents)
    }

    /// Insert a new agent. Fails with `StoreError::Conflict` if the id is taken.
    pub fn create(&self, agent: &Agent) -> Result<(), StoreError> {
        let tech_stack = encode_tech_stack(agent)?;
        let result = self.conn.execute(
            "INSERT INTO agents (id, name, description, github_url, category, status, tech_stack, last_updated, demo_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                agent.id,
                agent.name,
                agent.description,
                agent.github_url,
                agent.category,
                agent.status.as_str(),
                tech_stack,
                agent.last_updated.format(DATE_FORMAT).to_string(),
                agent.demo_url,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_primary_key_violation(&e) => Err(StoreError::Conflict(agent.id.clone())),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Replace every field of the row matching `agent.id`. Returns the number
    /// of rows changed, which is zero when no such agent exists.
    pub fn update(&self, agent: &Agent) -> Result<usize, StoreError> {
        let tech_stack = encode_tech_stack(agent)?;
        let changed = self.conn.execute(
            "UPDATE agents
             SET name = ?2,
                 description = ?3,
                 github_url = ?4,
                 category = ?5,
                 status = ?6,
                 tech_stack = ?7,
                 last_updated = ?8,
                 demo_url = ?9
             WHERE id = ?1",
            params![
                agent.id,
                agent.name,
                agent.description,
                agent.github_url,
                agent.category,
                agent.status.as_str(),
                tech_stack,
                agent.last_updated.format(DATE_FORMAT).to_string(),
                agent.demo_url,
            ],
        )?;
        Ok(changed)
    }

    /// Remove the agent with the given id. Returns the number of rows removed;
    /// deleting an absent id is not an error.
    pub fn delete(&self, id: &str) -> Result<usize, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1", params![id])?;
        Ok(removed)
    }

    /// Insert agents whose id is not yet present, leaving existing rows alone.
    /// Returns how many were inserted.
    pub fn insert_missing(&self, agents: &[Agent]) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for agent in agents {
            let tech_stack = encode_tech_stack(agent)?;
            inserted += self.conn.execute(
                "INSERT INTO agents (id, name, description, github_url, category, status, tech_stack, last_updated, demo_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    agent.id,
                    agent.name,
                    agent.description,
                    agent.github_url,
                    agent.category,
                    agent.status.as_str(),
                    tech_stack,
                    agent.last_updated.format(DATE_FORMAT).to_string(),
                    agent.demo_url,
                ],
            )?;
        }
        Ok(inserted)
    }
}

fn encode_tech_stack(agent: &Agent) -> Result<String, StoreError> {
    serde_json::to_string(&agent.tech_stack).map_err(|e| StoreError::Decode {
        id: agent.id.clone(),
        reason: format!("tech_stack: {}", e),
    })
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

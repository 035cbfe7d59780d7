// ABOUTME: Configuration loading and validation for the agentdir server.
// ABOUTME: Reads AGENTDIR_* environment variables and refuses to start without an admin password.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("AGENTDIR_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("AGENTDIR_ADMIN_PASSWORD is not set; refusing to start without an administrator secret")]
    MissingAdminPassword,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct AgentdirConfig {
    pub home: PathBuf,
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub admin_password: String,
    pub production: bool,
}

impl std::fmt::Debug for AgentdirConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentdirConfig")
            .field("home", &self.home)
            .field("db_path", &self.db_path)
            .field("bind", &self.bind)
            .field("admin_password", &"<redacted>")
            .field("production", &self.production)
            .finish()
    }
}

fn home_from_env() -> PathBuf {
    std::env::var("AGENTDIR_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp"))
                .join(".agentdir")
        })
}

fn db_path_from_env(home: &std::path::Path) -> PathBuf {
    std::env::var("AGENTDIR_DB")
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home.join("agents.db"))
}

/// Database location from AGENTDIR_DB / AGENTDIR_HOME alone, for commands
/// such as seeding that do not need the rest of the server configuration.
pub fn database_path() -> PathBuf {
    db_path_from_env(&home_from_env())
}

impl AgentdirConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - AGENTDIR_HOME: data directory (default: ~/.agentdir)
    /// - AGENTDIR_DB: SQLite database file (default: $AGENTDIR_HOME/agents.db)
    /// - AGENTDIR_BIND: socket address to bind (default: 127.0.0.1:7340)
    /// - AGENTDIR_ADMIN_PASSWORD: administrator secret (required)
    /// - AGENTDIR_PRODUCTION: mark session cookies Secure (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = home_from_env();
        let db_path = db_path_from_env(&home);

        let bind_str =
            std::env::var("AGENTDIR_BIND").unwrap_or_else(|_| "127.0.0.1:7340".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let admin_password = std::env::var("AGENTDIR_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::MissingAdminPassword)?;

        let production = std::env::var("AGENTDIR_PRODUCTION")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(false);

        Ok(Self {
            home,
            db_path,
            bind,
            admin_password,
            production,
        })
    }
}

// ABOUTME: Defines the Agent struct, the sole entity of the directory, and its Status enum.
// ABOUTME: Also carries the suggested category vocabulary offered by the creation form.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Categories suggested to administrators when creating an agent.
/// The store accepts any category string; this list is advisory only.
pub const SUGGESTED_CATEGORIES: &[&str] = &[
    "Data Processing",
    "Automation",
    "Monitoring",
    "Analytics",
    "Communication",
    "Security",
    "Development Tools",
    "Other",
];

/// Maturity of a listed agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Beta,
    Stable,
    Experimental,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Beta => "beta",
            Status::Stable => "stable",
            Status::Experimental => "experimental",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known status names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}', expected one of beta, stable, experimental")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beta" => Ok(Status::Beta),
            "stable" => Ok(Status::Stable),
            "experimental" => Ok(Status::Experimental),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A directory entry describing one internally built tool.
///
/// Field names serialize in camelCase (`githubUrl`, `techStack`, ...) since that
/// is the shape API clients read and write. `demoUrl` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub github_url: String,
    pub category: String,
    pub status: Status,
    pub tech_stack: Vec<String>,
    pub last_updated: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
}

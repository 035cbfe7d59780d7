// ABOUTME: Request-body shape for agent create/update and its validation into a well-formed Agent.
// ABOUTME: Normalizes tech stacks, fills defaults for id and lastUpdated, and collects field errors.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::model::{Agent, Status};

/// Date format used for `lastUpdated` on the wire and in storage.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A tech stack as supplied by a caller: either a list of entries or a single
/// comma-separated string as typed into the admin form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TechStackInput {
    List(Vec<String>),
    Csv(String),
}

impl TechStackInput {
    /// Normalize into an ordered list of trimmed, non-empty entries.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            TechStackInput::List(items) => normalize_entries(items.iter().map(String::as_str)),
            TechStackInput::Csv(text) => normalize_entries(text.split(',')),
        }
    }
}

fn normalize_entries<'a>(entries: impl Iterator<Item = &'a str>) -> Vec<String> {
    entries
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated tech stack, e.g. `"Python, FastAPI,  Pandas "`.
pub fn parse_tech_stack(text: &str) -> Vec<String> {
    TechStackInput::Csv(text.to_string()).normalize()
}

/// Generate a time-based agent id. ULIDs sort by creation time and do not
/// collide when two agents are created within the same millisecond.
pub fn generate_agent_id() -> String {
    format!("agent-{}", Ulid::new().to_string().to_lowercase())
}

/// How a missing `id` should be treated during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Assign a fresh id when the caller omitted one (create).
    Generate,
    /// The caller must supply the id (update).
    Require,
}

/// A single field-level problem found while validating an `AgentInput`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All problems found in one request body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid agent: {}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

/// Untrusted agent payload. Every field is optional so that a missing or
/// malformed field surfaces as a `FieldError` rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<TechStackInput>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
}

impl AgentInput {
    /// Check shape and required fields, producing a well-formed `Agent`.
    pub fn validate(self, ids: IdPolicy) -> Result<Agent, ValidationErrors> {
        let mut errors = Vec::new();

        let id = match self.id.filter(|id| !is_blank(id)) {
            Some(id) => id,
            None if ids == IdPolicy::Generate => generate_agent_id(),
            None => {
                errors.push(missing("id"));
                String::new()
            }
        };

        let name = required(&mut errors, "name", self.name);
        let description = required(&mut errors, "description", self.description);
        let github_url = required(&mut errors, "githubUrl", self.github_url);

        // Any category string is accepted as sent, including ones outside the suggested list.
        let category = match self.category {
            Some(c) => c,
            None => {
                errors.push(missing("category"));
                String::new()
            }
        };

        let status = match self.status.as_deref().map(str::trim) {
            Some(s) => match s.parse::<Status>() {
                Ok(status) => Some(status),
                Err(e) => {
                    errors.push(FieldError {
                        field: "status",
                        message: e.to_string(),
                    });
                    None
                }
            },
            None => {
                errors.push(missing("status"));
                None
            }
        };

        let tech_stack = self
            .tech_stack
            .map(|t| t.normalize())
            .unwrap_or_default();

        let last_updated = match self.last_updated.filter(|d| !is_blank(d)) {
            Some(text) => match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.push(FieldError {
                        field: "lastUpdated",
                        message: format!("'{}' is not a YYYY-MM-DD date", text),
                    });
                    None
                }
            },
            None => Some(Utc::now().date_naive()),
        };

        let demo_url = self.demo_url.filter(|u| !u.is_empty());

        match (status, last_updated) {
            (Some(status), Some(last_updated)) if errors.is_empty() => Ok(Agent {
                id,
                name,
                description,
                github_url,
                category,
                status,
                tech_stack,
                last_updated,
                demo_url,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn missing(field: &'static str) -> FieldError {
    FieldError {
        field,
        message: "is required".to_string(),
    }
}

fn required(errors: &mut Vec<FieldError>, field: &'static str, value: Option<String>) -> String {
    match value.filter(|v| !is_blank(v)) {
        Some(v) => v,
        None => {
            errors.push(missing(field));
            String::new()
        }
    }
}

impl From<Agent> for AgentInput {
    fn from(agent: Agent) -> Self {
        Self {
            id: Some(agent.id),
            name: Some(agent.name),
            description: Some(agent.description),
            github_url: Some(agent.github_url),
            category: Some(agent.category),
            status: Some(agent.status.to_string()),
            tech_stack: Some(TechStackInput::List(agent.tech_stack)),
            last_updated: Some(agent.last_updated.format(DATE_FORMAT).to_string()),
            demo_url: agent.demo_url,
        }
    }
}

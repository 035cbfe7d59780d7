// ABOUTME: Core library for agentdir, containing the agent data model and request validation.
// ABOUTME: This crate defines the shared types used by the store, the server, and the CLI.

pub mod input;
pub mod model;

pub use input::{
    AgentInput, FieldError, IdPolicy, TechStackInput, ValidationErrors, generate_agent_id,
    parse_tech_stack,
};
pub use model::{Agent, SUGGESTED_CATEGORIES, Status, UnknownStatus};

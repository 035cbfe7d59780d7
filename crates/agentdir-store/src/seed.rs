// ABOUTME: Sample directory entries and the seeding routine that loads them into a store.
// ABOUTME: Seeding is repeatable: agents whose id already exists are left untouched.

use agentdir_core::{Agent, Status};
use chrono::NaiveDate;

use crate::sqlite::{AgentStore, StoreError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn stack(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Three example agents covering each status and an optional demo link.
pub fn sample_agents() -> Vec<Agent> {
    vec![
        Agent {
            id: "sample-agent-1".to_string(),
            name: "Sample Data Processor".to_string(),
            description: "An example agent that processes and transforms data from multiple sources"
                .to_string(),
            github_url: "https://github.com/yourusername/sample-data-processor".to_string(),
            category: "Data Processing".to_string(),
            status: Status::Stable,
            tech_stack: stack(&["Python", "Pandas", "FastAPI"]),
            last_updated: date(2024, 12, 20),
            demo_url: None,
        },
        Agent {
            id: "sample-agent-2".to_string(),
            name: "Task Automator".to_string(),
            description: "Automates repetitive tasks and workflows across multiple platforms"
                .to_string(),
            github_url: "https://github.com/yourusername/task-automator".to_string(),
            category: "Automation".to_string(),
            status: Status::Beta,
            tech_stack: stack(&["Node.js", "TypeScript", "Puppeteer"]),
            last_updated: date(2024, 12, 22),
            demo_url: None,
        },
        Agent {
            id: "sample-agent-3".to_string(),
            name: "System Monitor".to_string(),
            description: "Real-time monitoring dashboard for system health and performance metrics"
                .to_string(),
            github_url: "https://github.com/yourusername/system-monitor".to_string(),
            category: "Monitoring".to_string(),
            status: Status::Experimental,
            tech_stack: stack(&["Go", "Prometheus", "Grafana"]),
            last_updated: date(2024, 12, 15),
            demo_url: Some("https://monitor-demo.example.com".to_string()),
        },
    ]
}

/// Ensure the schema exists and insert any of `agents` not already stored.
/// Returns the number of agents inserted.
pub fn seed(store: &AgentStore, agents: &[Agent]) -> Result<usize, StoreError> {
    store.ensure_schema()?;
    let inserted = store.insert_missing(agents)?;
    tracing::info!(
        inserted,
        skipped = agents.len() - inserted,
        "seeded agent directory"
    );
    Ok(inserted)
}

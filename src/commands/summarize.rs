use std::path::Path;

use anyhow::{Context, Result};

use crate::client::JiraClient;
use crate::report::{self, OutputFormat};
use crate::summary::{summarize, WorkflowConfig};

pub fn run(
    client: &JiraClient,
    jql: &str,
    limit: Option<usize>,
    outputs: &[OutputFormat],
    csv_path: &Path,
) -> Result<()> {
    println!("Using JQL: {}", jql.trim());
    println!("Searching for issues...");

    let issues = client.search_issues(jql, limit).context("JIRA search failed")?;
    println!("Found {} issues. Summarizing...", issues.len());

    let config = WorkflowConfig::default();
    let summaries = issues
        .iter()
        .map(|issue| summarize(&config, issue))
        .collect::<crate::error::Result<Vec<_>>>()
        .context("Failed to summarize issue changelog")?;

    if outputs.contains(&OutputFormat::Table) {
        report::print_table(&summaries);
    }

    if outputs.contains(&OutputFormat::Csv) {
        report::write_csv(&summaries, csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        println!("CSV output written to {}", csv_path.display());
    }

    Ok(())
}

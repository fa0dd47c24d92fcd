use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use crate::client::JiraClient;
use crate::dates::week_intervals;
use crate::summary::{status_on, WorkflowConfig};

/// Weekly cohort breakdown: for each Monday-Sunday week between `start`
/// and `end`, count issues by the status in effect at that week's end.
pub fn run(
    client: &JiraClient,
    jql: &str,
    limit: Option<usize>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let intervals = week_intervals(start, end);
    if intervals.is_empty() {
        println!("No whole weeks between {start} and {end}.");
        return Ok(());
    }

    println!("Using JQL: {}", jql.trim());
    println!("Searching for issues...");

    let issues = client.search_issues(jql, limit).context("JIRA search failed")?;
    println!("Found {} issues.", issues.len());

    let config = WorkflowConfig::default();
    let mut weeks: Vec<(NaiveDate, NaiveDate, BTreeMap<String, usize>)> = Vec::new();
    let mut statuses = BTreeSet::new();

    for (week_start, week_end) in intervals {
        let mut cohort: BTreeMap<String, usize> = BTreeMap::new();
        for issue in &issues {
            let status = status_on(&config, issue, week_end)
                .with_context(|| format!("Failed to replay history for {}", issue.key))?;
            *cohort.entry(status).or_default() += 1;
        }
        statuses.extend(cohort.keys().cloned());
        weeks.push((week_start, week_end, cohort));
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec!["Week".to_string()];
    header.extend(statuses.iter().cloned());
    table.set_header(header);

    for (week_start, week_end, cohort) in weeks {
        let mut row = vec![format!(
            "{} - {}",
            week_start.format("%m/%d/%Y"),
            week_end.format("%m/%d/%Y")
        )];
        for status in &statuses {
            row.push(cohort.get(status).copied().unwrap_or(0).to_string());
        }
        table.add_row(row);
    }

    println!("{table}");
    Ok(())
}

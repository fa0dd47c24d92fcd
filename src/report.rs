use std::fs;
use std::path::Path;
use std::str::FromStr;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use crate::dates::{format_display_date, round_to_half_day};
use crate::error::{CycletimeError, Result};
use crate::models::IssueSummary;

const COLUMNS: [&str; 9] = [
    "ID",
    "Story Points",
    "In Dev Date",
    "Code Review Date",
    "Done Date",
    "Blocked?",
    "Days Blocked",
    "Days In Dev",
    "Days In Dev + Blocked",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = CycletimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(CycletimeError::Configuration(s.to_string())),
        }
    }
}

fn row(summary: &IssueSummary) -> Vec<String> {
    let days_blocked = round_to_half_day(summary.time_blocked);
    let days_dev = round_to_half_day(summary.time_dev);

    vec![
        summary.key.clone(),
        summary.story_points.clone(),
        format_display_date(summary.date_in_dev.as_ref()),
        format_display_date(summary.date_code_review.as_ref()),
        format_display_date(summary.date_done.as_ref()),
        if summary.was_blocked() { "Yes" } else { "No" }.to_string(),
        format_days(days_blocked),
        format_days(days_dev),
        format_days(days_blocked + days_dev),
    ]
}

fn format_days(days: f64) -> String {
    format!("{days:.1}")
}

/// Render summaries as a console table.
pub fn print_table(summaries: &[IssueSummary]) {
    println!("{}", render_table(summaries));
}

fn render_table(summaries: &[IssueSummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(COLUMNS.to_vec());

    for summary in summaries {
        table.add_row(row(summary));
    }

    table
}

/// Write one CSV record per summary, header row first. Refuses an empty
/// batch instead of producing a headerless file.
pub fn write_csv(summaries: &[IssueSummary], path: &Path) -> Result<()> {
    if summaries.is_empty() {
        return Err(CycletimeError::EmptyResult);
    }

    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');

    for summary in summaries {
        let fields: Vec<String> = row(summary).iter().map(|f| csv_field(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    fs::write(path, out)?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

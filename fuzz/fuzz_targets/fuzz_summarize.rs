#![no_main]

//! Fuzz target for the changelog summarizer and the point-in-time status
//! query. Feeds arbitrary transition sequences through both; panics and
//! negative accumulated durations are the failure modes of interest.

use arbitrary::Arbitrary;
use chrono::{Duration, TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use cycletime::models::{ChangeItem, HistoryEntry, Issue};
use cycletime::summary::{status_on, summarize, WorkflowConfig};

const STATUSES: [&str; 8] = [
    "To Do",
    "Development",
    "Code Review",
    "Checked In",
    "QA",
    "Product Acceptance",
    "Blocked",
    "Done",
];

#[derive(Arbitrary, Debug)]
struct Transition {
    day_offset: u16,
    from_idx: u8,
    to_idx: u8,
}

#[derive(Arbitrary, Debug)]
struct SummarizeInput {
    transitions: Vec<Transition>,
    query_offset: u16,
}

fuzz_target!(|input: SummarizeInput| {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let history: Vec<HistoryEntry> = input
        .transitions
        .iter()
        .take(64)
        .map(|t| HistoryEntry {
            created: (base + Duration::days(i64::from(t.day_offset % 4000))).to_rfc3339(),
            items: vec![ChangeItem {
                field: "status".to_string(),
                from: Some(STATUSES[usize::from(t.from_idx) % STATUSES.len()].to_string()),
                to: Some(STATUSES[usize::from(t.to_idx) % STATUSES.len()].to_string()),
            }],
        })
        .collect();

    let issue = Issue {
        key: "FUZZ-1".to_string(),
        status: "Done".to_string(),
        created: base.to_rfc3339(),
        history,
    };

    let config = WorkflowConfig::default();

    let summary = summarize(&config, &issue).expect("fixed-format timestamps always parse");
    assert!(summary.time_dev >= Duration::zero());
    assert!(summary.time_blocked >= Duration::zero());

    let target = (base + Duration::days(i64::from(input.query_offset % 4000))).date_naive();
    status_on(&config, &issue, target).expect("fixed-format timestamps always parse");
});

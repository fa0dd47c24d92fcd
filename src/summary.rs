use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;

use crate::dates::parse_instant;
use crate::error::Result;
use crate::models::{HistoryEntry, Issue, IssueSummary};

/// Status vocabulary and canonical zone for one workflow.
///
/// Immutable once built; `Default` carries the production values. Tests
/// substitute their own zone or vocabulary instead of reaching for
/// ambient globals.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub zone: Tz,
    pub in_dev_statuses: HashSet<String>,
    pub blocked_status: String,
    pub code_review_status: String,
    pub done_status: String,
    /// Sentinel reported for dates before any recorded transition.
    pub created_status: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let in_dev = [
            "Development",
            "Code Review",
            "Checked In",
            "QA",
            "Product Acceptance",
        ];

        WorkflowConfig {
            zone: chrono_tz::America::New_York,
            in_dev_statuses: in_dev.iter().map(|s| s.to_string()).collect(),
            blocked_status: "Blocked".to_string(),
            code_review_status: "Code Review".to_string(),
            done_status: "Done".to_string(),
            created_status: "Created".to_string(),
        }
    }
}

impl WorkflowConfig {
    fn in_dev(&self, status: Option<&str>) -> bool {
        status.is_some_and(|s| self.in_dev_statuses.contains(s))
    }
}

/// Parse and stably sort one issue's history by timestamp. Entries sharing
/// a timestamp keep their input order.
fn sorted_history<'a>(
    config: &WorkflowConfig,
    history: &'a [HistoryEntry],
) -> Result<Vec<(DateTime<Tz>, &'a HistoryEntry)>> {
    let mut dated = history
        .iter()
        .map(|entry| Ok((parse_instant(&entry.created, config.zone)?, entry)))
        .collect::<Result<Vec<_>>>()?;
    dated.sort_by_key(|(created, _)| *created);
    Ok(dated)
}

/// Reduce one issue's changelog to its workflow-timing summary.
///
/// A single pass over the sorted history. Dev time is charged by the
/// status an issue leaves; blocked time only for spans that closed again.
/// An issue still blocked at the end of its history reports nothing for
/// the open span, matching the behavior of the reports this replaces.
pub fn summarize(config: &WorkflowConfig, issue: &Issue) -> Result<IssueSummary> {
    let date_created = parse_instant(&issue.created, config.zone)?;

    let mut time_blocked = Duration::zero();
    let mut time_dev = Duration::zero();
    let mut date_previous = date_created;
    let mut blocked_since: Option<DateTime<Tz>> = None;
    let mut date_in_dev = None;
    let mut date_code_review = None;
    let mut date_done = None;

    for (date_current, entry) in sorted_history(config, &issue.history)? {
        for item in entry.items.iter().filter(|i| i.field == "status") {
            let to = item.to.as_deref();

            if to == Some(config.blocked_status.as_str()) {
                // Re-entering Blocked restarts the open span.
                blocked_since = Some(date_current);
            } else if let Some(since) = blocked_since.take() {
                time_blocked = time_blocked + (date_current - since);
            }

            if config.in_dev(item.from.as_deref()) {
                time_dev = time_dev + (date_current - date_previous);
            }

            if config.in_dev(to) && date_in_dev.is_none() {
                date_in_dev = Some(date_current);
            }

            if to == Some(config.code_review_status.as_str()) {
                date_code_review = Some(date_current);
            }

            if to == Some(config.done_status.as_str()) {
                date_done = Some(date_current);
            }
        }

        // The previous-event anchor advances on every entry, whether or
        // not it carried a status item.
        date_previous = date_current;
    }

    Ok(IssueSummary {
        key: issue.key.clone(),
        status: issue.status.clone(),
        story_points: String::new(),
        time_blocked,
        time_dev,
        date_created,
        date_in_dev,
        date_code_review,
        date_done,
    })
}

/// Status in effect at the start of `target` (a canonical-zone calendar
/// date), reconstructed by replaying sorted history. Entries dated on or
/// after the target date are not applied; dates before the first
/// transition report the "Created" sentinel.
pub fn status_on(config: &WorkflowConfig, issue: &Issue, target: NaiveDate) -> Result<String> {
    let mut status = config.created_status.clone();

    for (created, entry) in sorted_history(config, &issue.history)? {
        if created.date_naive() >= target {
            break;
        }

        for item in entry.items.iter().filter(|i| i.field == "status") {
            if let Some(to) = item.to.as_deref() {
                status = to.to_string();
            }
        }
    }

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CycletimeError;
    use crate::models::ChangeItem;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    // Day 0 of every fixture. Midnight UTC lands at 7pm the previous
    // evening in the canonical zone, same as the recorded reports this
    // suite was checked against.
    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset)
    }

    fn ts(offset: i64) -> String {
        day(offset).to_rfc3339()
    }

    fn target(offset: i64) -> NaiveDate {
        day(offset).date_naive()
    }

    fn status_change(from: &str, to: &str) -> ChangeItem {
        ChangeItem {
            field: "status".to_string(),
            from: Some(from.to_string()),
            to: Some(to.to_string()),
        }
    }

    fn entry(offset: i64, from: &str, to: &str) -> HistoryEntry {
        HistoryEntry {
            created: ts(offset),
            items: vec![status_change(from, to)],
        }
    }

    fn issue(history: Vec<HistoryEntry>) -> Issue {
        Issue {
            key: "TEST-456".to_string(),
            status: "Done".to_string(),
            created: ts(0),
            history,
        }
    }

    fn blocked_issue() -> Issue {
        issue(vec![
            entry(1, "To Do", "Blocked"),
            entry(2, "Blocked", "Development"),
            entry(4, "Development", "Blocked"),
            entry(7, "Blocked", "Done"),
        ])
    }

    #[test]
    fn test_summarize_unstarted_issue() {
        let config = WorkflowConfig::default();
        let summary = summarize(&config, &issue(vec![])).unwrap();

        assert_eq!(summary.key, "TEST-456");
        assert_eq!(summary.status, "Done");
        assert_eq!(summary.story_points, "");
        assert_eq!(summary.time_blocked, Duration::zero());
        assert_eq!(summary.time_dev, Duration::zero());
        assert_eq!(summary.date_created, day(0).with_timezone(&config.zone));
        assert_eq!(summary.date_in_dev, None);
        assert_eq!(summary.date_code_review, None);
        assert_eq!(summary.date_done, None);
    }

    #[test]
    fn test_summarize_issue_with_development_history() {
        let config = WorkflowConfig::default();
        let summary = summarize(
            &config,
            &issue(vec![
                entry(2, "To Do", "Development"),
                entry(5, "Development", "Code Review"),
                entry(6, "Development", "Done"),
            ]),
        )
        .unwrap();

        assert_eq!(summary.date_in_dev, Some(day(2).with_timezone(&config.zone)));
        assert_eq!(summary.date_code_review, Some(day(5).with_timezone(&config.zone)));
        assert_eq!(summary.date_done, Some(day(6).with_timezone(&config.zone)));
        assert_eq!(summary.time_dev, Duration::days(4));
        assert_eq!(summary.time_blocked, Duration::zero());
    }

    #[test]
    fn test_summarize_blocked_issue() {
        let config = WorkflowConfig::default();
        let summary = summarize(&config, &blocked_issue()).unwrap();

        assert_eq!(summary.date_in_dev, Some(day(2).with_timezone(&config.zone)));
        assert_eq!(summary.date_code_review, None);
        assert_eq!(summary.date_done, Some(day(7).with_timezone(&config.zone)));
        assert_eq!(summary.time_dev, Duration::days(2));
        assert_eq!(summary.time_blocked, Duration::days(4));
        assert!(summary.was_blocked());
    }

    #[test]
    fn test_summarize_unsorted_history_matches_sorted() {
        let config = WorkflowConfig::default();
        let mut shuffled = blocked_issue();
        shuffled.history.reverse();

        assert_eq!(
            summarize(&config, &shuffled).unwrap(),
            summarize(&config, &blocked_issue()).unwrap()
        );
    }

    #[test]
    fn test_summarize_timestamp_ties_apply_in_input_order() {
        let config = WorkflowConfig::default();
        let subject = issue(vec![
            entry(3, "To Do", "Development"),
            entry(3, "Development", "QA"),
        ]);
        let summary = summarize(&config, &subject).unwrap();

        assert_eq!(summary.date_in_dev, Some(day(3).with_timezone(&config.zone)));
        assert_eq!(summary.time_dev, Duration::zero());
        // The second entry applied last.
        assert_eq!(status_on(&config, &subject, target(4)).unwrap(), "QA");
    }

    #[test]
    fn test_summarize_multiple_status_items_in_one_entry() {
        let config = WorkflowConfig::default();
        let summary = summarize(
            &config,
            &issue(vec![
                HistoryEntry {
                    created: ts(2),
                    items: vec![
                        ChangeItem {
                            field: "assignee".to_string(),
                            from: None,
                            to: Some("someone".to_string()),
                        },
                        status_change("To Do", "Development"),
                        status_change("Development", "Code Review"),
                    ],
                },
                entry(5, "Code Review", "Done"),
            ]),
        )
        .unwrap();

        assert_eq!(summary.date_in_dev, Some(day(2).with_timezone(&config.zone)));
        assert_eq!(summary.date_code_review, Some(day(2).with_timezone(&config.zone)));
        // The previous-event anchor advances per entry, not per item, so
        // the intra-entry Development departure charges the full day0-day2
        // interval, and the Code Review departure adds day2-day5.
        assert_eq!(summary.time_dev, Duration::days(5));
        assert_eq!(summary.date_done, Some(day(5).with_timezone(&config.zone)));
    }

    #[test]
    fn test_summarize_last_occurrence_wins_for_review_and_done() {
        let config = WorkflowConfig::default();
        let summary = summarize(
            &config,
            &issue(vec![
                entry(1, "To Do", "Code Review"),
                entry(2, "Code Review", "Development"),
                entry(3, "Development", "Code Review"),
                entry(4, "Code Review", "Done"),
                entry(6, "Done", "Development"),
                entry(8, "Development", "Done"),
            ]),
        )
        .unwrap();

        // First in-dev entry sticks; review and done take the latest.
        assert_eq!(summary.date_in_dev, Some(day(1).with_timezone(&config.zone)));
        assert_eq!(summary.date_code_review, Some(day(3).with_timezone(&config.zone)));
        assert_eq!(summary.date_done, Some(day(8).with_timezone(&config.zone)));
    }

    #[test]
    fn test_summarize_out_of_vocabulary_statuses() {
        let config = WorkflowConfig::default();
        let summary = summarize(
            &config,
            &issue(vec![
                entry(1, "To Do", "Design"),
                entry(3, "Design", "Done"),
            ]),
        )
        .unwrap();

        assert_eq!(summary.time_dev, Duration::zero());
        assert_eq!(summary.date_in_dev, None);
        assert_eq!(summary.date_done, Some(day(3).with_timezone(&config.zone)));
    }

    #[test]
    fn test_summarize_unclosed_blocked_span_not_counted() {
        let config = WorkflowConfig::default();
        let summary = summarize(&config, &issue(vec![entry(1, "To Do", "Blocked")])).unwrap();

        assert_eq!(summary.time_blocked, Duration::zero());
        assert!(!summary.was_blocked());
    }

    #[test]
    fn test_summarize_reentering_blocked_resets_span() {
        let config = WorkflowConfig::default();
        let summary = summarize(
            &config,
            &issue(vec![
                entry(1, "To Do", "Blocked"),
                entry(3, "Blocked", "Blocked"),
                entry(4, "Blocked", "Done"),
            ]),
        )
        .unwrap();

        // The day-3 re-entry restarted the clock.
        assert_eq!(summary.time_blocked, Duration::days(1));
    }

    #[test]
    fn test_summarize_rejects_bad_timestamp() {
        let config = WorkflowConfig::default();
        let mut subject = issue(vec![entry(1, "To Do", "Done")]);
        subject.history[0].created = "yesterday-ish".to_string();

        let err = summarize(&config, &subject).unwrap_err();
        assert!(matches!(err, CycletimeError::TimestampFormat(_)));
    }

    #[test]
    fn test_summarize_honors_custom_vocabulary() {
        let config = WorkflowConfig {
            zone: chrono_tz::UTC,
            in_dev_statuses: ["Doing".to_string()].into_iter().collect(),
            blocked_status: "Stuck".to_string(),
            done_status: "Shipped".to_string(),
            ..WorkflowConfig::default()
        };
        let summary = summarize(
            &config,
            &issue(vec![
                entry(1, "To Do", "Doing"),
                entry(2, "Doing", "Stuck"),
                entry(3, "Stuck", "Shipped"),
            ]),
        )
        .unwrap();

        assert_eq!(summary.date_in_dev, Some(day(1).with_timezone(&config.zone)));
        assert_eq!(summary.time_dev, Duration::days(1));
        assert_eq!(summary.time_blocked, Duration::days(1));
        assert_eq!(summary.date_done, Some(day(3).with_timezone(&config.zone)));
    }

    #[test]
    fn test_status_on_before_any_changes() {
        let config = WorkflowConfig::default();
        let subject = blocked_issue();

        assert_eq!(status_on(&config, &subject, target(-10)).unwrap(), "Created");
        assert_eq!(status_on(&config, &subject, target(0)).unwrap(), "Created");
    }

    #[test]
    fn test_status_on_walks_the_timeline() {
        let config = WorkflowConfig::default();
        let subject = blocked_issue();

        assert_eq!(status_on(&config, &subject, target(1)).unwrap(), "Blocked");
        assert_eq!(status_on(&config, &subject, target(2)).unwrap(), "Development");
        assert_eq!(status_on(&config, &subject, target(3)).unwrap(), "Development");
        assert_eq!(status_on(&config, &subject, target(4)).unwrap(), "Blocked");
        assert_eq!(status_on(&config, &subject, target(5)).unwrap(), "Blocked");
        assert_eq!(status_on(&config, &subject, target(6)).unwrap(), "Blocked");
        assert_eq!(status_on(&config, &subject, target(7)).unwrap(), "Done");
        assert_eq!(status_on(&config, &subject, target(3650)).unwrap(), "Done");
    }

    #[test]
    fn test_status_on_empty_history() {
        let config = WorkflowConfig::default();
        assert_eq!(status_on(&config, &issue(vec![]), target(5)).unwrap(), "Created");
    }

    const STATUS_POOL: [&str; 6] = [
        "To Do",
        "Development",
        "Code Review",
        "Blocked",
        "Done",
        "Design",
    ];

    fn arb_history() -> impl Strategy<Value = Vec<(i64, usize, usize)>> {
        proptest::collection::vec(
            (0i64..60, 0usize..STATUS_POOL.len(), 0usize..STATUS_POOL.len()),
            0..12,
        )
    }

    fn build_issue(transitions: &[(i64, usize, usize)]) -> Issue {
        issue(
            transitions
                .iter()
                .map(|&(offset, from_idx, to_idx)| {
                    entry(offset, STATUS_POOL[from_idx], STATUS_POOL[to_idx])
                })
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn prop_durations_never_negative(transitions in arb_history()) {
            let config = WorkflowConfig::default();
            let summary = summarize(&config, &build_issue(&transitions)).unwrap();

            prop_assert!(summary.time_dev >= Duration::zero());
            prop_assert!(summary.time_blocked >= Duration::zero());
        }

        #[test]
        fn prop_status_on_matches_replay_oracle(
            transitions in arb_history(),
            query_offset in -5i64..70,
        ) {
            let config = WorkflowConfig::default();
            let subject = build_issue(&transitions);
            let when = target(query_offset);

            // Independent oracle: stable-sort by offset, apply targets of
            // entries strictly before the query date.
            let mut sorted = transitions.clone();
            sorted.sort_by_key(|&(offset, _, _)| offset);
            let mut expected = "Created".to_string();
            for &(offset, _, to_idx) in &sorted {
                let entry_date = day(offset).with_timezone(&config.zone).date_naive();
                if entry_date >= when {
                    break;
                }
                expected = STATUS_POOL[to_idx].to_string();
            }

            prop_assert_eq!(status_on(&config, &subject, when).unwrap(), expected);
        }

        #[test]
        fn prop_status_on_is_monotonic(transitions in arb_history()) {
            let config = WorkflowConfig::default();
            let subject = build_issue(&transitions);

            // Full replay timeline: the sentinel, then each sorted entry's
            // target status. Statuses sampled at advancing query dates must
            // walk this timeline forward, never backward.
            let mut sorted = transitions.clone();
            sorted.sort_by_key(|&(offset, _, _)| offset);
            let timeline: Vec<&str> = std::iter::once("Created")
                .chain(sorted.iter().map(|&(_, _, to_idx)| STATUS_POOL[to_idx]))
                .collect();

            let mut cursor = 0usize;
            for offset in 0..70 {
                let status = status_on(&config, &subject, target(offset)).unwrap();
                match timeline[cursor..].iter().position(|s| *s == status) {
                    Some(found) => cursor += found,
                    None => prop_assert!(false, "status {} regressed at day {}", status, offset),
                }
            }
        }
    }
}

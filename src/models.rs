use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One issue as handed to the core: passthrough identity fields plus the
/// raw changelog. Timestamps stay as strings until the summarizer parses
/// them into the canonical zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub status: String,
    pub created: String,
    pub history: Vec<HistoryEntry>,
}

/// A batch of field changes recorded atomically at one timestamp. The
/// source does not guarantee entries arrive sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub created: String,
    pub items: Vec<ChangeItem>,
}

/// A single field change. Only `field == "status"` matters to the
/// summarizer; `from`/`to` are absent on the synthetic creation entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeItem {
    pub field: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Derived workflow-timing facts for one issue. Computed once per query,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueSummary {
    pub key: String,
    pub status: String,
    /// Reserved; never populated from the source issue.
    pub story_points: String,
    pub time_blocked: Duration,
    pub time_dev: Duration,
    pub date_created: DateTime<Tz>,
    pub date_in_dev: Option<DateTime<Tz>>,
    pub date_code_review: Option<DateTime<Tz>>,
    pub date_done: Option<DateTime<Tz>>,
}

impl IssueSummary {
    /// Whether any closed blocked span was accumulated.
    pub fn was_blocked(&self) -> bool {
        self.time_blocked > Duration::zero()
    }
}

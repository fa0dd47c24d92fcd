use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CycletimeError, Result};
use crate::models::{ChangeItem, HistoryEntry, Issue};

const SEARCH_PATH: &str = "/rest/api/2/search";
const ISSUE_FIELDS: &str = "status,created";
const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub server: String,
    pub email: String,
    pub token: String,
}

/// Blocking JIRA REST client. Auth is basic-auth pass-through; anything
/// fancier belongs to the server configuration, not this tool.
pub struct JiraClient {
    http: Client,
    config: JiraConfig,
}

// Wire shapes for the search endpoint. These never leave this module;
// callers see the core records from `models`.

#[derive(Deserialize)]
struct SearchResponse {
    total: usize,
    issues: Vec<RawIssue>,
}

#[derive(Deserialize)]
struct RawIssue {
    key: String,
    fields: RawFields,
    changelog: Option<RawChangelog>,
}

#[derive(Deserialize)]
struct RawFields {
    status: RawStatus,
    created: String,
}

#[derive(Deserialize)]
struct RawStatus {
    name: String,
}

#[derive(Deserialize)]
struct RawChangelog {
    histories: Vec<RawHistory>,
}

#[derive(Deserialize)]
struct RawHistory {
    created: String,
    items: Vec<RawItem>,
}

#[derive(Deserialize)]
struct RawItem {
    field: String,
    #[serde(rename = "fromString")]
    from: Option<String>,
    #[serde(rename = "toString")]
    to: Option<String>,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        let history = raw
            .changelog
            .map(|changelog| {
                changelog
                    .histories
                    .into_iter()
                    .map(|h| HistoryEntry {
                        created: h.created,
                        items: h
                            .items
                            .into_iter()
                            .map(|i| ChangeItem {
                                field: i.field,
                                from: i.from,
                                to: i.to,
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Issue {
            key: raw.key,
            status: raw.fields.status.name,
            created: raw.fields.created,
            history,
        }
    }
}

impl JiraClient {
    pub fn connect(config: JiraConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("cycletime/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(JiraClient { http, config })
    }

    /// Fetch every issue matching `jql`, changelog included, paging until
    /// the server-reported total or `limit` is reached.
    pub fn search_issues(&self, jql: &str, limit: Option<usize>) -> Result<Vec<Issue>> {
        let url = format!("{}{}", self.config.server.trim_end_matches('/'), SEARCH_PATH);
        let mut issues: Vec<Issue> = Vec::new();

        loop {
            let remaining = limit.map(|l| l.saturating_sub(issues.len()));
            if remaining == Some(0) {
                break;
            }
            let page_size = remaining.map_or(PAGE_SIZE, |r| r.min(PAGE_SIZE));

            debug!(start_at = issues.len(), page_size, "requesting search page");
            let params = [
                ("jql", jql.to_string()),
                ("startAt", issues.len().to_string()),
                ("maxResults", page_size.to_string()),
                ("expand", "changelog".to_string()),
                ("fields", ISSUE_FIELDS.to_string()),
            ];
            let response = self
                .http
                .get(&url)
                .basic_auth(&self.config.email, Some(&self.config.token))
                .query(&params)
                .send()?;

            if !response.status().is_success() {
                return Err(CycletimeError::Api {
                    status: response.status().as_u16(),
                    body: response.text().unwrap_or_default(),
                });
            }

            let page: SearchResponse = response.json()?;
            let total = page.total;
            if page.issues.is_empty() {
                break;
            }

            issues.extend(page.issues.into_iter().map(Issue::from));
            debug!(fetched = issues.len(), total, "search page received");

            if issues.len() >= total {
                break;
            }
        }

        Ok(issues)
    }
}

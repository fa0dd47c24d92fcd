//! Workflow timing reports derived from JIRA issue changelogs.
//!
//! The interesting part lives in [`summary`]: a single-pass reduction of an
//! issue's status changelog into timing facts (when development started,
//! when it finished, how long it sat blocked). Everything else is plumbing:
//! fetching issues over the JIRA REST API and rendering the results.

pub mod client;
pub mod commands;
pub mod dates;
pub mod error;
pub mod models;
pub mod report;
pub mod summary;

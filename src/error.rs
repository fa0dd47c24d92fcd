use thiserror::Error;

#[derive(Error, Debug)]
pub enum CycletimeError {
    #[error("unrecognized timestamp {0:?}")]
    TimestampFormat(String),

    #[error("no summaries to export")]
    EmptyResult,

    #[error("unsupported output format {0:?} (expected one of: table, csv)")]
    Configuration(String),

    #[error("JIRA request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JIRA returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CycletimeError>;

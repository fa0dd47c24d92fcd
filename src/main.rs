use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cycletime::client::{JiraClient, JiraConfig};
use cycletime::commands;
use cycletime::dates::parse_input_date;
use cycletime::report::OutputFormat;

const DEFAULT_JQL: &str = "type = Story AND labels IN (G-DSP, G-SSP, G-Platform, G-Data) \
                           AND labels NOT IN (Cadent) AND status = Done AND project = GCM";

#[derive(Parser)]
#[command(name = "cycletime")]
#[command(about = "Workflow timing reports derived from JIRA issue changelogs")]
#[command(version)]
struct Cli {
    /// JIRA server URL (can also be set via JIRA_SERVER env var)
    #[arg(long, env = "JIRA_SERVER")]
    server: String,

    /// Account email for basic auth (can also be set via JIRA_EMAIL env var)
    #[arg(long, env = "JIRA_EMAIL")]
    email: String,

    /// API token for basic auth (can also be set via JIRA_TOKEN env var)
    #[arg(long, env = "JIRA_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize issues matching a JQL query
    Summarize {
        /// JQL query to execute
        #[arg(long, default_value = DEFAULT_JQL)]
        jql: String,

        /// Maximum number of issues to retrieve. Default: unlimited
        #[arg(long)]
        limit: Option<usize>,

        /// Output format. Accepted: csv, table
        #[arg(short, long, value_delimiter = ',', default_values = ["table", "csv"])]
        output: Vec<OutputFormat>,

        /// Destination for the CSV export
        #[arg(long, default_value = "output.csv")]
        csv_path: PathBuf,
    },

    /// Weekly status cohorts for issues matching a JQL query
    Weekly {
        /// JQL query to execute
        #[arg(long, default_value = DEFAULT_JQL)]
        jql: String,

        /// Maximum number of issues to retrieve. Default: unlimited
        #[arg(long)]
        limit: Option<usize>,

        /// First report date (MM/DD/YYYY)
        #[arg(long, value_parser = parse_input_date)]
        start: NaiveDate,

        /// Last report date (MM/DD/YYYY)
        #[arg(long, value_parser = parse_input_date)]
        end: NaiveDate,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env().add_directive("cycletime=info".parse()?),
        )
        .init();

    println!("Connecting to JIRA server: {}", cli.server);
    let client = JiraClient::connect(JiraConfig {
        server: cli.server,
        email: cli.email,
        token: cli.token,
    })?;

    match cli.command {
        Commands::Summarize {
            jql,
            limit,
            output,
            csv_path,
        } => commands::summarize::run(&client, &jql, limit, &output, &csv_path),

        Commands::Weekly {
            jql,
            limit,
            start,
            end,
        } => commands::weekly::run(&client, &jql, limit, start, end),
    }
}

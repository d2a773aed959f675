use clap::{Args, Parser, Subcommand};

use crate::client::rum::DEFAULT_RUM_GROUP_FIELD;
use crate::client::{DataSource, Profile, RumEventType};
use crate::hydrate::DEFAULT_CONCURRENCY;

#[derive(Debug, Parser)]
#[command(name = "dd-cli")]
#[command(
    version,
    about = "Query Datadog logs and RUM through the web UI's internal APIs",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Output {
    /// Pretty print JSON
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the dogweb cookie and CSRF token (prompts for anything not given)
    Auth {
        #[arg(long)]
        cookie: Option<String>,
        #[arg(long)]
        csrf_token: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Show stored credentials and test the connection
    Status,
    /// List logs matching a query
    List {
        query: String,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, value_enum, default_value_t = Profile::List)]
        profile: Profile,
        /// Only the display fields
        #[arg(long)]
        simplified: bool,
        #[command(flatten)]
        output: Output,
    },
    /// Full details of a single log
    FetchOne {
        log_id: String,
        #[command(flatten)]
        output: Output,
    },
    /// Stream every matching log as NDJSON
    FetchAll {
        query: String,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[arg(long, default_value_t = 1000)]
        max: usize,
        #[arg(long, value_enum, default_value_t = Profile::List)]
        profile: Profile,
    },
    /// Stream logs joined with their full payloads as NDJSON
    Deep {
        query: String,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[arg(long, default_value_t = 50)]
        max: usize,
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
        #[arg(long, value_enum, default_value_t = Profile::List)]
        profile: Profile,
    },
    /// Top values of a field
    Top {
        query: String,
        #[arg(long, default_value = "service")]
        field: String,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[command(flatten)]
        output: Output,
    },
    /// Facet metadata and value counts
    FacetInfo {
        query: String,
        #[arg(long, default_value = "service")]
        facet: String,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[command(flatten)]
        output: Output,
    },
    /// Every log for a trace_id
    Trace {
        trace_id: String,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[arg(long, default_value_t = 200)]
        limit: u32,
        #[arg(long)]
        simplified: bool,
        #[command(flatten)]
        output: Output,
    },
    /// Real User Monitoring queries
    #[command(subcommand)]
    Rum(RumCommand),
    /// Explore field names and values
    #[command(subcommand)]
    Fields(FieldsCommand),
    /// Search Watchdog anomaly insights
    Watchdog {
        query: String,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[arg(long, value_enum, default_value_t = DataSource::Logs)]
        source: DataSource,
        #[command(flatten)]
        output: Output,
    },
    /// Saved views
    #[command(subcommand)]
    Views(ViewsCommand),
    /// Service dependency graph from APM
    Topology {
        #[arg(long, default_value = "sandbox")]
        env: String,
        #[arg(long, default_value_t = 1.0)]
        hours: f64,
        /// Reduce to this service and its direct neighbours
        #[arg(long)]
        service: Option<String>,
        #[command(flatten)]
        output: Output,
    },
    /// Serve the tools over MCP on stdio
    Mcp,
}

#[derive(Debug, Args)]
pub struct RumList {
    pub query: String,
    #[arg(long, default_value_t = 24.0)]
    pub hours: f64,
    #[arg(long, default_value_t = 100)]
    pub limit: u32,
    #[arg(long)]
    pub simplified: bool,
    #[command(flatten)]
    pub output: Output,
}

#[derive(Debug, Subcommand)]
pub enum RumCommand {
    /// User sessions
    Sessions {
        query: String,
        #[arg(long, default_value_t = 48.0)]
        hours: f64,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long)]
        simplified: bool,
        #[command(flatten)]
        output: Output,
    },
    /// User actions (clicks, inputs)
    Actions(RumList),
    /// Page views
    Views(RumList),
    /// Frontend errors
    Errors(RumList),
    /// Network resources (XHR, fetch)
    Resources(RumList),
    /// Stream every matching RUM event as NDJSON
    FetchAll {
        query: String,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[arg(long, default_value_t = 500)]
        max: usize,
        #[arg(long = "type", value_enum)]
        event_type: Option<RumEventType>,
    },
    /// Top values of a RUM field
    Top {
        query: String,
        #[arg(long, default_value = DEFAULT_RUM_GROUP_FIELD)]
        field: String,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Debug, Subcommand)]
pub enum FieldsCommand {
    /// Field names matching a keyword
    Search {
        keyword: String,
        #[arg(long, value_enum, default_value_t = DataSource::Logs)]
        source: DataSource,
        #[command(flatten)]
        output: Output,
    },
    /// Known values of a field
    Values {
        field: String,
        #[arg(long, default_value = "*")]
        query: String,
        #[arg(long, value_enum, default_value_t = DataSource::Logs)]
        source: DataSource,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        #[command(flatten)]
        output: Output,
    },
}

#[derive(Debug, Subcommand)]
pub enum ViewsCommand {
    /// List saved views
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = DataSource::Logs)]
        source: DataSource,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[command(flatten)]
        output: Output,
    },
}

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "DD_CLI_LOG";

/// Filter directive: `$DD_CLI_LOG`, else the `-v` count, else warnings only.
pub fn directive(verbose: u8, server_mode: bool) -> String {
    if let Some(d) = std::env::var(LOG_ENV).ok().filter(|d| !d.trim().is_empty()) {
        return d;
    }
    match verbose {
        0 if server_mode => "dd_cli=info".to_string(),
        0 => "dd_cli=warn".to_string(),
        1 => "dd_cli=debug".to_string(),
        _ => "dd_cli=trace,reqwest=debug".to_string(),
    }
}

/// Install the stderr subscriber. stdout carries JSON output and the MCP protocol.
pub fn init(verbose: u8, server_mode: bool) {
    let directive = directive(verbose, server_mode);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("dd_cli=warn"));
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false);
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

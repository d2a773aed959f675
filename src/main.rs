use std::process::ExitCode;

use clap::Parser;

use dd_cli::cli::{Cli, Command};
use dd_cli::commands::{App, EXIT_INTERRUPTED};
use dd_cli::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, matches!(cli.command, Command::Mcp));

    let app = App::from_env();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    tokio::select! {
        code = app.execute(cli.command, &mut stdout, &mut stderr) => ExitCode::from(code),
        Ok(()) = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted");
            // Runtime shutdown would wait on the blocking stdin readers of `auth` and `mcp`.
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    }
}

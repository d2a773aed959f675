use anyhow::{bail, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::credentials::{self, Credential, DEFAULT_BASE_URL};

/// Values supplied on the command line; anything missing is prompted for.
#[derive(Debug, Default, Clone)]
pub struct SetupArgs {
    pub cookie: Option<String>,
    pub csrf_token: Option<String>,
    pub base_url: Option<String>,
}

pub fn run(args: SetupArgs, path: &Path) -> Result<()> {
    let needs_prompt = args.cookie.is_none() || args.csrf_token.is_none();
    if needs_prompt && atty::is(atty::Stream::Stdin) {
        print_instructions(args.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let cookie = value_or_prompt(args.cookie, "dogweb cookie value", &mut input)?;
    let csrf_token = value_or_prompt(args.csrf_token, "x-csrf-token header value", &mut input)?;
    let base_url = args
        .base_url
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    credentials::save_to(path, &Credential::new(cookie, csrf_token, base_url))?;
    eprintln!("\n✓ Auth saved to {}", path.display());
    Ok(())
}

fn print_instructions(base_url: &str) {
    eprintln!("Datadog Auth Setup");
    eprintln!("{}", "=".repeat(40));
    eprintln!();
    eprintln!("1. Open {base_url}/logs in your browser");
    eprintln!("2. Open DevTools (F12) → Network tab");
    eprintln!("3. Perform any search");
    eprintln!("4. Find a request to 'logs-analytics'");
    eprintln!("5. Right-click → Copy as cURL");
    eprintln!();
    eprintln!("From that curl command, extract:");
    eprintln!();
}

fn value_or_prompt(
    given: Option<String>,
    label: &str,
    input: &mut impl BufRead,
) -> Result<String> {
    let value = match given {
        Some(v) => v,
        None => prompt(label, input)?,
    };
    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{label} must not be empty");
    }
    Ok(value)
}

fn prompt(label: &str, input: &mut impl BufRead) -> Result<String> {
    eprint!("{label}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

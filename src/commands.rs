use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;

use crate::cli::{Command, FieldsCommand, Output, RumCommand, RumList, ViewsCommand};
use crate::client::{ClientOptions, DataSource, DatadogClient, ListKind, Profile};
use crate::hydrate;
use crate::server::{self, ServerContext};
use crate::setup::{self, SetupArgs};
use crate::status::{self, AuthStatus};
use crate::stream::{self, PageOptions};
use crate::{credentials, summary};

/// No credential file, or one missing a secret.
#[derive(Debug, thiserror::Error)]
#[error("No auth found. Run: dd-cli auth")]
pub struct MissingAuth;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INTERRUPTED: u8 = 130;

pub struct App {
    auth_file: PathBuf,
    options: ClientOptions,
}

impl App {
    pub fn new(auth_file: PathBuf, options: ClientOptions) -> Self {
        Self { auth_file, options }
    }

    pub fn from_env() -> Self {
        Self::new(credentials::auth_file_path(), ClientOptions::from_env())
    }

    fn client(&self) -> Result<DatadogClient> {
        let credential = credentials::load_from(&self.auth_file)?.ok_or(MissingAuth)?;
        Ok(DatadogClient::with_options(&credential, self.options.clone())?)
    }

    /// Run `command` and turn any failure into exit code 1 with a message on `err`.
    pub async fn execute<O: Write, E: Write>(
        &self,
        command: Command,
        out: &mut O,
        err: &mut E,
    ) -> u8 {
        match self.run(command, out, err).await {
            Ok(code) => code,
            Err(e) if e.downcast_ref::<MissingAuth>().is_some() => {
                let _ = writeln!(err, "{e}");
                EXIT_FAILURE
            }
            Err(e) => {
                let _ = writeln!(err, "Error: {e:#}");
                EXIT_FAILURE
            }
        }
    }

    /// JSON goes to `out`; progress and count lines go to `err`.
    pub async fn run<O: Write, E: Write>(
        &self,
        command: Command,
        out: &mut O,
        err: &mut E,
    ) -> Result<u8> {
        match command {
            Command::Auth {
                cookie,
                csrf_token,
                base_url,
            } => {
                let args = SetupArgs {
                    cookie,
                    csrf_token,
                    base_url,
                };
                let path = self.auth_file.clone();
                tokio::task::spawn_blocking(move || setup::run(args, &path))
                    .await
                    .context("auth setup task failed")??;
                Ok(EXIT_OK)
            }
            Command::Status => status_command(&self.auth_file, &self.options, err).await,
            Command::Mcp => {
                server::run(ServerContext {
                    auth_file: self.auth_file.clone(),
                    options: self.options.clone(),
                })
                .await?;
                Ok(EXIT_OK)
            }
            Command::FetchAll {
                query,
                hours,
                max,
                profile,
            } => {
                let kind = ListKind::Logs { profile };
                let count = self.stream_events(kind, &query, hours, max, out).await?;
                writeln!(err, "Fetched {count} logs")?;
                Ok(EXIT_OK)
            }
            Command::Deep {
                query,
                hours,
                max,
                concurrency,
                profile,
            } => {
                self.deep(&query, hours, max, concurrency, profile, out, err)
                    .await?;
                Ok(EXIT_OK)
            }
            Command::Rum(RumCommand::FetchAll {
                query,
                hours,
                max,
                event_type,
            }) => {
                let kind = ListKind::Rum { event_type };
                let count = self.stream_events(kind, &query, hours, max, out).await?;
                writeln!(err, "Fetched {count} RUM events")?;
                Ok(EXIT_OK)
            }
            other => {
                self.one_shot(other, out).await?;
                Ok(EXIT_OK)
            }
        }
    }

    async fn one_shot<O: Write>(&self, command: Command, out: &mut O) -> Result<()> {
        let client = self.client()?;
        let (value, output) = match command {
            Command::List {
                query,
                hours,
                limit,
                profile,
                simplified,
                output,
            } => {
                let body = client.list_logs(&query, hours, limit, profile).await?;
                (simplify_if(simplified, body, summary::simplify_logs), output)
            }
            Command::FetchOne { log_id, output } => (client.fetch_one(&log_id).await?, output),
            Command::Top {
                query,
                field,
                hours,
                limit,
                output,
            } => (
                client
                    .aggregate(DataSource::Logs, &query, hours, &field, limit)
                    .await?,
                output,
            ),
            Command::FacetInfo {
                query,
                facet,
                hours,
                limit,
                output,
            } => (client.facet_info(&query, hours, &facet, limit).await?, output),
            Command::Trace {
                trace_id,
                hours,
                limit,
                simplified,
                output,
            } => {
                let body = client.trace_logs(&trace_id, hours, limit).await?;
                (simplify_if(simplified, body, summary::simplify_logs), output)
            }
            Command::Rum(rum) => rum_command(&client, rum).await?,
            Command::Fields(FieldsCommand::Search {
                keyword,
                source,
                output,
            }) => (client.search_fields(&keyword, source).await?, output),
            Command::Fields(FieldsCommand::Values {
                field,
                query,
                source,
                hours,
                output,
            }) => (client.field_values(&field, &query, source, hours).await?, output),
            Command::Watchdog {
                query,
                hours,
                source,
                output,
            } => (client.watchdog_insights(&query, hours, source).await?, output),
            Command::Views(ViewsCommand::List {
                search,
                source,
                limit,
                output,
            }) => (client.list_views(&search, source, limit).await?, output),
            Command::Topology {
                env,
                hours,
                service,
                output,
            } => {
                let topology = client
                    .service_topology(&env, hours, service.as_deref())
                    .await?;
                (serde_json::to_value(topology)?, output)
            }
            other => bail!("{other:?} does not produce a single response"),
        };
        emit(out, &value, output.pretty)
    }

    async fn stream_events<O: Write>(
        &self,
        kind: ListKind,
        query: &str,
        hours: f64,
        max: usize,
        out: &mut O,
    ) -> Result<usize> {
        let client = self.client()?;
        let events = stream::paginate(&client, kind, query, hours, PageOptions::with_max(max));
        futures::pin_mut!(events);

        let mut count = 0;
        while let Some(event) = events.next().await {
            emit(out, &event?, false)?;
            count += 1;
        }
        Ok(count)
    }

    #[allow(clippy::too_many_arguments)]
    async fn deep<O: Write, E: Write>(
        &self,
        query: &str,
        hours: f64,
        max: usize,
        concurrency: usize,
        profile: Profile,
        out: &mut O,
        err: &mut E,
    ) -> Result<()> {
        let client = self.client()?;
        let events = stream::fetch_all(
            &client,
            ListKind::Logs { profile },
            query,
            hours,
            PageOptions::with_max(max),
        )
        .await?;
        if events.is_empty() {
            writeln!(err, "Deep-fetched 0 logs")?;
            return Ok(());
        }
        writeln!(
            err,
            "Hydrating {} logs with concurrency={concurrency}...",
            events.len()
        )?;

        let records = hydrate::hydrate(&client, events, concurrency);
        futures::pin_mut!(records);
        let mut count = 0;
        while let Some(record) = records.next().await {
            emit(out, &record, false)?;
            count += 1;
        }
        writeln!(err, "Deep-fetched {count} logs")?;
        Ok(())
    }
}

async fn rum_command(client: &DatadogClient, command: RumCommand) -> Result<(Value, Output)> {
    let (body, args) = match command {
        RumCommand::Sessions {
            query,
            hours,
            limit,
            simplified,
            output,
        } => {
            let args = RumList {
                query,
                hours,
                limit,
                simplified,
                output,
            };
            let body = client.rum_sessions(&args.query, args.hours, args.limit).await?;
            (body, args)
        }
        RumCommand::Actions(args) => {
            let body = client.rum_actions(&args.query, args.hours, args.limit).await?;
            (body, args)
        }
        RumCommand::Views(args) => {
            let body = client.rum_views(&args.query, args.hours, args.limit).await?;
            (body, args)
        }
        RumCommand::Errors(args) => {
            let body = client.rum_errors(&args.query, args.hours, args.limit).await?;
            (body, args)
        }
        RumCommand::Resources(args) => {
            let body = client.rum_resources(&args.query, args.hours, args.limit).await?;
            (body, args)
        }
        RumCommand::Top {
            query,
            field,
            hours,
            limit,
            output,
        } => {
            let body = client.rum_aggregate(&query, hours, &field, limit).await?;
            return Ok((body, output));
        }
        other => bail!("{other:?} does not produce a single response"),
    };
    Ok((simplify_if(args.simplified, body, summary::simplify_rum), args.output))
}

async fn status_command<E: Write>(
    auth_file: &Path,
    options: &ClientOptions,
    err: &mut E,
) -> Result<u8> {
    let status = status::probe(auth_file, options).await?;
    print_status(&status, err)?;
    Ok(if status.is_configured() && status.connection_ok() {
        EXIT_OK
    } else {
        EXIT_FAILURE
    })
}

fn print_status<E: Write>(status: &AuthStatus, err: &mut E) -> std::io::Result<()> {
    if !status.is_configured() {
        writeln!(err, "✗ No auth file found")?;
        return writeln!(err, "  Run: dd-cli auth");
    }
    writeln!(err, "Auth file: {}", status.auth_file)?;
    if let Some(base_url) = &status.base_url {
        writeln!(err, "Base URL: {base_url}")?;
    }
    if let Some(len) = status.cookie_length {
        writeln!(err, "Cookie length: {len} chars")?;
    }
    if let Some(prefix) = &status.csrf_token_prefix {
        writeln!(err, "CSRF token: {prefix}")?;
    }
    if let Some(age) = &status.token_age {
        writeln!(err, "Token age: {age}")?;
    }
    writeln!(err, "\nTesting connection...")?;
    if status.connection_ok() {
        writeln!(err, "✓ Connection successful")
    } else {
        writeln!(err, "✗ Connection failed - tokens may be expired")?;
        writeln!(err, "  Run: dd-cli auth")
    }
}

fn simplify_if(simplified: bool, body: Value, simplify: fn(&Value) -> Value) -> Value {
    if simplified {
        simplify(&body)
    } else {
        body
    }
}

/// One JSON document per line; indented when `pretty`.
fn emit<O: Write, T: Serialize>(out: &mut O, value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const DEFAULT_BASE_URL: &str = "https://app.datadoghq.eu";
pub const AUTH_FILE_ENV: &str = "DD_AUTH_FILE";

const AUTH_FILE_NAME: &str = ".datadog-auth";
const COOKIE_KEY: &str = "DOGWEB_COOKIE";
const CSRF_KEY: &str = "CSRF_TOKEN";
const BASE_URL_KEY: &str = "DD_BASE_URL";
const CREATED_MARKER: &str = "Created:";

/// Browser session artifacts used to call the web UI endpoints.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    cookie: String,
    csrf_token: String,
    #[zeroize(skip)]
    base_url: String,
    #[zeroize(skip)]
    created_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("cookie", &"<redacted>")
            .field("csrf_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Credential {
    pub fn new(
        cookie: impl Into<String>,
        csrf_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            cookie: cookie.into(),
            csrf_token: csrf_token.into(),
            base_url: base_url.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.created_at.map(|created| now - created)
    }
}

/// `3d 4h` style rendering; negative ages clamp to zero.
pub fn format_age(age: chrono::Duration) -> String {
    let hours = age.num_hours().max(0);
    format!("{}d {}h", hours / 24, hours % 24)
}

/// `$DD_AUTH_FILE`, else `~/.datadog-auth`.
pub fn auth_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(AUTH_FILE_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(AUTH_FILE_NAME)
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

fn parse_created(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).single())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Parse the key=value auth file. `None` unless both secrets are present and non-empty.
pub fn parse(text: &str) -> Option<Credential> {
    let mut cookie = None;
    let mut csrf = None;
    let mut base_url = DEFAULT_BASE_URL.to_string();
    let mut created_at = None;

    for line in text.lines().map(str::trim) {
        if let Some(comment) = line.strip_prefix('#') {
            if let Some((_, ts)) = comment.split_once(CREATED_MARKER) {
                created_at = parse_created(ts);
            }
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(value).to_string();
        match key.trim() {
            COOKIE_KEY => cookie = Some(value),
            CSRF_KEY => csrf = Some(value),
            BASE_URL_KEY if !value.is_empty() => base_url = value,
            _ => {}
        }
    }

    let cookie = cookie.filter(|c| !c.is_empty())?;
    let csrf = csrf.filter(|c| !c.is_empty())?;
    let mut credential = Credential::new(cookie, csrf, base_url);
    credential.created_at = created_at;
    Some(credential)
}

pub fn render(credential: &Credential, created_at: DateTime<Utc>) -> String {
    let mut out = String::from("# Datadog auth tokens - regenerate when expired\n");
    out.push_str(&format!(
        "# {CREATED_MARKER} {}\n",
        created_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    ));
    out.push_str(&format!("{COOKIE_KEY}=\"{}\"\n", credential.cookie));
    out.push_str(&format!("{CSRF_KEY}=\"{}\"\n", credential.csrf_token));
    if credential.base_url != DEFAULT_BASE_URL {
        out.push_str(&format!("{BASE_URL_KEY}=\"{}\"\n", credential.base_url));
    }
    out
}

pub fn load_from(path: &Path) -> Result<Option<Credential>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse(&text))
}

pub fn save_to(path: &Path, credential: &Credential) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, render(credential, Utc::now()))
        .with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to chmod {}", path.display()))?;
    }
    tracing::debug!(path = %path.display(), "credentials saved");
    Ok(())
}

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::client::{ClientOptions, DatadogClient};
use crate::credentials::{self, format_age, Credential};

const CSRF_PREFIX_CHARS: usize = 20;
pub const REAUTH_ACTION: &str = "Run: dd-cli auth";
pub const EXPIRED_ACTION: &str = "Tokens may be expired. Run: dd-cli auth";

/// What the auth file holds and whether the session still works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub status: &'static str,
    pub auth_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
}

impl AuthStatus {
    pub fn not_configured(auth_file: &Path) -> Self {
        Self {
            status: "not_configured",
            auth_file: auth_file.display().to_string(),
            base_url: None,
            cookie_length: None,
            csrf_token_prefix: None,
            token_age: None,
            connection: None,
            action: Some(REAUTH_ACTION),
        }
    }

    /// Describe a loaded credential without touching the network.
    pub fn inspect(auth_file: &Path, credential: &Credential) -> Self {
        let prefix: String = credential.csrf_token().chars().take(CSRF_PREFIX_CHARS).collect();
        Self {
            status: "configured",
            auth_file: auth_file.display().to_string(),
            base_url: Some(credential.base_url().to_string()),
            cookie_length: Some(credential.cookie().chars().count()),
            csrf_token_prefix: Some(format!("{prefix}...")),
            token_age: credential.age(Utc::now()).map(format_age),
            connection: None,
            action: None,
        }
    }

    pub fn record_connection(&mut self, ok: bool) {
        if ok {
            self.connection = Some("ok");
        } else {
            self.connection = Some("failed");
            self.action = Some(EXPIRED_ACTION);
        }
    }

    pub fn is_configured(&self) -> bool {
        self.status == "configured"
    }

    pub fn connection_ok(&self) -> bool {
        self.connection == Some("ok")
    }
}

/// Load the auth file and, when configured, run the connectivity probe.
pub async fn probe(auth_file: &Path, options: &ClientOptions) -> Result<AuthStatus> {
    let Some(credential) = credentials::load_from(auth_file)? else {
        return Ok(AuthStatus::not_configured(auth_file));
    };
    let mut status = AuthStatus::inspect(auth_file, &credential);
    let ok = match DatadogClient::with_options(&credential, options.clone()) {
        Ok(client) => client.test_connection().await,
        Err(e) => {
            tracing::warn!(error = %e, "could not build client");
            false
        }
    };
    status.record_connection(ok);
    Ok(status)
}

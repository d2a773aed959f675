pub mod config;
pub mod cursor;
pub mod error;
pub mod fields;
pub mod insights;
pub mod list;
pub mod logs;
pub mod rum;
pub mod time;
pub mod topology;
pub mod types;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credentials::Credential;

pub use config::ClientOptions;
pub use cursor::extract_cursor;
pub use error::ClientError;
pub use list::ListKind;
pub use time::TimeRange;
pub use topology::{ServiceEdge, ServiceNode, ServiceTopology};
pub use types::{DataSource, Profile, RumEventType};

const CSRF_HEADER: &str = "x-csrf-token";
const SESSION_COOKIE: &str = "dogweb";

/// A decoded JSON body plus the headers it arrived with.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub headers: HeaderMap,
    pub body: Value,
}

/// Session-authenticated client for the Datadog web UI endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct DatadogClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
}

impl DatadogClient {
    pub fn new(credential: &Credential) -> Result<Self, ClientError> {
        Self::with_options(credential, ClientOptions::from_env())
    }

    pub fn with_options(
        credential: &Credential,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = credential.base_url().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .default_headers(default_headers(credential)?)
            .user_agent(options.user_agent.as_str())
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            options,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub(crate) async fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<ApiResponse, ClientError> {
        self.send(Method::POST, path, query, Some(body)).await
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, path, query, None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let max_retries = self.options.max_retries;
        let mut attempt = 0u32;

        backoff::future::retry_notify(
            self.options.backoff(),
            || {
                attempt += 1;
                let current = attempt;
                let method = method.clone();
                async move {
                    match self.send_once(method, path, query, body).await {
                        Ok(resp) => Ok(resp),
                        Err(e) if e.is_retryable() && current <= max_retries => {
                            Err(backoff::Error::transient(e))
                        }
                        Err(e) => Err(backoff::Error::permanent(e)),
                    }
                }
            },
            |err: ClientError, wait: std::time::Duration| {
                warn!(%path, error = %err, wait_ms = wait.as_millis() as u64, "retrying request");
            },
        )
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, ClientError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %path, "request");

        let mut req = self.http.request(method, &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let transport = |source| ClientError::Transport {
            path: path.to_string(),
            source,
        };
        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(transport)?;
        debug!(%path, status = status.as_u16(), bytes = bytes.len(), "response");

        if !status.is_success() {
            return Err(ClientError::http(status.as_u16(), path, &bytes));
        }
        let body = serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(ApiResponse { headers, body })
    }
}

fn default_headers(credential: &Credential) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    let mut csrf = HeaderValue::from_str(credential.csrf_token())
        .map_err(|_| ClientError::InvalidCredential("CSRF token".into()))?;
    csrf.set_sensitive(true);
    headers.insert(CSRF_HEADER, csrf);

    let mut cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={}", credential.cookie()))
        .map_err(|_| ClientError::InvalidCredential("session cookie".into()))?;
    cookie.set_sensitive(true);
    headers.insert(header::COOKIE, cookie);

    Ok(headers)
}

/// `type=logs` / `type=rum` selector shared by the logs-analytics endpoints.
pub(crate) fn source_query(source: DataSource) -> [(&'static str, String); 1] {
    [("type", source.as_str().to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(base_url: &str) -> Credential {
        Credential::new("cookie-value", "csrf-value", base_url)
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = DatadogClient::with_options(
            &credential("https://app.datadoghq.com/"),
            ClientOptions::default(),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://app.datadoghq.com");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = DatadogClient::with_options(&credential("not a url"), ClientOptions::default())
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn auth_headers_are_attached_and_sensitive() {
        let headers = default_headers(&credential("https://app.datadoghq.eu")).unwrap();
        let cookie = headers.get(header::COOKIE).unwrap();
        assert_eq!(cookie.to_str().unwrap(), "dogweb=cookie-value");
        assert!(cookie.is_sensitive());
        let csrf = headers.get(CSRF_HEADER).unwrap();
        assert_eq!(csrf.to_str().unwrap(), "csrf-value");
        assert!(csrf.is_sensitive());
    }

    #[test]
    fn control_characters_in_token_are_rejected() {
        let cred = Credential::new("ok", "bad\ntoken", "https://app.datadoghq.eu");
        let err = default_headers(&cred).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCredential(_)));
    }
}

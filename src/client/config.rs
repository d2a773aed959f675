use std::time::Duration;

pub const USER_AGENT_ENV: &str = "DD_CLI_USER_AGENT";
pub const TIMEOUT_ENV: &str = "DD_CLI_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Transport settings shared by every request a client makes.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout: Duration,
    /// Retries after the first attempt, for retryable statuses only.
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("dd-cli/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl ClientOptions {
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(ua) = std::env::var(USER_AGENT_ENV).ok().filter(|s| !s.is_empty()) {
            options.user_agent = ua;
        }
        if let Some(secs) = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            options.timeout = Duration::from_secs(secs);
        }
        options
    }

    pub(crate) fn backoff(&self) -> backoff::ExponentialBackoff {
        backoff::ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(None)
            .build()
    }
}

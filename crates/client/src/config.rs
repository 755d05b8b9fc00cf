//! Connection configuration, loadable from the environment.

use {
    crate::ClientError,
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, time::Duration},
    tracing::debug,
    url::Url,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Settings for one named connection.
///
/// Environment variables read by [`ConnectionConfig::from_env`]:
/// - `RESTMAP_BASE_URL` (required)
/// - `RESTMAP_TIMEOUT_SECS` (default: 30)
/// - `RESTMAP_USER` / `RESTMAP_PASS` (basic auth, both or neither)
/// - `RESTMAP_USER_AGENT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub base_url: Url,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
}

impl ConnectionConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_headers: HashMap::new(),
            user_agent: None,
            user: None,
            pass: None,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(base_url).map_err(|source| ClientError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self::new(url))
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base = lookup("RESTMAP_BASE_URL")
            .ok_or_else(|| ClientError::Config("RESTMAP_BASE_URL is not set".to_string()))?;
        let mut config = Self::parse(&base)?;

        if let Some(raw) = lookup("RESTMAP_TIMEOUT_SECS") {
            config.timeout_secs = raw.parse().map_err(|_| {
                ClientError::Config(format!("RESTMAP_TIMEOUT_SECS is not a number: {raw}"))
            })?;
        }

        config.user = lookup("RESTMAP_USER");
        config.pass = lookup("RESTMAP_PASS");
        if config.user.is_some() != config.pass.is_some() {
            return Err(ClientError::Config(
                "RESTMAP_USER and RESTMAP_PASS must be set together".to_string(),
            ));
        }
        config.user_agent = lookup("RESTMAP_USER_AGENT");

        debug!(
            "connection config from env: base_url={}, timeout={}s, auth={}",
            config.base_url,
            config.timeout_secs,
            config.user.is_some()
        );
        Ok(config)
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn basic_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.pass = Some(pass.into());
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

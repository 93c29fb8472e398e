//! Client configuration

use std::time::Duration;

use reqwest::Url;

/// Base URL of the development API stage
pub const DEV_API_BASE_URL: &str = "https://4397wtmg4a.execute-api.us-east-2.amazonaws.com/dev";

/// Base URL of the production API stage
pub const PROD_API_BASE_URL: &str = "https://e4i00azm6h.execute-api.us-east-2.amazonaws.com/prod";

/// Deployed API stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiEnvironment {
    #[default]
    Development,
    Production,
}

impl ApiEnvironment {
    /// Built-in base URL for this stage
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Development => DEV_API_BASE_URL,
            Self::Production => PROD_API_BASE_URL,
        }
    }
}

impl std::str::FromStr for ApiEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" | "prod-local" => Ok(Self::Production),
            _ => Err(ConfigError::Invalid("HELFINKA_ENV")),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    entries_prefix: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEV_API_BASE_URL.to_string(),
            entries_prefix: String::new(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("helfinka-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Start building a configuration
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Configuration for the given base URL, everything else default
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::builder().base_url(base_url).build()
    }

    /// Load configuration from environment variables
    ///
    /// - `HELFINKA_API_URL` - explicit base URL (wins over `HELFINKA_ENV`)
    /// - `HELFINKA_ENV` - `dev` or `prod` (default `dev`)
    /// - `HELFINKA_ENTRIES_PREFIX` - sub-path the diary endpoints live under
    /// - `HELFINKA_CONNECT_TIMEOUT_SECS` - default 5
    /// - `HELFINKA_REQUEST_TIMEOUT_SECS` - default 30
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Some(env) = lookup("HELFINKA_ENV") {
            builder = builder.environment(env.parse()?);
        }
        if let Some(url) = lookup("HELFINKA_API_URL") {
            builder = builder.base_url(url);
        }
        if let Some(prefix) = lookup("HELFINKA_ENTRIES_PREFIX") {
            builder = builder.entries_prefix(prefix);
        }
        if let Some(secs) = lookup("HELFINKA_CONNECT_TIMEOUT_SECS") {
            let secs = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("HELFINKA_CONNECT_TIMEOUT_SECS"))?;
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = lookup("HELFINKA_REQUEST_TIMEOUT_SECS") {
            let secs = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("HELFINKA_REQUEST_TIMEOUT_SECS"))?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn entries_prefix(&self) -> &str {
        &self.entries_prefix
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Absolute URL for an API path (`/auth/login`)
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Absolute URL for a diary path (`/entries`), honouring the prefix
    pub fn entries_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.entries_prefix, path)
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    environment: ApiEnvironment,
    base_url: Option<String>,
    entries_prefix: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    /// Use the built-in base URL of a stage
    pub fn environment(mut self, environment: ApiEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Explicit base URL, overrides the stage
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn entries_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.entries_prefix = Some(prefix.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let defaults = ClientConfig::default();

        let base_url = self
            .base_url
            .unwrap_or_else(|| self.environment.base_url().to_string());
        let parsed = Url::parse(&base_url).map_err(|e| ConfigError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{base_url}: scheme must be http or https"
            )));
        }

        Ok(ClientConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            entries_prefix: normalize_prefix(self.entries_prefix.as_deref().unwrap_or("")),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        })
    }
}

/// `""`, `"/"` -> `""`; `"helfinka/"` -> `"/helfinka"`
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

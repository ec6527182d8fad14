//! Client configuration shared by the HTTP adapters.

use std::time::Duration;

/// Where the collaborator services live and how to talk to them.
///
/// # Example
///
/// ```
/// use carevoice_http::HttpClientConfig;
/// use std::time::Duration;
///
/// let config = HttpClientConfig::new()
///     .with_base_url("http://localhost:3000")
///     .with_timeout(Duration::from_secs(90));
/// ```
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Service root; endpoint paths are joined onto it.
    pub(crate) base_url: String,
    pub(crate) user_agent: String,
    /// Transport-level timeout for a whole request.
    pub(crate) timeout: Duration,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub(crate) token: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            user_agent: concat!("carevoice/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(120),
            token: None,
        }
    }
}

impl HttpClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service root. Defaults to `http://localhost:3000`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the transport timeout. Defaults to 120 seconds.
    ///
    /// The voice pipeline applies its own per-call deadline on top of this.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set an optional bearer token (e.g. straight from an env var).
    #[must_use]
    pub fn with_optional_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::new();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.user_agent.starts_with("carevoice/"));
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = HttpClientConfig::new()
            .with_base_url("https://care.example/")
            .with_user_agent("test-agent")
            .with_timeout(Duration::from_secs(10))
            .with_token("secret");

        assert_eq!(config.base_url(), "https://care.example/");
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_optional_token_ignores_blank() {
        let with_token = HttpClientConfig::new().with_optional_token(Some("token".to_string()));
        assert_eq!(with_token.token.as_deref(), Some("token"));

        let blank = HttpClientConfig::new().with_optional_token(Some("  ".to_string()));
        assert!(blank.token.is_none());

        let without = HttpClientConfig::new().with_optional_token(None);
        assert!(without.token.is_none());
    }
}

//! Process-wide configuration, resolved once at startup and injected into the
//! router. Nothing here is recreated per request.

use std::time::Duration;

/// Default NCBI EUtils base URL
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default bind address for the proxy
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Fixed timeout for every outbound NCBI call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration
///
/// # Example
///
/// ```
/// use eutils_proxy::config::AppConfig;
///
/// let config = AppConfig::new().with_base_url("http://localhost:8080");
/// assert_eq!(config.effective_base_url(), "http://localhost:8080");
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    base_url: Option<String>,
    bind_addr: Option<String>,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            base_url: None,
            bind_addr: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read overrides from the environment (`EUTILS_BASE_URL`,
    /// `EUTILS_PROXY_ADDR`), falling back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(url) = std::env::var("EUTILS_BASE_URL") {
            if !url.is_empty() {
                config.base_url = Some(url);
            }
        }
        if let Ok(addr) = std::env::var("EUTILS_PROXY_ADDR") {
            if !addr.is_empty() {
                config.bind_addr = Some(addr);
            }
        }
        config
    }

    /// Override the EUtils base URL (used by tests to point at a stub server)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the bind address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    /// Override the outbound request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.effective_base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.effective_bind_addr(), DEFAULT_BIND_ADDR);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::new()
            .with_base_url("http://127.0.0.1:9999")
            .with_bind_addr("127.0.0.1:0")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.effective_base_url(), "http://127.0.0.1:9999");
        assert_eq!(config.effective_bind_addr(), "127.0.0.1:0");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}

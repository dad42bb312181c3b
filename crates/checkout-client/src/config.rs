//! # Client Configuration
//!
//! Backend location and credentials, loaded from environment variables.

use checkout_core::CheckoutError;
use std::env;
use std::time::Duration;

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the subscription backend (e.g. `https://api.example.ru/v1`)
    pub base_url: String,

    /// Bearer token for the signed-in customer
    pub api_token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `CHECKOUT_API_BASE_URL`
    ///
    /// Optional:
    /// - `CHECKOUT_API_TOKEN`
    pub fn from_env() -> Result<Self, CheckoutError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("CHECKOUT_API_BASE_URL").map_err(|_| {
            CheckoutError::Configuration("CHECKOUT_API_BASE_URL not set".to_string())
        })?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CheckoutError::Configuration(
                "CHECKOUT_API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        let api_token = env::var("CHECKOUT_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: Duration::from_secs(30),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Builder: set bearer token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> Option<String> {
        self.api_token.as_ref().map(|t| format!("Bearer {}", t))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let config = ClientConfig::new("https://api.example.ru/v1/");
        assert_eq!(config.url("/payments"), "https://api.example.ru/v1/payments");
        assert_eq!(config.url("payments/42"), "https://api.example.ru/v1/payments/42");
    }

    #[test]
    fn test_auth_header() {
        let config = ClientConfig::new("http://localhost:8000");
        assert_eq!(config.auth_header(), None);

        let config = config.with_api_token("secret");
        assert_eq!(config.auth_header().as_deref(), Some("Bearer secret"));
    }

    #[test]
    fn test_from_env_missing_base_url() {
        env::remove_var("CHECKOUT_API_BASE_URL");

        let result = ClientConfig::from_env();
        assert!(matches!(result, Err(CheckoutError::Configuration(_))));
    }
}

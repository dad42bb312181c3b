//! # Widget Configuration
//!
//! Where the processor script lives, what the widget is called on the page,
//! and the timing bounds of the lifecycle.
//!
//! Sources, in order of preference:
//! - a TOML file (`config/checkout-widget.toml`)
//! - `CHECKOUT_*` environment variables (`.env` honored)
//! - a plain JS object handed to the browser bindings

use crate::error::{CheckoutError, CheckoutResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

pub const DEFAULT_SCRIPT_URL: &str = "https://yookassa.ru/checkout-widget/v1/checkout-widget.js";
pub const DEFAULT_FACTORY_GLOBAL: &str = "YooMoneyCheckoutWidget";
pub const DEFAULT_MOUNT_ELEMENT_ID: &str = "payment-form";

/// Presentation options passed through to the widget constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    /// Render in a modal instead of inline
    #[serde(default)]
    pub modal: bool,

    /// Color overrides (e.g. `control_primary` -> `#00BF96`)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub colors: HashMap<String, String>,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            modal: false,
            colors: HashMap::new(),
        }
    }
}

/// Checkout widget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// URL of the processor's widget script
    pub script_url: String,

    /// Name of the global constructor the script defines
    pub factory_global: String,

    /// Id of the element the form renders into
    pub mount_element_id: String,

    /// Where the processor sends the customer after 3-D Secure etc.
    pub return_url: String,

    /// Event names emitted by the widget instance
    pub success_event: String,
    pub error_event: String,

    pub poll_interval_ms: u64,
    pub mount_timeout_ms: u64,
    pub script_timeout_ms: u64,

    /// Delay between the success toast and `onSuccess`
    pub success_delay_ms: u64,

    pub customization: Customization,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.to_string(),
            factory_global: DEFAULT_FACTORY_GLOBAL.to_string(),
            mount_element_id: DEFAULT_MOUNT_ELEMENT_ID.to_string(),
            return_url: "/dashboard".to_string(),
            success_event: "success".to_string(),
            error_event: "error".to_string(),
            poll_interval_ms: 100,
            mount_timeout_ms: 5_000,
            script_timeout_ms: 15_000,
            success_delay_ms: 1_000,
            customization: Customization::default(),
        }
    }
}

impl WidgetConfig {
    /// Parse from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> CheckoutResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CheckoutError::Configuration(format!("Invalid widget config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file on disk
    pub fn load(path: &str) -> CheckoutResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CheckoutError::Configuration(format!("Failed to read {}: {}", path, e)))?;
        Self::from_toml_str(&content)
    }

    /// Load from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `CHECKOUT_SCRIPT_URL`
    /// - `CHECKOUT_FACTORY_GLOBAL`
    /// - `CHECKOUT_MOUNT_ELEMENT_ID`
    /// - `CHECKOUT_RETURN_URL`
    /// - `CHECKOUT_POLL_INTERVAL_MS`, `CHECKOUT_MOUNT_TIMEOUT_MS`,
    ///   `CHECKOUT_SCRIPT_TIMEOUT_MS`, `CHECKOUT_SUCCESS_DELAY_MS`
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(url) = env::var("CHECKOUT_SCRIPT_URL") {
            config.script_url = url;
        }
        if let Ok(global) = env::var("CHECKOUT_FACTORY_GLOBAL") {
            config.factory_global = global;
        }
        if let Ok(id) = env::var("CHECKOUT_MOUNT_ELEMENT_ID") {
            config.mount_element_id = id;
        }
        if let Ok(url) = env::var("CHECKOUT_RETURN_URL") {
            config.return_url = url;
        }

        config.poll_interval_ms = env_millis("CHECKOUT_POLL_INTERVAL_MS", config.poll_interval_ms)?;
        config.mount_timeout_ms = env_millis("CHECKOUT_MOUNT_TIMEOUT_MS", config.mount_timeout_ms)?;
        config.script_timeout_ms =
            env_millis("CHECKOUT_SCRIPT_TIMEOUT_MS", config.script_timeout_ms)?;
        config.success_delay_ms =
            env_millis("CHECKOUT_SUCCESS_DELAY_MS", config.success_delay_ms)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the lifecycle cannot work with
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.script_url.trim().is_empty() {
            return Err(CheckoutError::Configuration(
                "script_url must not be empty".to_string(),
            ));
        }
        if self.factory_global.trim().is_empty() {
            return Err(CheckoutError::Configuration(
                "factory_global must not be empty".to_string(),
            ));
        }
        if self.mount_element_id.trim().is_empty() {
            return Err(CheckoutError::Configuration(
                "mount_element_id must not be empty".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(CheckoutError::Configuration(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.mount_timeout_ms < self.poll_interval_ms {
            return Err(CheckoutError::Configuration(format!(
                "mount_timeout_ms ({}) is shorter than poll_interval_ms ({})",
                self.mount_timeout_ms, self.poll_interval_ms
            )));
        }
        if self.script_timeout_ms == 0 {
            return Err(CheckoutError::Configuration(
                "script_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn mount_timeout(&self) -> Duration {
        Duration::from_millis(self.mount_timeout_ms)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }

    pub fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_delay_ms)
    }

    /// Builder: set return URL
    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = url.into();
        self
    }

    /// Builder: add a color override
    pub fn with_color(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.customization.colors.insert(key.into(), value.into());
        self
    }
}

fn env_millis(name: &str, default: u64) -> CheckoutResult<u64> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            CheckoutError::Configuration(format!("{} must be a number of milliseconds", name))
        }),
        Err(_) => Ok(default),
    }
}

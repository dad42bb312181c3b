//! # Checkout Error Types
//!
//! Typed error handling for the checkout widget and its backend client.
//! Every fallible operation returns `Result<T, CheckoutError>`.
//!
//! `Display` is the technical description that goes to logs. The text shown
//! to the customer (toasts, the `onError` callback) comes from
//! [`CheckoutError::user_message`].

use thiserror::Error;

/// Shown when the processor script cannot be fetched or executed.
pub const MSG_SCRIPT_LOAD: &str = "Не удалось загрузить виджет оплаты";
/// Shown when the script loaded but the global factory is missing.
pub const MSG_FACTORY_MISSING: &str = "Виджет оплаты недоступен";
/// Shown when the mount node never appeared.
pub const MSG_MOUNT_TIMEOUT: &str = "Не удалось загрузить форму оплаты";
/// Shown when constructing or rendering the widget threw.
pub const MSG_CONSTRUCTION: &str = "Ошибка инициализации виджета оплаты";
/// Fallback when the processor reports an error without a message.
pub const MSG_PAYMENT_FAILED: &str = "Произошла ошибка при оплате";
/// Generic copy for everything that is not a widget lifecycle failure.
pub const MSG_GENERIC: &str = "Произошла ошибка. Попробуйте позже";

/// Core error type for all checkout operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Processor script failed to load (error event or timeout)
    #[error("Script load failed [{src}]: {reason}")]
    ScriptLoad { src: String, reason: String },

    /// Script loaded but the global constructor is not defined
    #[error("Widget factory `{global}` is not defined")]
    FactoryMissing { global: String },

    /// Mount node did not appear within the timeout
    #[error("Mount node #{element_id} did not appear within {waited_ms} ms")]
    MountTimeout { element_id: String, waited_ms: u64 },

    /// Widget constructor, render or listener registration threw
    #[error("Widget initialization failed: {0}")]
    Construction(String),

    /// The processor emitted its error event
    #[error("Processor reported error: {}", .message.as_deref().unwrap_or("<no message>"))]
    ProcessorReported { message: Option<String> },

    /// Configuration errors (invalid values, unreadable file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network/HTTP error talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CheckoutError {
    /// Returns true if repeating the same request may succeed.
    ///
    /// Widget lifecycle failures are never retryable here: a new attempt
    /// needs a fresh confirmation token.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Network(_) => true,
            CheckoutError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Plain-language message for the customer
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::ScriptLoad { .. } => MSG_SCRIPT_LOAD.to_string(),
            CheckoutError::FactoryMissing { .. } => MSG_FACTORY_MISSING.to_string(),
            CheckoutError::MountTimeout { .. } => MSG_MOUNT_TIMEOUT.to_string(),
            CheckoutError::Construction(_) => MSG_CONSTRUCTION.to_string(),
            CheckoutError::ProcessorReported { message } => message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(MSG_PAYMENT_FAILED)
                .to_string(),
            _ => MSG_GENERIC.to_string(),
        }
    }
}

impl From<serde_json::Error> for CheckoutError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutError::Serialization(err.to_string())
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CheckoutError::Network("timeout".into()).is_retryable());
        assert!(CheckoutError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!CheckoutError::Api {
            status: 400,
            message: "bad plan".into()
        }
        .is_retryable());
        assert!(!CheckoutError::MountTimeout {
            element_id: "payment-form".into(),
            waited_ms: 5000
        }
        .is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = CheckoutError::ScriptLoad {
            src: "https://example.com/w.js".into(),
            reason: "error event".into(),
        };
        assert_eq!(err.user_message(), "Не удалось загрузить виджет оплаты");

        let err = CheckoutError::FactoryMissing {
            global: "YooMoneyCheckoutWidget".into(),
        };
        assert_eq!(err.user_message(), MSG_FACTORY_MISSING);
        assert_eq!(
            CheckoutError::Construction("boom".into()).user_message(),
            MSG_CONSTRUCTION
        );
    }

    #[test]
    fn test_processor_message_fallback() {
        let err = CheckoutError::ProcessorReported {
            message: Some("Карта отклонена".into()),
        };
        assert_eq!(err.user_message(), "Карта отклонена");

        let err = CheckoutError::ProcessorReported {
            message: Some("   ".into()),
        };
        assert_eq!(err.user_message(), MSG_PAYMENT_FAILED);

        let err = CheckoutError::ProcessorReported { message: None };
        assert_eq!(err.user_message(), MSG_PAYMENT_FAILED);
    }

    #[test]
    fn test_transport_errors_get_generic_copy() {
        assert_eq!(
            CheckoutError::Network("refused".into()).user_message(),
            MSG_GENERIC
        );
    }
}

//! # checkout-client
//!
//! Client for the subscription backend, used by the page that hosts the
//! checkout widget.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use checkout_client::{CreatePaymentRequest, PaymentsClient};
//!
//! // Reads CHECKOUT_API_BASE_URL / CHECKOUT_API_TOKEN
//! let client = PaymentsClient::from_env()?;
//!
//! let intent = client
//!     .create_payment(&CreatePaymentRequest::new("plan_monthly"))
//!     .await?;
//!
//! // Hand intent.confirmation_token to the checkout widget, then after
//! // onSuccess:
//! let status = client.payment_status(&intent.id).await?;
//! ```

pub mod client;
pub mod config;
pub mod types;

// Re-exports
pub use client::{PaymentsClient, IDEMPOTENCE_HEADER};
pub use config::ClientConfig;
pub use types::{
    CreatePaymentRequest, PaymentIntent, PaymentStatus, Subscription, SubscriptionStatus,
};

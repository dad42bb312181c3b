//! # checkout-core
//!
//! Lifecycle controller for the embedded third-party checkout widget.
//!
//! This crate provides:
//! - `CheckoutController`: loads the processor script, waits for the mount
//!   node, renders the widget and reports exactly one outcome per token
//! - `Document`, `WidgetFactory`, `WidgetHandle`, `Notifier` and `Scheduler`
//!   traits the host implements (browser bindings live in `checkout-wasm`)
//! - `WidgetConfig` for script URL, mount node and timing bounds
//! - `CheckoutError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use checkout_core::{CheckoutController, Platform, WidgetConfig};
//!
//! let controller = CheckoutController::new(platform, WidgetConfig::default())?;
//!
//! controller.start(
//!     Some(&payment.confirmation_token),
//!     || navigate("/dashboard"),
//!     |message| show_inline_error(&message),
//! );
//!
//! // View goes away: script, timers and widget are cleaned up
//! controller.stop();
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod lifecycle;
pub mod platform;
pub mod token;

#[cfg(any(test, feature = "tokio"))]
pub mod tokio_scheduler;

// Re-exports for convenience
pub use config::{Customization, WidgetConfig};
pub use controller::CheckoutController;
pub use error::{CheckoutError, CheckoutResult};
pub use lifecycle::LifecycleState;
pub use platform::{
    Document, EventPayload, Notifier, Platform, Scheduler, ScriptTag, Toast, ToastVariant,
    WidgetFactory, WidgetHandle, WidgetListener, WidgetOptions,
};
pub use token::ConfirmationToken;

#[cfg(any(test, feature = "tokio"))]
pub use tokio_scheduler::TokioScheduler;

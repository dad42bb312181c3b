//! # Platform Traits
//!
//! Everything the controller needs from its host, expressed as traits so the
//! same lifecycle runs against the browser DOM and against test doubles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CheckoutController                       │
//! └──────┬──────────────┬───────────────┬───────────────┬───────┘
//!        │              │               │               │
//!  ┌─────┴─────┐ ┌──────┴──────┐ ┌──────┴─────┐ ┌───────┴──────┐
//!  │ Document  │ │WidgetFactory│ │  Notifier  │ │  Scheduler   │
//!  │ scripts,  │ │ └► Widget-  │ │  toasts    │ │ spawn, sleep │
//!  │ mount node│ │    Handle   │ │            │ │              │
//!  └───────────┘ └─────────────┘ └────────────┘ └──────────────┘
//! ```
//!
//! All traits are single-threaded (`?Send`): the controller lives on the
//! page's event loop.

use crate::config::{Customization, WidgetConfig};
use crate::error::CheckoutResult;
use crate::token::ConfirmationToken;
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::rc::Rc;
use std::time::Duration;

/// An injected `<script>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    /// `src` attribute
    pub src: String,
    /// `id` attribute assigned on injection, used to find it again
    pub element_id: String,
}

/// Access to the hosting document
#[async_trait(?Send)]
pub trait Document {
    /// Whether a script with this `src` is already on the page
    fn has_script(&self, src: &str) -> bool;

    /// Append an async script element and return its tag
    fn inject_script(&self, src: &str) -> CheckoutResult<ScriptTag>;

    /// Resolve on the script's load event, fail on its error event
    async fn wait_for_script(&self, tag: &ScriptTag) -> CheckoutResult<()>;

    /// Remove a previously injected script element
    fn remove_script(&self, tag: &ScriptTag);

    /// Read the processor's global constructor, if the script defined it
    fn widget_factory(&self, global: &str) -> Option<Rc<dyn WidgetFactory>>;

    /// Whether an element with this id currently exists
    fn has_element(&self, element_id: &str) -> bool;
}

/// Constructor options handed to the processor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetOptions {
    pub confirmation_token: String,
    pub return_url: String,
    pub customization: Customization,
}

impl WidgetOptions {
    pub fn new(token: &ConfirmationToken, config: &WidgetConfig) -> Self {
        Self {
            confirmation_token: token.as_str().to_string(),
            return_url: config.return_url.clone(),
            customization: config.customization.clone(),
        }
    }
}

/// The processor's global widget constructor
pub trait WidgetFactory {
    /// `new Factory(options)`; an exception maps to `Construction`
    fn create(&self, options: &WidgetOptions) -> CheckoutResult<Box<dyn WidgetHandle>>;
}

/// Data carried by a widget event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPayload {
    /// Human-readable message, when the processor supplies one
    pub message: Option<String>,
}

impl EventPayload {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Listener registered on a widget event
pub type WidgetListener = Box<dyn Fn(EventPayload)>;

/// A live widget instance
#[async_trait(?Send)]
pub trait WidgetHandle {
    /// Render into the element with this id. Resolves once the widget has
    /// either rendered or failed to.
    async fn render(&self, element_id: &str) -> CheckoutResult<()>;

    /// Subscribe to a named event
    fn on(&self, event: &str, listener: WidgetListener) -> CheckoutResult<()>;

    /// Destroy the instance. Widgets without a destroy operation keep the default.
    fn destroy(&self) {}
}

/// Visual style of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// A transient user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

pub const TOAST_SUCCESS_TITLE: &str = "Оплата прошла успешно";
pub const TOAST_SUCCESS_DESCRIPTION: &str = "Спасибо! Ваша подписка активирована";
pub const TOAST_ERROR_TITLE: &str = "Ошибка оплаты";

impl Toast {
    pub fn success() -> Self {
        Self {
            title: TOAST_SUCCESS_TITLE.to_string(),
            description: TOAST_SUCCESS_DESCRIPTION.to_string(),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: TOAST_ERROR_TITLE.to_string(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }
}

/// Surface for transient notifications
pub trait Notifier {
    fn notify(&self, toast: Toast);
}

/// Single-threaded task spawning and timers
pub trait Scheduler {
    /// Run a task on the current event loop
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    /// Resolve after `duration`
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Bundle of host collaborators
#[derive(Clone)]
pub struct Platform {
    pub document: Rc<dyn Document>,
    pub notifier: Rc<dyn Notifier>,
    pub scheduler: Rc<dyn Scheduler>,
}

impl Platform {
    pub fn new(
        document: Rc<dyn Document>,
        notifier: Rc<dyn Notifier>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            document,
            notifier,
            scheduler,
        }
    }
}

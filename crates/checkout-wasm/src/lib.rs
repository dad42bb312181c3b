//! # checkout-wasm
//!
//! WebAssembly bindings for the embedded checkout widget.
//!
//! Exposes `CheckoutWidget`, which loads the processor script, renders the
//! payment form into `#payment-form` and reports exactly one outcome per
//! confirmation token.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { CheckoutWidget } from 'checkout-widget-wasm';
//!
//! await init();
//!
//! const widget = new CheckoutWidget({ return_url: '/dashboard' }, toast);
//! widget.start(payment.confirmation_token,
//!   () => router.push('/dashboard'),
//!   (message) => console.error(message));
//!
//! // when the page unmounts
//! widget.free();
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build --target web
//! ```

pub mod browser;
pub mod console;

use browser::{BrowserDocument, BrowserNotifier, BrowserScheduler};
use checkout_core::{CheckoutController, CheckoutError, Platform, WidgetConfig};
use js_sys::Function;
use std::rc::Rc;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use wasm_bindgen::prelude::*;

/// Initialize the WASM module (called automatically)
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    console::init_logging(LevelFilter::INFO);
}

fn to_js_error(err: CheckoutError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Parse a widget config from a JS object; `undefined`/`null` means defaults
pub fn config_from_js(value: JsValue) -> Result<WidgetConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(WidgetConfig::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        to_js_error(CheckoutError::Configuration(format!(
            "Invalid widget config: {}",
            e
        )))
    })
}

/// Embedded checkout widget.
///
/// `free()` tears the widget down: the form is destroyed, the injected
/// script removed and no callback fires afterwards.
#[wasm_bindgen]
pub struct CheckoutWidget {
    controller: CheckoutController,
}

#[wasm_bindgen]
impl CheckoutWidget {
    /// `config` is optional; `toast` receives `{title, description, variant}`
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, toast: Option<Function>) -> Result<CheckoutWidget, JsValue> {
        let config = config_from_js(config)?;
        let document = BrowserDocument::from_window().map_err(to_js_error)?;

        let platform = Platform::new(
            Rc::new(document),
            Rc::new(BrowserNotifier::new(toast)),
            Rc::new(BrowserScheduler),
        );

        let controller = CheckoutController::new(platform, config).map_err(to_js_error)?;
        Ok(Self { controller })
    }

    /// Start checkout for a confirmation token.
    ///
    /// A missing or blank token does nothing. A new token replaces whatever
    /// attempt is in flight.
    pub fn start(&self, token: Option<String>, on_success: Function, on_error: Function) {
        self.controller.start(
            token.as_deref(),
            move || {
                if let Err(e) = on_success.call0(&JsValue::NULL) {
                    warn!(error = ?e, "onSuccess threw");
                }
            },
            move |message| {
                if let Err(e) = on_error.call1(&JsValue::NULL, &JsValue::from_str(&message)) {
                    warn!(error = ?e, "onError threw");
                }
            },
        );
    }

    /// Tear down the current attempt
    pub fn stop(&self) {
        self.controller.stop();
    }

    /// Lifecycle state, e.g. `"awaiting_mount"`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.controller.state().to_string()
    }

    #[wasm_bindgen(getter, js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.controller.is_active()
    }
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

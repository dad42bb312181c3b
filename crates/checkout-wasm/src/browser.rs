//! # Browser Platform
//!
//! `web-sys` implementations of the controller's platform traits.

use async_trait::async_trait;
use checkout_core::{
    CheckoutError, CheckoutResult, Document, EventPayload, Notifier, Scheduler, ScriptTag, Toast,
    ToastVariant, WidgetFactory, WidgetHandle, WidgetListener, WidgetOptions,
};
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlScriptElement;

/// Prefix of the `id` given to injected script elements
pub const SCRIPT_ID_PREFIX: &str = "checkout-widget-script";

thread_local! {
    static NEXT_SCRIPT_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_script_id() -> String {
    NEXT_SCRIPT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        format!("{}-{}", SCRIPT_ID_PREFIX, id)
    })
}

/// CSS selector matching a script by its `src` attribute
pub fn script_selector(src: &str) -> String {
    let escaped = src.replace('\\', "\\\\").replace('"', "\\\"");
    format!("script[src=\"{}\"]", escaped)
}

/// Best-effort text for a thrown JS value
pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

fn to_js<T: Serialize>(value: &T) -> CheckoutResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| CheckoutError::Serialization(e.to_string()))
}

struct ScriptListeners {
    loaded: Option<oneshot::Receiver<Result<(), String>>>,
    _on_load: Closure<dyn FnMut()>,
    _on_error: Closure<dyn FnMut()>,
}

/// The page's `document`
pub struct BrowserDocument {
    document: web_sys::Document,
    scripts: RefCell<HashMap<String, ScriptListeners>>,
}

impl BrowserDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self {
            document,
            scripts: RefCell::new(HashMap::new()),
        }
    }

    /// Document of the current window
    pub fn from_window() -> CheckoutResult<Self> {
        web_sys::window()
            .and_then(|w| w.document())
            .map(Self::new)
            .ok_or_else(|| CheckoutError::Configuration("no window.document".to_string()))
    }
}

#[async_trait(?Send)]
impl Document for BrowserDocument {
    fn has_script(&self, src: &str) -> bool {
        matches!(self.document.query_selector(&script_selector(src)), Ok(Some(_)))
    }

    fn inject_script(&self, src: &str) -> CheckoutResult<ScriptTag> {
        let script: HtmlScriptElement = self
            .document
            .create_element("script")
            .map_err(|e| script_error(src, &e))?
            .dyn_into()
            .map_err(|e| script_error(src, &e))?;

        let element_id = next_script_id();
        script.set_src(src);
        script.set_async(true);
        script.set_id(&element_id);

        // The load/error events fire once; whichever comes first wins.
        let (tx, rx) = oneshot::channel();
        let tx = Rc::new(RefCell::new(Some(tx)));

        let load_tx = Rc::clone(&tx);
        let on_load = Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = load_tx.borrow_mut().take() {
                let _ = tx.send(Ok(()));
            }
        });
        let on_error = Closure::<dyn FnMut()>::new(move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(Err("error event".to_string()));
            }
        });
        script.set_onload(Some(on_load.as_ref().unchecked_ref()));
        script.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        let head = self.document.head().ok_or_else(|| CheckoutError::ScriptLoad {
            src: src.to_string(),
            reason: "document has no <head>".to_string(),
        })?;
        head.append_child(&script)
            .map_err(|e| script_error(src, &e))?;

        self.scripts.borrow_mut().insert(
            element_id.clone(),
            ScriptListeners {
                loaded: Some(rx),
                _on_load: on_load,
                _on_error: on_error,
            },
        );

        Ok(ScriptTag {
            src: src.to_string(),
            element_id,
        })
    }

    async fn wait_for_script(&self, tag: &ScriptTag) -> CheckoutResult<()> {
        let loaded = self
            .scripts
            .borrow_mut()
            .get_mut(&tag.element_id)
            .and_then(|listeners| listeners.loaded.take());

        let Some(loaded) = loaded else {
            return Err(CheckoutError::ScriptLoad {
                src: tag.src.clone(),
                reason: "script was not injected by this document".to_string(),
            });
        };

        match loaded.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(CheckoutError::ScriptLoad {
                src: tag.src.clone(),
                reason,
            }),
            Err(_) => Err(CheckoutError::ScriptLoad {
                src: tag.src.clone(),
                reason: "script listeners dropped".to_string(),
            }),
        }
    }

    fn remove_script(&self, tag: &ScriptTag) {
        if let Some(element) = self.document.get_element_by_id(&tag.element_id) {
            if let Some(script) = element.dyn_ref::<HtmlScriptElement>() {
                script.set_onload(None);
                script.set_onerror(None);
            }
            element.remove();
        }
        self.scripts.borrow_mut().remove(&tag.element_id);
    }

    fn widget_factory(&self, global: &str) -> Option<Rc<dyn WidgetFactory>> {
        let window = web_sys::window()?;
        let value = Reflect::get(&window, &JsValue::from_str(global)).ok()?;
        let ctor = value.dyn_into::<Function>().ok()?;
        Some(Rc::new(JsWidgetFactory::new(ctor)))
    }

    fn has_element(&self, element_id: &str) -> bool {
        self.document.get_element_by_id(element_id).is_some()
    }
}

fn script_error(src: &str, value: &JsValue) -> CheckoutError {
    CheckoutError::ScriptLoad {
        src: src.to_string(),
        reason: describe_js(value),
    }
}

/// The processor's global constructor
pub struct JsWidgetFactory {
    ctor: Function,
}

impl JsWidgetFactory {
    pub fn new(ctor: Function) -> Self {
        Self { ctor }
    }
}

impl WidgetFactory for JsWidgetFactory {
    fn create(&self, options: &WidgetOptions) -> CheckoutResult<Box<dyn WidgetHandle>> {
        let options = to_js(options)?;
        let instance = Reflect::construct(&self.ctor, &Array::of1(&options))
            .map_err(|e| CheckoutError::Construction(describe_js(&e)))?;

        Ok(Box::new(JsWidgetHandle {
            instance,
            live: Rc::new(Cell::new(true)),
        }))
    }
}

/// A live widget instance created by the processor script.
///
/// Listener closures are handed to the JS garbage collector, so the
/// processor may call them at any time. Once the handle is destroyed or
/// dropped they return without doing anything.
pub struct JsWidgetHandle {
    instance: JsValue,
    live: Rc<Cell<bool>>,
}

impl JsWidgetHandle {
    fn method(&self, name: &str) -> Option<Function> {
        Reflect::get(&self.instance, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<Function>()
            .ok()
    }

    fn call(&self, name: &str, args: &Array) -> CheckoutResult<JsValue> {
        let method = self.method(name).ok_or_else(|| {
            CheckoutError::Construction(format!("widget has no `{}` method", name))
        })?;
        method
            .apply(&self.instance, args)
            .map_err(|e| CheckoutError::Construction(describe_js(&e)))
    }
}

/// Pull a message out of whatever the processor passed to its listener
fn event_payload(value: &JsValue) -> EventPayload {
    if let Some(message) = value.as_string() {
        return EventPayload::with_message(message);
    }
    if value.is_object() {
        for key in ["message", "error", "description"] {
            if let Some(message) = Reflect::get(value, &JsValue::from_str(key))
                .ok()
                .and_then(|v| v.as_string())
            {
                return EventPayload::with_message(message);
            }
        }
    }
    EventPayload::default()
}

#[async_trait(?Send)]
impl WidgetHandle for JsWidgetHandle {
    async fn render(&self, element_id: &str) -> CheckoutResult<()> {
        let result = self.call("render", &Array::of1(&JsValue::from_str(element_id)))?;

        // Some widget versions render asynchronously and return a promise.
        if let Ok(promise) = result.dyn_into::<Promise>() {
            JsFuture::from(promise).await.map_err(|e| {
                error!(error = %describe_js(&e), "Widget render rejected");
                CheckoutError::Construction(describe_js(&e))
            })?;
        }
        Ok(())
    }

    fn on(&self, event: &str, listener: WidgetListener) -> CheckoutResult<()> {
        let live = Rc::clone(&self.live);
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            if live.get() {
                listener(event_payload(&value));
            }
        })
        .into_js_value();

        self.call("on", &Array::of2(&JsValue::from_str(event), &callback))?;
        Ok(())
    }

    fn destroy(&self) {
        self.live.set(false);
        if let Some(destroy) = self.method("destroy") {
            if let Err(e) = destroy.call0(&self.instance) {
                warn!(error = %describe_js(&e), "Widget destroy threw");
            }
        }
    }
}

impl Drop for JsWidgetHandle {
    fn drop(&mut self) {
        self.live.set(false);
    }
}

/// Forwards toasts to a JS function `({title, description, variant}) => void`
pub struct BrowserNotifier {
    toast: Option<Function>,
}

impl BrowserNotifier {
    pub fn new(toast: Option<Function>) -> Self {
        Self { toast }
    }
}

impl Notifier for BrowserNotifier {
    fn notify(&self, toast: Toast) {
        let Some(callback) = &self.toast else {
            match toast.variant {
                ToastVariant::Destructive => warn!("{}: {}", toast.title, toast.description),
                ToastVariant::Default => info!("{}: {}", toast.title, toast.description),
            }
            return;
        };

        match to_js(&toast) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    warn!(error = %describe_js(&e), "Toast callback threw");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize toast"),
        }
    }
}

/// `spawn_local` plus `setTimeout`-based sleeping
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Sleep::new(duration).boxed_local()
    }
}

/// Resolves after a `setTimeout`; clears the timer if dropped early
struct Sleep {
    fired: LocalBoxFuture<'static, ()>,
    handle: Option<i32>,
}

impl Sleep {
    fn new(duration: Duration) -> Self {
        let millis = duration.as_millis().min(i32::MAX as u128) as i32;
        let mut handle = None;
        let promise = Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                handle = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                    .ok();
            }
        });

        Self {
            fired: JsFuture::from(promise).map(|_| ()).boxed_local(),
            handle,
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        match this.fired.as_mut().poll(cx) {
            Poll::Ready(()) => {
                this.handle = None;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            window.clear_timeout_with_handle(handle);
        }
    }
}

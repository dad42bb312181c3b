//! Browser tests, run with `wasm-pack test --headless --firefox`

#![cfg(target_arch = "wasm32")]

use checkout_core::error::MSG_FACTORY_MISSING;
use checkout_core::{
    CheckoutError, ConfirmationToken, Document, Scheduler, WidgetConfig, WidgetFactory,
    WidgetHandle, WidgetOptions,
};
use checkout_wasm::browser::{BrowserDocument, BrowserScheduler, JsWidgetFactory, SCRIPT_ID_PREFIX};
use checkout_wasm::CheckoutWidget;
use js_sys::{Function, Reflect};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn injected_scripts() -> u32 {
    document()
        .query_selector_all(&format!("script[id^=\"{}\"]", SCRIPT_ID_PREFIX))
        .unwrap()
        .length()
}

#[wasm_bindgen_test]
fn test_blank_token_injects_nothing() {
    let before = injected_scripts();
    let widget = CheckoutWidget::new(JsValue::UNDEFINED, None).unwrap();

    widget.start(
        Some("   ".to_string()),
        Function::new_no_args(""),
        Function::new_no_args(""),
    );

    assert_eq!(widget.state(), "idle");
    assert!(!widget.is_active());
    assert_eq!(injected_scripts(), before);
}

#[wasm_bindgen_test]
fn test_invalid_config_is_rejected() {
    let config = js_sys::Object::new();
    Reflect::set(&config, &"poll_interval_ms".into(), &JsValue::from_f64(0.0)).unwrap();

    assert!(CheckoutWidget::new(config.into(), None).is_err());
}

#[wasm_bindgen_test]
fn test_document_finds_mount_element() {
    let browser = BrowserDocument::from_window().unwrap();
    assert!(!browser.has_element("checkout-test-mount"));

    let div = document().create_element("div").unwrap();
    div.set_id("checkout-test-mount");
    document().body().unwrap().append_child(&div).unwrap();
    assert!(browser.has_element("checkout-test-mount"));

    div.remove();
    assert!(!browser.has_element("checkout-test-mount"));
}

#[wasm_bindgen_test]
async fn test_missing_factory_reports_error_and_cleans_up() {
    let config = js_sys::Object::new();
    Reflect::set(
        &config,
        &"script_url".into(),
        &"data:text/javascript,void 0".into(),
    )
    .unwrap();
    Reflect::set(&config, &"factory_global".into(), &"NoSuchCheckoutWidget".into()).unwrap();

    let before = injected_scripts();
    let widget = CheckoutWidget::new(config.into(), None).unwrap();
    let on_error = Function::new_with_args("message", "window.__checkoutError = message");

    widget.start(
        Some("ct-test-token".to_string()),
        Function::new_no_args(""),
        on_error,
    );
    assert!(widget.is_active());

    BrowserScheduler.sleep(Duration::from_millis(500)).await;

    let window = web_sys::window().unwrap();
    let reported = Reflect::get(&window, &"__checkoutError".into()).unwrap();
    assert_eq!(reported.as_string().as_deref(), Some(MSG_FACTORY_MISSING));
    assert_eq!(widget.state(), "failed");

    widget.stop();
    assert_eq!(widget.state(), "torndown");
    assert_eq!(injected_scripts(), before);
}

/// Evaluate a JS class with the given body and return its constructor
fn widget_class(body: &str) -> Function {
    Function::new_no_args(&format!("return class {{ {} }}", body))
        .call0(&JsValue::NULL)
        .unwrap()
        .dyn_into()
        .unwrap()
}

fn widget_options() -> WidgetOptions {
    let token = ConfirmationToken::parse(Some("ct-test-token")).unwrap();
    WidgetOptions::new(&token, &WidgetConfig::default())
}

#[wasm_bindgen_test]
async fn test_rejected_render_is_a_construction_error() {
    let factory = JsWidgetFactory::new(widget_class(
        "render() { return Promise.reject(new Error('mount failed')); } on() {}",
    ));
    let widget = factory.create(&widget_options()).unwrap();

    let err = widget.render("payment-form").await.unwrap_err();
    assert_eq!(err, CheckoutError::Construction("mount failed".to_string()));
}

#[wasm_bindgen_test]
async fn test_resolved_render_is_ok() {
    let factory = JsWidgetFactory::new(widget_class(
        "render() { return Promise.resolve(); } on() {}",
    ));
    let widget = factory.create(&widget_options()).unwrap();

    assert!(widget.render("payment-form").await.is_ok());
}

#[wasm_bindgen_test]
fn test_listener_called_after_drop_is_ignored() {
    let factory = JsWidgetFactory::new(widget_class(
        "render() {} on(event, cb) { window.__checkoutListener = cb; }",
    ));
    let widget = factory.create(&widget_options()).unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    widget
        .on("success", Box::new(move |_| counter.set(counter.get() + 1)))
        .unwrap();

    let window = web_sys::window().unwrap();
    let listener: Function = Reflect::get(&window, &"__checkoutListener".into())
        .unwrap()
        .dyn_into()
        .unwrap();

    listener.call0(&JsValue::NULL).unwrap();
    assert_eq!(calls.get(), 1);

    drop(widget);
    assert!(listener.call0(&JsValue::NULL).is_ok());
    assert_eq!(calls.get(), 1);
}

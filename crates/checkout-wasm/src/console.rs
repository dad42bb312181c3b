//! # Console Logging
//!
//! A `tracing` layer that writes events to the browser console, picking
//! `console.error` / `warn` / `info` / `debug` by level.

use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use wasm_bindgen::JsValue;

/// Writes each event as one console line
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLayer;

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let meta = event.metadata();
        let line = format_line(meta.level(), meta.target(), &fields.message, &fields.fields);
        let line = JsValue::from_str(&line);

        match *meta.level() {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }
}

/// `[LEVEL target] message key=value ...`
pub fn format_line(level: &Level, target: &str, message: &str, fields: &[(String, String)]) -> String {
    let mut line = format!("[{} {}] {}", level, target, message);
    for (key, value) in fields {
        let _ = write!(line, " {}={}", key, value);
    }
    line
}

/// Install the console layer as the global subscriber.
///
/// A second call is a no-op.
pub fn init_logging(max_level: LevelFilter) {
    let _ = tracing_subscriber::registry()
        .with(ConsoleLayer.with_filter(max_level))
        .try_init();
}

//! Test capture mode for deterministic logging assertions
//!
//! A `TestCaptureLayer` is added to a logger's subscriber (see
//! `config::with_capture`) and records every event in memory, decoded into the
//! same parts the JSON encoder writes.

use crate::encoder::record_level;
use applog_core_types::schema::{
    EVENT_FATAL, EVENT_FIELDS, KEY_CALLER, KEY_LOGGER, KEY_MESSAGE, KEY_STACKTRACE,
};
use applog_core_types::Level;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// A captured record with all its parts
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub logger: Option<String>,
    pub caller: Option<String>,
    pub message: Option<String>,
    pub stacktrace: Option<String>,
    pub fields: Map<String, Value>,
}

impl CapturedEvent {
    /// A custom field by key
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

#[derive(Default)]
struct CaptureVisitor {
    logger: Option<String>,
    caller: Option<String>,
    message: Option<String>,
    stacktrace: Option<String>,
    fatal: bool,
    fields: Map<String, Value>,
}

impl CaptureVisitor {
    fn put(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl Visit for CaptureVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value);
        match field.name() {
            KEY_MESSAGE => self.message = Some(text),
            name => self.put(name, Value::String(text)),
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            KEY_LOGGER => self.logger = Some(value.to_string()),
            KEY_CALLER => self.caller = Some(value.to_string()),
            KEY_MESSAGE => self.message = Some(value.to_string()),
            KEY_STACKTRACE => self.stacktrace = Some(value.to_string()),
            EVENT_FIELDS => {
                if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(value) {
                    self.fields.extend(map);
                }
            }
            name => self.put(name, Value::String(value.to_string())),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            EVENT_FATAL => self.fatal = value,
            name => self.put(name, Value::Bool(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field.name(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field.name(), Value::from(value));
    }
}

/// Test capture layer for collecting log events
pub struct TestCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for TestCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = CaptureVisitor::default();
        event.record(&mut visitor);

        let captured = CapturedEvent {
            level: record_level(event.metadata().level(), visitor.fatal),
            logger: visitor.logger,
            caller: visitor.caller,
            message: visitor.message,
            stacktrace: visitor.stacktrace,
            fields: visitor.fields,
        };

        self.events
            .lock()
            .map(|mut events| events.push(captured))
            .ok();
    }
}

/// Handle for accessing captured events in tests
#[derive(Clone, Default)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer feeding this capture
    pub fn layer(&self) -> TestCaptureLayer {
        TestCaptureLayer {
            events: self.events.clone(),
        }
    }

    /// Get all captured events
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Assert that an event exists with the given logger and message
    ///
    /// # Panics
    ///
    /// Panics if the event is not found
    pub fn assert_event_exists(&self, logger: &str, message: &str) {
        let events = self.events();
        let found = events.iter().any(|e| {
            e.logger.as_deref() == Some(logger) && e.message.as_deref() == Some(message)
        });
        assert!(
            found,
            "Expected event logger={} message={} not found in {} captured events",
            logger,
            message,
            events.len()
        );
    }

    /// Clear all captured events
    pub fn clear(&self) {
        self.events.lock().map(|mut e| e.clear()).ok();
    }

    /// Count events matching a predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl std::fmt::Debug for TestCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.events.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("TestCapture").field("events", &len).finish()
    }
}

impl PartialEq for TestCapture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.events, &other.events)
    }
}

//! JSON record encoder
//!
//! Every record is one JSON object on one line. Keys come in a fixed order:
//! `time`, `level`, `logger`, `caller`, `message`, then `stacktrace` when the
//! record carries one, then the custom fields in the order they were given.

use applog_core_types::schema::{
    EVENT_FATAL, EVENT_FIELDS, KEY_CALLER, KEY_LEVEL, KEY_LOGGER, KEY_MESSAGE, KEY_STACKTRACE,
    KEY_TIME, TIME_FORMAT,
};
use applog_core_types::Level;
use chrono::{Local, Utc};
use serde_json::Value;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Current time in the record timestamp layout
pub fn format_time(local_time: bool) -> String {
    if local_time {
        Local::now().format(TIME_FORMAT).to_string()
    } else {
        Utc::now().format(TIME_FORMAT).to_string()
    }
}

/// Map an engine level plus the fatal marker back to a record level
pub(crate) fn record_level(level: &tracing::Level, fatal: bool) -> Level {
    if fatal {
        return Level::Fatal;
    }
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

/// `file:line` keeping only the last directory and the file name
pub fn short_caller(file: &str, line: u32) -> String {
    let mut parts = file.rsplit(|c: char| c == '/' || c == '\\').filter(|p| !p.is_empty());
    let name = parts.next().unwrap_or(file);
    match parts.next() {
        Some(dir) => format!("{}/{}:{}", dir, name, line),
        None => format!("{}:{}", name, line),
    }
}

/// The parts of one record, ready to be written
#[derive(Debug, Default)]
pub(crate) struct RecordParts {
    pub time: String,
    pub level: &'static str,
    pub logger: String,
    pub caller: String,
    pub message: String,
    pub stacktrace: Option<String>,
    /// Pre-encoded JSON object holding the custom fields
    pub fields: Option<String>,
    pub extra: Vec<(String, Value)>,
}

fn push_entry(out: &mut String, key: &str, value: &Value) {
    if out.len() > 1 {
        out.push(',');
    }
    out.push_str(&Value::String(key.to_string()).to_string());
    out.push(':');
    out.push_str(&value.to_string());
}

fn push_str_entry(out: &mut String, key: &str, value: &str) {
    push_entry(out, key, &Value::String(value.to_string()));
}

impl RecordParts {
    /// Encode as a single JSON line, newline included
    pub(crate) fn encode(&self) -> String {
        let mut out = String::from("{");
        push_str_entry(&mut out, KEY_TIME, &self.time);
        push_str_entry(&mut out, KEY_LEVEL, self.level);
        push_str_entry(&mut out, KEY_LOGGER, &self.logger);
        push_str_entry(&mut out, KEY_CALLER, &self.caller);
        push_str_entry(&mut out, KEY_MESSAGE, &self.message);
        if let Some(stacktrace) = &self.stacktrace {
            push_str_entry(&mut out, KEY_STACKTRACE, stacktrace);
        }
        if let Some(inner) = self
            .fields
            .as_deref()
            .and_then(|f| f.strip_prefix('{'))
            .and_then(|f| f.strip_suffix('}'))
            .filter(|f| !f.trim().is_empty())
        {
            out.push(',');
            out.push_str(inner);
        }
        for (key, value) in &self.extra {
            push_entry(&mut out, key, value);
        }
        out.push_str("}\n");
        out
    }
}

#[derive(Default)]
struct RecordVisitor {
    logger: Option<String>,
    caller: Option<String>,
    message: Option<String>,
    stacktrace: Option<String>,
    fields: Option<String>,
    fatal: bool,
    extra: Vec<(String, Value)>,
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        match field.name() {
            KEY_MESSAGE => self.message = Some(text),
            name => self.extra.push((name.to_string(), Value::String(text))),
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            KEY_LOGGER => self.logger = Some(value.to_string()),
            KEY_CALLER => self.caller = Some(value.to_string()),
            KEY_MESSAGE => self.message = Some(value.to_string()),
            KEY_STACKTRACE => self.stacktrace = Some(value.to_string()),
            EVENT_FIELDS => self.fields = Some(value.to_string()),
            name => self
                .extra
                .push((name.to_string(), Value::String(value.to_string()))),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            EVENT_FATAL => self.fatal = value,
            name => self.extra.push((name.to_string(), Value::Bool(value))),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.extra.push((field.name().to_string(), Value::from(value)));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.extra.push((field.name().to_string(), Value::from(value)));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.extra.push((field.name().to_string(), Value::from(value)));
    }
}

/// `FormatEvent` producing the JSON record layout
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFormat {
    local_time: bool,
}

impl RecordFormat {
    pub fn new(local_time: bool) -> Self {
        Self { local_time }
    }

    pub(crate) fn parts(&self, event: &Event<'_>) -> RecordParts {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();

        let caller = visitor.caller.unwrap_or_else(|| match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => short_caller(file, line),
            _ => String::new(),
        });

        RecordParts {
            time: format_time(self.local_time),
            level: record_level(meta.level(), visitor.fatal).as_upper(),
            logger: visitor.logger.unwrap_or_else(|| meta.target().to_string()),
            caller,
            message: visitor.message.unwrap_or_default(),
            stacktrace: visitor.stacktrace,
            fields: visitor.fields,
            extra: visitor.extra,
        }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        writer.write_str(&self.parts(event).encode())
    }
}

//! The logging facade
//!
//! A `Logger` is configured once and built at most once. Each logger owns a
//! private `tracing::Dispatch`, so several loggers can coexist in one process
//! and the global default subscriber is never touched.
//!
//! ```no_run
//! use applog_core::{fields, with_file_name, with_level, Logger};
//!
//! let logger = Logger::new([with_file_name("logs/app.log"), with_level("debug")]);
//! logger.info("Api", fields!(user = "ada", attempts = 3));
//! ```

use crate::caller::{capture_stack, FrameFilter};
use crate::config::{LoggerConfig, LoggerOption};
use crate::encoder::{short_caller, RecordFormat};
use crate::errors::{LogError, Result};
use crate::field::{encode_fields, Field};
use crate::sink::{self, RotatingSink};
use crate::test_capture::TestCapture;
use applog_core_types::schema::{
    DUMP_DEFAULT_KEY, FIELD_MARSHAL_ERROR, MSG_ERROR_OCCURRED, SCOPE_DUMP, SCOPE_LOGGER,
};
use applog_core_types::Level;
use serde::Serialize;
use std::io::{self, Write};
use std::panic::Location;
use std::sync::OnceLock;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Target of every event the facade emits
pub const TARGET: &str = "applog";

struct LoggerCore {
    dispatch: Dispatch,
    level: Level,
    sink: RotatingSink,
    frames: FrameFilter,
}

fn level_filter(level: Level) -> LevelFilter {
    match level {
        Level::Debug => LevelFilter::DEBUG,
        Level::Info => LevelFilter::INFO,
        Level::Warn => LevelFilter::WARN,
        Level::Error | Level::Fatal => LevelFilter::ERROR,
    }
}

fn build(config: &LoggerConfig) -> Result<LoggerCore> {
    let level = config.parsed_level()?;
    let path = sink::resolve_path(config);
    let sink = RotatingSink::open(config, &path)?;

    let subscriber = tracing_subscriber::registry()
        .with(level_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(RecordFormat::new(config.local_time))
                .with_writer(sink::fan_out(sink.clone())),
        )
        .with(config.capture.as_ref().map(TestCapture::layer));

    Ok(LoggerCore {
        dispatch: Dispatch::new(subscriber),
        level,
        sink,
        frames: FrameFilter::new(),
    })
}

#[track_caller]
fn call_site() -> String {
    let location = Location::caller();
    short_caller(location.file(), location.line())
}

macro_rules! event_at {
    ($level:expr, $scope:expr, $caller:expr, $fields:expr, $message:expr, $stacktrace:expr) => {
        tracing::event!(
            target: TARGET,
            $level,
            logger = $scope,
            caller = $caller,
            fields = $fields,
            stacktrace = $stacktrace,
            message = $message
        )
    };
}

/// Structured logger writing JSON records to standard output and a rotating file
pub struct Logger {
    config: LoggerConfig,
    core: OnceLock<Result<LoggerCore>>,
}

impl Logger {
    /// Apply `options` to the defaults and build immediately
    ///
    /// A configuration error is reported on standard error and leaves the
    /// logger inert; use [`Logger::try_new`] to handle it instead.
    pub fn new(options: impl IntoIterator<Item = LoggerOption>) -> Self {
        let logger = Self::configure(options);
        let _ = logger.init();
        logger
    }

    /// Apply `options` to the defaults; the build happens on first use
    pub fn configure(options: impl IntoIterator<Item = LoggerOption>) -> Self {
        Self::from_config(LoggerConfig::with_options(options))
    }

    /// Wrap an explicit configuration; the build happens on first use
    pub fn from_config(config: LoggerConfig) -> Self {
        Self {
            config,
            core: OnceLock::new(),
        }
    }

    /// Apply `options` and build, returning the configuration error if any
    pub fn try_new(options: impl IntoIterator<Item = LoggerOption>) -> Result<Self> {
        let logger = Self::configure(options);
        logger.init()?;
        Ok(logger)
    }

    /// Build the logger if it has not been built yet
    ///
    /// Safe to call any number of times from any number of threads: the build
    /// runs once, concurrent callers wait for it, and its outcome (including a
    /// failure) is shared by every later call.
    pub fn init(&self) -> Result<()> {
        match self.built() {
            Ok(_) => Ok(()),
            Err(err) => Err(err.clone()),
        }
    }

    fn built(&self) -> &Result<LoggerCore> {
        self.core.get_or_init(|| {
            let built = build(&self.config);
            if let Err(err) = &built {
                eprintln!("applog: logger initialization failed [{}]: {}", err.code(), err);
            }
            built
        })
    }

    fn core(&self) -> Option<&LoggerCore> {
        self.built().as_ref().ok()
    }

    /// The logger was built successfully
    pub fn is_ready(&self) -> bool {
        self.core().is_some()
    }

    /// Records at `level` would be written
    pub fn enabled(&self, level: Level) -> bool {
        self.core().is_some_and(|core| level >= core.level)
    }

    /// The dispatcher records are routed through
    ///
    /// Lets callers send their own `tracing` events through the same sinks with
    /// `tracing::dispatcher::with_default`.
    pub fn dispatch(&self) -> Option<&Dispatch> {
        self.core().map(|core| &core.dispatch)
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Flush standard output and the log file
    pub fn flush(&self) -> Result<()> {
        let Some(core) = self.core() else {
            return Ok(());
        };
        let _ = io::stdout().flush();
        core.sink
            .flush()
            .map_err(|err| LogError::sink(core.sink.path(), err))
    }

    /// Capability to emit fatal records, which terminate the process
    pub fn fatal_logger(&self) -> FatalLogger<'_> {
        FatalLogger { logger: self }
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        scope: &str,
        message: &str,
        fields: &[Field],
        caller: &str,
    ) {
        let Some(core) = self.core() else {
            return;
        };
        if level < core.level {
            return;
        }

        let fields = encode_fields(fields);
        let stacktrace = (level >= Level::Error).then(|| capture_stack(&core.frames));
        let stacktrace = stacktrace.as_deref();

        tracing::dispatcher::with_default(&core.dispatch, || match level {
            Level::Debug => event_at!(
                tracing::Level::DEBUG,
                scope,
                caller,
                fields.as_str(),
                message,
                stacktrace
            ),
            Level::Info => event_at!(
                tracing::Level::INFO,
                scope,
                caller,
                fields.as_str(),
                message,
                stacktrace
            ),
            Level::Warn => event_at!(
                tracing::Level::WARN,
                scope,
                caller,
                fields.as_str(),
                message,
                stacktrace
            ),
            Level::Error => event_at!(
                tracing::Level::ERROR,
                scope,
                caller,
                fields.as_str(),
                message,
                stacktrace
            ),
            Level::Fatal => tracing::event!(
                target: TARGET,
                tracing::Level::ERROR,
                fatal = true,
                logger = scope,
                caller = caller,
                fields = fields.as_str(),
                stacktrace = stacktrace,
                message = message
            ),
        });
    }

    fn emit_fields(
        &self,
        level: Level,
        scope: &str,
        fields: impl IntoIterator<Item = Field>,
        caller: &str,
    ) {
        let fields: Vec<Field> = fields.into_iter().collect();
        self.emit(level, scope, scope, &fields, caller);
    }

    // The value is written as its JSON text. Marshal failures are reported
    // under the `Logger` scope and replaced by an empty string; the requested
    // record is still written.
    fn json_field<T: Serialize + ?Sized>(&self, key: &str, value: &T, caller: &str) -> Field {
        match Field::json(key, value) {
            Ok(field) => field,
            Err(err) => {
                self.emit(
                    Level::Error,
                    SCOPE_LOGGER,
                    SCOPE_LOGGER,
                    &[Field::string(FIELD_MARSHAL_ERROR, err.to_string())],
                    caller,
                );
                Field::string(key, "")
            }
        }
    }

    fn emit_if<E: std::error::Error + ?Sized>(&self, level: Level, err: Option<&E>, caller: &str) {
        if let Some(err) = err {
            self.emit(level, SCOPE_LOGGER, MSG_ERROR_OCCURRED, &[Field::error(err)], caller);
        }
    }

    #[track_caller]
    pub fn debug(&self, scope: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit_fields(Level::Debug, scope, fields, &call_site());
    }

    #[track_caller]
    pub fn info(&self, scope: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit_fields(Level::Info, scope, fields, &call_site());
    }

    #[track_caller]
    pub fn warn(&self, scope: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit_fields(Level::Warn, scope, fields, &call_site());
    }

    #[track_caller]
    pub fn error(&self, scope: &str, fields: impl IntoIterator<Item = Field>) {
        self.emit_fields(Level::Error, scope, fields, &call_site());
    }

    #[track_caller]
    pub fn debug_string(&self, scope: &str, name: &str, value: &str) {
        self.emit_fields(Level::Debug, scope, [Field::string(name, value)], &call_site());
    }

    #[track_caller]
    pub fn info_string(&self, scope: &str, name: &str, value: &str) {
        self.emit_fields(Level::Info, scope, [Field::string(name, value)], &call_site());
    }

    #[track_caller]
    pub fn warn_string(&self, scope: &str, name: &str, value: &str) {
        self.emit_fields(Level::Warn, scope, [Field::string(name, value)], &call_site());
    }

    #[track_caller]
    pub fn error_string(&self, scope: &str, name: &str, value: &str) {
        self.emit_fields(Level::Error, scope, [Field::string(name, value)], &call_site());
    }

    #[track_caller]
    pub fn debug_json<T: Serialize + ?Sized>(&self, scope: &str, name: &str, value: &T) {
        let caller = call_site();
        let field = self.json_field(name, value, &caller);
        self.emit_fields(Level::Debug, scope, [field], &caller);
    }

    #[track_caller]
    pub fn info_json<T: Serialize + ?Sized>(&self, scope: &str, name: &str, value: &T) {
        let caller = call_site();
        let field = self.json_field(name, value, &caller);
        self.emit_fields(Level::Info, scope, [field], &caller);
    }

    #[track_caller]
    pub fn warn_json<T: Serialize + ?Sized>(&self, scope: &str, name: &str, value: &T) {
        let caller = call_site();
        let field = self.json_field(name, value, &caller);
        self.emit_fields(Level::Warn, scope, [field], &caller);
    }

    #[track_caller]
    pub fn error_json<T: Serialize + ?Sized>(&self, scope: &str, name: &str, value: &T) {
        let caller = call_site();
        let field = self.json_field(name, value, &caller);
        self.emit_fields(Level::Error, scope, [field], &caller);
    }

    /// Write `value` at warn level under the `Dump` scope
    ///
    /// `key` names the field and defaults to `data`.
    #[track_caller]
    pub fn dump<T: Serialize + ?Sized>(&self, value: &T, key: Option<&str>) {
        let caller = call_site();
        let field = self.json_field(key.unwrap_or(DUMP_DEFAULT_KEY), value, &caller);
        self.emit_fields(Level::Warn, SCOPE_DUMP, [field], &caller);
    }

    /// Error record when `err` is `Some`, nothing otherwise
    #[track_caller]
    pub fn log_if<E: std::error::Error + ?Sized>(&self, err: Option<&E>) {
        self.emit_if(Level::Error, err, &call_site());
    }

    /// Warn record when `err` is `Some`, nothing otherwise
    #[track_caller]
    pub fn log_warn_if<E: std::error::Error + ?Sized>(&self, err: Option<&E>) {
        self.emit_if(Level::Warn, err, &call_site());
    }

    /// Info record when `err` is `Some`, nothing otherwise
    #[track_caller]
    pub fn log_info_if<E: std::error::Error + ?Sized>(&self, err: Option<&E>) {
        self.emit_if(Level::Info, err, &call_site());
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("ready", &self.core.get().map(|core| core.is_ok()))
            .finish()
    }
}

/// Emits fatal records
///
/// Every method writes one `FATAL` record, flushes the sinks and exits the
/// process with status 1.
#[derive(Debug, Clone, Copy)]
pub struct FatalLogger<'a> {
    logger: &'a Logger,
}

impl FatalLogger<'_> {
    fn terminate(&self) -> ! {
        let _ = self.logger.flush();
        std::process::exit(1)
    }

    #[track_caller]
    pub fn fatal(&self, scope: &str, fields: impl IntoIterator<Item = Field>) -> ! {
        self.logger
            .emit_fields(Level::Fatal, scope, fields, &call_site());
        self.terminate()
    }

    #[track_caller]
    pub fn fatal_string(&self, scope: &str, name: &str, value: &str) -> ! {
        self.logger
            .emit_fields(Level::Fatal, scope, [Field::string(name, value)], &call_site());
        self.terminate()
    }

    #[track_caller]
    pub fn fatal_json<T: Serialize + ?Sized>(&self, scope: &str, name: &str, value: &T) -> ! {
        let caller = call_site();
        let field = self.logger.json_field(name, value, &caller);
        self.logger
            .emit_fields(Level::Fatal, scope, [field], &caller);
        self.terminate()
    }
}

//! Emit command
//!
//! Usage: applog emit <LEVEL> <SCOPE> [--field KEY=VALUE]...

use applog_core::{Field, Level, Logger};
use clap::Args;

#[derive(Debug, Args)]
pub struct EmitArgs {
    /// Record level: debug, info, warn, error or fatal
    #[arg(value_name = "LEVEL")]
    pub record_level: Level,

    /// Scope label written as the record's logger
    pub scope: String,

    /// Custom field; values that parse as JSON are embedded as JSON
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<Field>,
}

/// Parse `key=value` into a field
pub fn parse_field(raw: &str) -> Result<Field, String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok(match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) => Field::new(key, json),
        Err(_) => Field::string(key, value),
    })
}

/// Execute emit command
pub fn execute(logger: &Logger, args: EmitArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.record_level {
        Level::Debug => logger.debug(&args.scope, args.fields),
        Level::Info => logger.info(&args.scope, args.fields),
        Level::Warn => logger.warn(&args.scope, args.fields),
        Level::Error => logger.error(&args.scope, args.fields),
        Level::Fatal => logger.fatal_logger().fatal(&args.scope, args.fields),
    }
    Ok(())
}

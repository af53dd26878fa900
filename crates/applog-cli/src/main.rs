//! applog CLI
//!
//! Command-line interface for emitting structured records and running traced SQL

use clap::{Parser, Subcommand};

mod commands;
mod options;

#[derive(Debug, Parser)]
#[command(name = "applog")]
#[command(about = "applog - Structured logging with rotation and SQL tracing", long_about = None)]
struct Cli {
    #[command(flatten)]
    logger: options::LoggerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Emit a single record
    Emit(commands::emit::EmitArgs),
    /// Run SQL statements through the traced database
    Sql(commands::sql::SqlArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = cli.logger.build().and_then(|logger| {
        let result = match cli.command {
            Commands::Emit(args) => commands::emit::execute(&logger, args),
            Commands::Sql(args) => commands::sql::execute(logger.clone(), args),
        };
        let _ = logger.flush();
        result
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

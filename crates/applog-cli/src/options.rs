//! Logger options shared by every command

use applog_core::{
    with_compress, with_file_name, with_level, with_local_time, with_max_age, with_max_backups,
    with_max_size, Logger, LoggerConfig, LoggerOption,
};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct LoggerArgs {
    /// TOML file with logger settings; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base log file path (date-stamped when opened)
    #[arg(long, global = true)]
    pub file_name: Option<PathBuf>,

    /// Minimum level: debug, info, warn, error or fatal
    #[arg(long, global = true)]
    pub level: Option<String>,

    /// Megabytes before the file is rotated (0 = never)
    #[arg(long, global = true)]
    pub max_size: Option<u64>,

    /// Rotated files to keep
    #[arg(long, global = true)]
    pub max_backups: Option<usize>,

    /// Days to keep rotated files
    #[arg(long, global = true)]
    pub max_age: Option<u32>,

    /// Gzip rotated files
    #[arg(long, global = true)]
    pub compress: bool,

    /// Local time instead of UTC
    #[arg(long, global = true)]
    pub local_time: bool,
}

impl LoggerArgs {
    /// Options for every flag that was given
    pub fn options(&self) -> Vec<LoggerOption> {
        let mut options = Vec::new();
        if let Some(path) = &self.file_name {
            options.push(with_file_name(path.clone()));
        }
        if let Some(level) = &self.level {
            options.push(with_level(level.clone()));
        }
        if let Some(mb) = self.max_size {
            options.push(with_max_size(mb));
        }
        if let Some(count) = self.max_backups {
            options.push(with_max_backups(count));
        }
        if let Some(days) = self.max_age {
            options.push(with_max_age(days));
        }
        if self.compress {
            options.push(with_compress(true));
        }
        if self.local_time {
            options.push(with_local_time(true));
        }
        options
    }

    /// Load the config file if any, apply the flags and build the logger
    pub fn build(&self) -> Result<Arc<Logger>, Box<dyn std::error::Error>> {
        let config = match &self.config {
            Some(path) => LoggerConfig::load(path)?,
            None => LoggerConfig::default(),
        };
        let logger = Logger::from_config(config.apply(self.options()));
        logger.init()?;
        Ok(Arc::new(logger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        logger: LoggerArgs,
    }

    #[test]
    fn test_only_given_flags_become_options() {
        let args = Harness::parse_from(["applog", "--level", "warn", "--compress"]);
        let config = LoggerConfig::default().apply(args.logger.options());
        assert_eq!(config.level, "warn");
        assert!(config.compress);
        assert_eq!(config.max_backups, 7);
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let args = Harness::parse_from(["applog"]);
        assert!(args.logger.options().is_empty());
    }
}

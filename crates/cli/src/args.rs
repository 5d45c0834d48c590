use aleth_config::ShellConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the aleth-zero shell
#[derive(Parser, Debug, Clone)]
#[command(
    name = "aleth-zero",
    version = env!("CARGO_PKG_VERSION"),
    about = "Control shell for a running blockchain node",
    long_about = "aleth-zero binds a console front-end to a blockchain node: it keeps the \
                  node's status views fresh, manages encrypted account keys, persists user \
                  settings and hosts plugins."
)]
pub struct CliArgs {
    /// Specifies the config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding settings, keys and plugin data
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Period of the refresh timer in milliseconds
    #[arg(long = "refresh-ms", value_name = "MS")]
    pub refresh_ms: Option<u64>,

    /// The verbose log level
    #[arg(long = "verbose", value_enum)]
    pub verbose: Option<LogLevel>,

    /// Plugins to load at startup, in addition to the configured ones
    #[arg(long = "plugins", value_name = "PLUGIN", value_delimiter = ',', num_args = 0..)]
    pub plugins: Vec<String>,
}

/// Log level enumeration
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl CliArgs {
    /// Get the effective configuration file path
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| {
            self.data_dir
                .clone()
                .unwrap_or_else(ShellConfig::default_data_dir)
                .join("aleth-zero.toml")
        })
    }

    /// Applies the overrides given on the command line to `config`.
    pub fn apply(&self, config: &mut ShellConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(ms) = self.refresh_ms {
            config.refresh_interval_ms = ms;
        }
        if let Some(level) = self.verbose {
            config.log_level = level.as_filter().to_string();
        }
        for plugin in &self.plugins {
            if !config.plugins.contains(plugin) {
                config.plugins.push(plugin.clone());
            }
        }
    }
}

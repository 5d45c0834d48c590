use aleth_cli::{console, status, CliArgs, ConsoleView, StatusPlugin, TerminalInput, TerminalPrompt};
use aleth_config::ShellConfig;
use aleth_shell::{Shell, ShellOptions};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::thread;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();
    let config_path = cli.config_path();
    let mut config = ShellConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply(&mut config);
    config.validate()?;

    init_tracing(&config.log_level);

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating {}", config.data_dir.display()))?;

    let options = ShellOptions::from_config(&config)?;
    let mut shell = Shell::new(options, Arc::new(TerminalPrompt), Arc::new(ConsoleView))?;
    shell.register_plugin(status::NAME, |_| Box::new(StatusPlugin::default()));

    for name in &config.plugins {
        if let Err(err) = shell.load_plugin(name) {
            warn!(target: "aleth", plugin = %name, error = %err, "failed to load plugin");
        }
    }

    info!(
        target: "aleth",
        data_dir = %config.data_dir.display(),
        accounts = shell.bridge().accounts().len(),
        "aleth-zero shell started; type 'help' for commands, Ctrl+C to exit"
    );

    let (commands, receiver) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            if let Err(err) = console::run(commands, &TerminalInput) {
                error!(target: "aleth", error = %err, "console session failed");
            }
        })
        .context("spawning the console thread")?;

    tokio::select! {
        result = shell.run(config.refresh_interval(), receiver) => {
            match result {
                Ok(()) => info!(target: "aleth", "console session ended"),
                Err(err) => error!(target: "aleth", error = %err, "shell loop failed"),
            }
        }
        result = signal::ctrl_c() => {
            if let Err(err) = result {
                error!(target: "aleth", error = %err, "failed to wait for shutdown signal");
            } else {
                info!(target: "aleth", "shutdown signal received (Ctrl+C)");
            }
        }
    }

    shell.shutdown()?;
    Ok(())
}

fn init_tracing(configured: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(env_filter).try_init();
}

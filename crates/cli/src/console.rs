//! Terminal front-end: the line reader, credential prompts and view printing.

use crate::commands;
use crate::dispatch::{self, Input, Prepared};
use aleth_shell::{LogLevel, ShellCommand, ViewSink, ViewUpdate};
use aleth_wallets::{CredentialPrompt, CredentialRequest};
use anyhow::Result;
use dialoguer::Confirm;
use std::io::{self, BufRead, Write};
use std::sync::mpsc as std_mpsc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use zeroize::Zeroizing;

const PROMPT: &str = "aleth> ";

/// Asks for credentials on the controlling terminal. An empty entry dismisses the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn request(&self, request: &CredentialRequest) -> Option<Zeroizing<String>> {
        println!("\n{}: {}", request.title, request.purpose);
        if let Some(hint) = &request.hint {
            println!("Hint: {hint}");
        }
        read_secret("Credential: ")
    }
}

fn read_secret(label: &str) -> Option<Zeroizing<String>> {
    match rpassword::prompt_password(label) {
        Ok(text) if text.is_empty() => None,
        Ok(text) => Some(Zeroizing::new(text)),
        Err(err) => {
            warn!(error = %err, "failed to read credential");
            None
        }
    }
}

/// [`Input`] backed by the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalInput;

impl Input for TerminalInput {
    fn credential(&self, label: &str) -> Option<Zeroizing<String>> {
        read_secret(&format!("{label}: "))
    }

    fn new_credential(&self, label: &str) -> Option<Zeroizing<String>> {
        let first = read_secret(&format!("{label}: "))?;
        let second = read_secret(&format!("Repeat {}: ", label.to_ascii_lowercase()))?;
        if *first != *second {
            eprintln!("Credentials do not match");
            return None;
        }
        Some(first)
    }

    fn confirm(&self, question: &str) -> bool {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Prints view updates as status lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleView;

impl ViewSink for ConsoleView {
    fn publish(&self, update: ViewUpdate) {
        if let Some(line) = render(&update) {
            println!("{line}");
        }
    }
}

/// One status line for `update`. Debug log entries are left to tracing.
pub fn render(update: &ViewUpdate) -> Option<String> {
    let line = match update {
        ViewUpdate::Network(status) => format!(
            "[net] {} | {} peers",
            if status.networking { "online" } else { "offline" },
            status.peers
        ),
        ViewUpdate::Mining(status) if status.mining => {
            format!("[mining] {} H/s", status.hashrate)
        }
        ViewUpdate::Mining(_) => "[mining] idle".to_string(),
        ViewUpdate::Chain(status) => format!(
            "[chain] #{} | {} pending",
            status.blocks, status.pending
        ),
        ViewUpdate::Balances(balances) => {
            let mut line = format!("[balances] total {}", balances.total);
            for account in &balances.accounts {
                line.push_str(&format!(
                    "\n  {} {:>24}  {}",
                    account.address.abridged(),
                    account.balance,
                    account.name
                ));
            }
            line
        }
        ViewUpdate::Log {
            level: LogLevel::Debug,
            ..
        } => return None,
        ViewUpdate::Log {
            level: LogLevel::Warn,
            entry,
        } => format!("[warn] {entry}"),
        ViewUpdate::Log { entry, .. } => format!("[note] {entry}"),
        ViewUpdate::Plugins(names) if names.is_empty() => "[plugins] none".to_string(),
        ViewUpdate::Plugins(names) => format!("[plugins] {}", names.join(", ")),
    };
    Some(line)
}

/// Reads commands from stdin until `quit`, end of input, or the shell going away.
pub fn run(shell_tx: UnboundedSender<ShellCommand>, input: &dyn Input) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            let _ = shell_tx.send(ShellCommand::Quit);
            return Ok(());
        };
        let line = line?;

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        match dispatch::prepare(command, input) {
            Prepared::Quit => {
                let _ = shell_tx.send(ShellCommand::Quit);
                return Ok(());
            }
            Prepared::Cancelled => println!("Cancelled"),
            Prepared::Job(job) => {
                let (reply, answer) = std_mpsc::channel();
                let work = ShellCommand::run(move |shell| {
                    let _ = reply.send(job(shell));
                });
                if shell_tx.send(work).is_err() {
                    debug!("shell stopped; console exiting");
                    return Ok(());
                }
                match answer.recv() {
                    Ok(Ok(text)) => println!("{text}"),
                    Ok(Err(err)) => eprintln!("error: {err:#}"),
                    Err(_) => return Ok(()),
                }
            }
        }
    }
}

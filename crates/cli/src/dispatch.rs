//! Turns parsed console commands into work for the shell thread.
//!
//! Credentials and confirmations are collected on the console thread before
//! the job is sent, so the shell loop never waits on the keyboard for them.

use crate::commands::{ConsoleCommand, HELP};
use aleth_core::Address;
use aleth_shell::{BridgeError, Confirmation, Outcome, Shell, TickOutcome};
use anyhow::Result;
use std::fmt::Write as _;
use zeroize::Zeroizing;

/// Work executed on the shell thread. The returned text is printed by the console.
pub type Job = Box<dyn FnOnce(&mut Shell) -> Result<String> + Send>;

/// Interaction with the user on the console thread.
pub trait Input {
    /// An existing credential. `None` when the user gives up.
    fn credential(&self, label: &str) -> Option<Zeroizing<String>>;

    /// A new credential, entered twice. `None` on mismatch or when the user gives up.
    fn new_credential(&self, label: &str) -> Option<Zeroizing<String>>;

    fn confirm(&self, question: &str) -> bool;
}

pub enum Prepared {
    Job(Job),
    Quit,
    /// The user declined a confirmation or dismissed a credential request.
    Cancelled,
}

impl std::fmt::Debug for Prepared {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prepared::Job(_) => f.write_str("Prepared::Job"),
            Prepared::Quit => f.write_str("Prepared::Quit"),
            Prepared::Cancelled => f.write_str("Prepared::Cancelled"),
        }
    }
}

fn job<F>(f: F) -> Prepared
where
    F: FnOnce(&mut Shell) -> Result<String> + Send + 'static,
{
    Prepared::Job(Box::new(f))
}

fn outcome(result: Outcome, done: impl Into<String>) -> String {
    match result {
        Outcome::Done => done.into(),
        Outcome::NodeUnavailable => "No node attached".to_string(),
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Collects whatever the command needs from the user and packages it as a job.
pub fn prepare(command: ConsoleCommand, input: &dyn Input) -> Prepared {
    if command.is_destructive() {
        let question = match &command {
            ConsoleCommand::Kill(address) => {
                format!("Permanently delete the key of {address}?")
            }
            ConsoleCommand::Rewind(block) => {
                format!("Discard every block above #{block}?")
            }
            ConsoleCommand::ClearPending => "Drop all pending transactions?".to_string(),
            _ => "Destroy the local chain state and rebuild from genesis?".to_string(),
        };
        if !input.confirm(&question) {
            return Prepared::Cancelled;
        }
    }

    match command {
        ConsoleCommand::Quit => Prepared::Quit,
        ConsoleCommand::Help => job(|_| Ok(HELP.to_string())),
        ConsoleCommand::Accounts => job(|shell| Ok(list_accounts(shell))),
        ConsoleCommand::NewAccount { name, hint } => {
            let Some(credential) = input.new_credential("New credential") else {
                return Prepared::Cancelled;
            };
            job(move |shell| {
                let address = shell.bridge().create_account(&name, &credential, &hint)?;
                Ok(format!("Created {address}"))
            })
        }
        ConsoleCommand::Unlock(address) => {
            let Some(credential) = input.credential("Credential") else {
                return Prepared::Cancelled;
            };
            job(move |shell| {
                shell.bridge().unlock(&address, &credential)?;
                Ok(format!("Unlocked {}", address.abridged()))
            })
        }
        ConsoleCommand::Lock(address) => job(move |shell| {
            shell.bridge().lock(&address)?;
            Ok(format!("Locked {}", address.abridged()))
        }),
        ConsoleCommand::Kill(address) => job(move |shell| {
            shell.kill_account(&address, Confirmation::confirmed_by_user())?;
            Ok(format!("Deleted {address}"))
        }),
        ConsoleCommand::Reencrypt(address) => {
            let Some((old, new)) = credential_change(input) else {
                return Prepared::Cancelled;
            };
            job(move |shell| {
                shell.reencrypt_account(&address, &old, &new)?;
                Ok(format!("Re-encrypted {}", address.abridged()))
            })
        }
        ConsoleCommand::ReencryptAll => {
            let Some((old, new)) = credential_change(input) else {
                return Prepared::Cancelled;
            };
            job(move |shell| match shell.reencrypt_all(&old, &new) {
                Ok(done) => Ok(format!("Re-encrypted {} accounts", done.len())),
                Err(BridgeError::Partial {
                    succeeded,
                    failures,
                }) => Ok(partial_report(&succeeded, &failures)),
                Err(err) => Err(err.into()),
            })
        }
        ConsoleCommand::Export(address) => {
            let Some(credential) = input.credential("Credential") else {
                return Prepared::Cancelled;
            };
            job(move |shell| {
                let key = shell.export_key(&address, &credential)?;
                Ok(key.as_str().to_string())
            })
        }
        ConsoleCommand::Vm(None) => job(|shell| Ok(format!("VM: {}", shell.vm()))),
        ConsoleCommand::Vm(Some(vm)) => job(move |shell| {
            let result = shell.select_vm(vm)?;
            Ok(outcome(result, format!("VM set to {vm}")))
        }),
        ConsoleCommand::Networking(true) => job(|shell| {
            let result = shell.start_networking()?;
            Ok(outcome(result, "Networking started"))
        }),
        ConsoleCommand::Networking(false) => job(|shell| {
            let result = shell.stop_networking()?;
            Ok(outcome(result, "Networking stopped"))
        }),
        ConsoleCommand::Mining(true) => job(|shell| {
            let result = shell.start_mining()?;
            Ok(outcome(result, "Mining started"))
        }),
        ConsoleCommand::Mining(false) => {
            job(|shell| Ok(outcome(shell.stop_mining(), "Mining stopped")))
        }
        ConsoleCommand::Peers(count) => job(move |shell| {
            let result = shell.set_peer_target(count)?;
            Ok(outcome(result, format!("Peer target set to {count}")))
        }),
        ConsoleCommand::Connect(peer) => job(move |shell| {
            let result = shell.connect_peer(&peer)?;
            Ok(outcome(result, format!("Connecting to {peer}")))
        }),
        ConsoleCommand::Private { name, force } => job(move |shell| {
            let result = shell.set_private_chain(&name, force)?;
            let done = if name.is_empty() {
                "Using the public chain".to_string()
            } else {
                format!("Using private chain '{name}'")
            };
            Ok(outcome(result, done))
        }),
        ConsoleCommand::Beneficiary(address) => job(move |shell| {
            let result = shell.set_beneficiary(address)?;
            Ok(outcome(result, format!("Beneficiary set to {address}")))
        }),
        ConsoleCommand::Sentinel(endpoint) => job(move |shell| {
            let result = shell.set_sentinel(&endpoint)?;
            Ok(outcome(result, format!("Sentinel set to {endpoint}")))
        }),
        ConsoleCommand::Inject(block) => job(move |shell| {
            let result = shell.inject_block(&block)?;
            Ok(outcome(result, "Block injected"))
        }),
        ConsoleCommand::Rewind(block) => job(move |shell| {
            let result = shell.rewind_chain(block, Confirmation::confirmed_by_user())?;
            Ok(outcome(result, format!("Rewound to block {block}")))
        }),
        ConsoleCommand::Retry => {
            job(|shell| Ok(outcome(shell.retry_unknown(), "Retrying unknown blocks")))
        }
        ConsoleCommand::ClearPending => job(|shell| {
            let result = shell.clear_pending(Confirmation::confirmed_by_user());
            Ok(outcome(result, "Pending transactions cleared"))
        }),
        ConsoleCommand::Rebuild => job(|shell| {
            let result = shell.rebuild_chain(Confirmation::confirmed_by_user())?;
            Ok(outcome(result, "Chain state rebuilt"))
        }),
        ConsoleCommand::ForceMining => job(|shell| {
            let result = shell.toggle_force_mining();
            Ok(outcome(
                result,
                format!("Force mining {}", on_off(shell.force_mining())),
            ))
        }),
        ConsoleCommand::TurboMining => job(|shell| {
            let result = shell.toggle_turbo_mining();
            Ok(outcome(
                result,
                format!("Turbo mining {}", on_off(shell.turbo_mining())),
            ))
        }),
        ConsoleCommand::Paranoia => job(|shell| {
            let result = shell.toggle_paranoia();
            Ok(outcome(
                result,
                format!("Paranoia {}", on_off(shell.paranoia())),
            ))
        }),
        ConsoleCommand::Preview => job(|shell| {
            let enabled = shell.toggle_preview();
            Ok(format!("Pending-state preview {}", on_off(enabled)))
        }),
        ConsoleCommand::Refresh => job(|shell| {
            Ok(match shell.refresh() {
                TickOutcome::Completed => "Refreshed".to_string(),
                TickOutcome::Skipped => "A refresh is already running".to_string(),
            })
        }),
        ConsoleCommand::Plugins => job(|shell| {
            let plugins = shell.plugins();
            Ok(if plugins.is_empty() {
                "No plugins loaded".to_string()
            } else {
                plugins.join("\n")
            })
        }),
        ConsoleCommand::Plugin(name) => job(move |shell| {
            let loaded = shell.toggle_plugin(&name)?;
            Ok(format!(
                "Plugin {name} {}",
                if loaded { "loaded" } else { "unloaded" }
            ))
        }),
        ConsoleCommand::Settings => job(|shell| Ok(describe_settings(shell))),
    }
}

fn credential_change(input: &dyn Input) -> Option<(Zeroizing<String>, Zeroizing<String>)> {
    let old = input.credential("Current credential")?;
    let new = input.new_credential("New credential")?;
    Some((old, new))
}

fn list_accounts(shell: &Shell) -> String {
    let bridge = shell.bridge();
    let accounts = bridge.accounts();
    if accounts.is_empty() {
        return "No accounts".to_string();
    }
    let keys = bridge.keys().lock();
    let mut out = String::new();
    for address in accounts {
        let name = keys
            .info(&address)
            .map(|info| info.name.clone())
            .unwrap_or_default();
        let state = match keys.is_locked(&address) {
            Ok(false) => "unlocked",
            _ => "locked",
        };
        let _ = writeln!(out, "{address}  {state:<8}  {name}");
    }
    out.trim_end().to_string()
}

fn partial_report(
    succeeded: &[Address],
    failures: &[(Address, aleth_wallets::WalletError)],
) -> String {
    let mut out = format!(
        "Re-encrypted {} accounts; {} kept their old credential:",
        succeeded.len(),
        failures.len()
    );
    for (address, err) in failures {
        let _ = write!(out, "\n  {address}: {err}");
    }
    out
}

fn describe_settings(shell: &Shell) -> String {
    let settings = shell.settings();
    let beneficiary = settings
        .beneficiary
        .map(|address| address.to_string())
        .unwrap_or_else(|| "-".to_string());
    let chain = if settings.is_private_chain() {
        settings.private_chain_name.as_str()
    } else {
        "(public)"
    };
    format!(
        "vm-selection         {}\n\
         private-chain-name   {chain}\n\
         beneficiary-address  {beneficiary}\n\
         peer-count-target    {}\n\
         server-list          {}\n\
         network-config       {} bytes",
        settings.vm,
        settings.peer_count_target,
        settings.server_list.join(", "),
        settings.network_config.len(),
    )
}

//! Console command parsing.

use aleth_core::{Address, VmSelection};
use anyhow::{anyhow, bail, Result};

/// A command typed at the console prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Accounts,
    NewAccount { name: String, hint: String },
    Unlock(Address),
    Lock(Address),
    Kill(Address),
    Reencrypt(Address),
    ReencryptAll,
    Export(Address),
    Vm(Option<VmSelection>),
    Networking(bool),
    Mining(bool),
    Peers(u32),
    Connect(String),
    Private { name: String, force: bool },
    Beneficiary(Address),
    Sentinel(String),
    Inject(String),
    Rewind(u64),
    Retry,
    ClearPending,
    Rebuild,
    ForceMining,
    TurboMining,
    Paranoia,
    Preview,
    Refresh,
    Plugins,
    Plugin(String),
    Settings,
    Quit,
}

impl ConsoleCommand {
    /// Whether the command destroys state and needs an explicit confirmation.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            ConsoleCommand::Kill(_)
                | ConsoleCommand::Rewind(_)
                | ConsoleCommand::ClearPending
                | ConsoleCommand::Rebuild
        )
    }
}

pub const HELP: &str = "\
Accounts:
  accounts                     list accounts and lock state
  new <name> [hint...]         create an account
  unlock <address> / lock <address>
  kill <address>               delete an account (asks for confirmation)
  reencrypt <address>          change an account credential
  reencrypt-all                change the credential of every account sharing it
  export <address>             print the raw key
Node:
  net start|stop               networking
  mine start|stop              mining
  peers <n>                    ideal peer count
  connect <host:port>          dial a peer
  vm [interpreter|jit|smart]   show or select the VM
  private [name] [--force]     private chain name; empty for the public chain
  beneficiary <address>        mining beneficiary
  sentinel <endpoint>          sentinel endpoint
  inject <hex>                 inject a block
  rewind <block>               rewind the chain (asks for confirmation)
  retry                        retry unknown blocks
  clear-pending                drop pending transactions (asks for confirmation)
  rebuild                      destroy local chain state (asks for confirmation)
  force-mining | turbo | paranoia
View:
  preview                      toggle pending-state balances
  refresh                      run a refresh cycle now
  settings                     show persisted settings
Plugins:
  plugins                      list loaded plugins
  plugin <name>                load or unload a plugin
  help | quit";

/// Parses one console line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "accounts" | "ls" => ConsoleCommand::Accounts,
        "new" => {
            let (name, hint) = rest
                .split_first()
                .ok_or_else(|| anyhow!("usage: new <name> [hint...]"))?;
            ConsoleCommand::NewAccount {
                name: name.to_string(),
                hint: hint.join(" "),
            }
        }
        "unlock" => ConsoleCommand::Unlock(address_arg(&rest, "unlock")?),
        "lock" => ConsoleCommand::Lock(address_arg(&rest, "lock")?),
        "kill" => ConsoleCommand::Kill(address_arg(&rest, "kill")?),
        "reencrypt" => ConsoleCommand::Reencrypt(address_arg(&rest, "reencrypt")?),
        "reencrypt-all" => ConsoleCommand::ReencryptAll,
        "export" => ConsoleCommand::Export(address_arg(&rest, "export")?),
        "vm" => match rest.first() {
            None => ConsoleCommand::Vm(None),
            Some(name) => ConsoleCommand::Vm(Some(name.parse()?)),
        },
        "net" => ConsoleCommand::Networking(switch_arg(&rest, "net")?),
        "mine" => ConsoleCommand::Mining(switch_arg(&rest, "mine")?),
        "peers" => {
            let count = single(&rest, "peers <n>")?;
            ConsoleCommand::Peers(
                count
                    .parse()
                    .map_err(|_| anyhow!("peer count must be a number: {count}"))?,
            )
        }
        "connect" => ConsoleCommand::Connect(single(&rest, "connect <host:port>")?.to_string()),
        "private" => {
            let force = rest.contains(&"--force");
            let name = rest
                .iter()
                .filter(|word| **word != "--force")
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            ConsoleCommand::Private { name, force }
        }
        "beneficiary" => ConsoleCommand::Beneficiary(address_arg(&rest, "beneficiary")?),
        "sentinel" => ConsoleCommand::Sentinel(single(&rest, "sentinel <endpoint>")?.to_string()),
        "inject" => ConsoleCommand::Inject(single(&rest, "inject <hex>")?.to_string()),
        "rewind" => {
            let block = single(&rest, "rewind <block>")?;
            ConsoleCommand::Rewind(
                block
                    .parse()
                    .map_err(|_| anyhow!("block must be a number: {block}"))?,
            )
        }
        "retry" => ConsoleCommand::Retry,
        "clear-pending" => ConsoleCommand::ClearPending,
        "rebuild" => ConsoleCommand::Rebuild,
        "force-mining" => ConsoleCommand::ForceMining,
        "turbo" => ConsoleCommand::TurboMining,
        "paranoia" => ConsoleCommand::Paranoia,
        "preview" => ConsoleCommand::Preview,
        "refresh" => ConsoleCommand::Refresh,
        "plugins" => ConsoleCommand::Plugins,
        "plugin" => ConsoleCommand::Plugin(single(&rest, "plugin <name>")?.to_string()),
        "settings" => ConsoleCommand::Settings,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => bail!("unknown command: {other} (try 'help')"),
    };
    Ok(Some(command))
}

fn single<'a>(rest: &[&'a str], usage: &str) -> Result<&'a str> {
    match rest {
        [value] => Ok(value),
        _ => bail!("usage: {usage}"),
    }
}

fn address_arg(rest: &[&str], verb: &str) -> Result<Address> {
    let text = single(rest, &format!("{verb} <address>"))?;
    Ok(text.parse()?)
}

fn switch_arg(rest: &[&str], verb: &str) -> Result<bool> {
    match single(rest, &format!("{verb} start|stop"))? {
        "start" | "on" => Ok(true),
        "stop" | "off" => Ok(false),
        other => bail!("expected start or stop, got {other}"),
    }
}

//! Commands typed at the console prompt and their dispatch onto the session.

use std::str::FromStr;

use anyhow::{anyhow, bail};
use client_core::{LabSession, OpenOutcome};
use shared::domain::ChallengeId;
use tracing::debug;

pub const HELP: &str = "commands: open | create | restart | shutdown | refresh | list | details <id> | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Open,
    Create,
    Restart,
    Shutdown,
    Refresh,
    List,
    Details { id: ChallengeId },
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            "create" => Self::Create,
            "restart" => Self::Restart,
            "shutdown" | "stop" => Self::Shutdown,
            "refresh" => Self::Refresh,
            "list" => Self::List,
            "details" => {
                let raw = words
                    .next()
                    .ok_or_else(|| anyhow!("usage: details <challenge id>"))?;
                let id = raw
                    .parse::<i64>()
                    .map_err(|_| anyhow!("challenge id must be a number, got `{raw}`"))?;
                Self::Details { id: ChallengeId(id) }
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command `{other}`"),
        };
        if let Some(extra) = words.next() {
            bail!("unexpected argument `{extra}`");
        }
        Ok(command)
    }
}

/// Runs one command to completion. Returns false once the console should exit.
pub async fn dispatch(session: &LabSession, command: ConsoleCommand) -> bool {
    debug!(?command, "dispatching console command");
    match command {
        ConsoleCommand::Open => {
            if let OpenOutcome::Opened { url } = session.instance().open().await {
                debug!(%url, "instance opened");
            }
        }
        ConsoleCommand::Create => {
            session.instance().create().await;
        }
        ConsoleCommand::Restart => {
            session.instance().restart().await;
        }
        ConsoleCommand::Shutdown => {
            session.instance().shutdown().await;
        }
        ConsoleCommand::Refresh => {
            session.instance().refresh_status().await;
            session.challenges().refresh_challenge_status().await;
        }
        ConsoleCommand::List => {
            session.challenges().load_challenge_list().await;
        }
        ConsoleCommand::Details { id } => {
            session.challenges().show_details(id).await;
        }
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => return false,
    }
    true
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;

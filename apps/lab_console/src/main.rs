use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpLabApi, LabSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use commands::{dispatch, ConsoleCommand, HELP};
use config::load_settings;
use terminal::{PrintNavigator, TerminalView};

#[derive(Parser, Debug)]
#[command(about = "Drive a sandbox lab session from the terminal")]
struct Args {
    #[arg(long, default_value = "lab_console.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    launch_id: Option<String>,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    assignment_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(launch_id) = args.launch_id {
        settings.launch_id = Some(launch_id);
    }
    if let Some(user_id) = args.user_id {
        settings.user_id = Some(user_id);
    }
    if let Some(assignment_id) = args.assignment_id {
        settings.assignment_id = Some(assignment_id);
    }
    let session_config = settings.into_session_config()?;

    let api = HttpLabApi::new(&session_config.server_url, session_config.ids.clone())
        .with_context(|| format!("invalid server url {}", session_config.server_url))?;
    info!(server_url = %session_config.server_url, "connecting to lab server");

    let mut session = LabSession::start(
        &session_config,
        Arc::new(api),
        Arc::new(TerminalView::stdout()),
        Arc::new(PrintNavigator),
    )
    .await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(command) => {
                        if !dispatch(&session, command).await {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "ignoring console input"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop();
    info!("lab session closed");
    Ok(())
}

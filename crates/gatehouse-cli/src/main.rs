//! Gatehouse CLI
//!
//! Command-line interface for checking permissions against an ACL policy.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Parser;
use gatehouse_cli::commands;
use gatehouse_cli::config::{POLICY_ENV, Policy};
use gatehouse_cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = cli
        .policy
        .as_deref()
        .ok_or_else(|| anyhow!("no policy file: pass --policy or set {POLICY_ENV}"))?;
    let policy = Policy::load(path)
        .with_context(|| format!("loading policy {}", path.display()))?;
    tracing::debug!(path = %path.display(), "policy loaded");

    let succeeded = commands::execute(&policy, cli.command)?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

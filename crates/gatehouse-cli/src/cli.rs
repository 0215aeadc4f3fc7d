//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gatehouse_acl::parse_state;
use serde_json::Value;

use crate::config::POLICY_ENV;

/// Gatehouse - ACL policy checker
#[derive(Parser, Debug)]
#[command(name = "gatehouse", version)]
#[command(about = "Check permissions against a Gatehouse ACL policy", long_about = None)]
pub struct Cli {
    /// Policy file path
    #[arg(short, long, env = POLICY_ENV, global = true)]
    pub policy: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decide whether a permission is granted on an object
    Check {
        /// Object name from the policy file
        object: String,
        /// Permission to test, e.g. `http.get`
        permission: String,
        /// Context override; the value is parsed as JSON, else taken as a string
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, Value)>,
        /// State to apply when no ACE matches
        #[arg(long, value_name = "allow|deny", value_parser = parse_default)]
        default: Option<bool>,
    },
    /// Parse every object's ACL and report errors
    Lint,
    /// Show the inheritance walk and merged context of an object
    Walk {
        /// Object name from the policy file
        object: String,
    },
}

/// Parse a `key=value` context override.
pub fn parse_assignment(arg: &str) -> Result<(String, Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{arg}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn parse_default(arg: &str) -> Result<bool, String> {
    parse_state(arg).map_err(|e| e.to_string())
}

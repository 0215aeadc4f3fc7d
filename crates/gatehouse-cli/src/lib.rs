//! # gatehouse-cli
//!
//! Command-line policy checker for Gatehouse.
//!
//! Loads a TOML policy file describing protected objects and answers:
//! - whether a permission is granted on an object (`check`)
//! - whether every object's ACL parses (`lint`)
//! - how an object's inheritance graph is walked (`walk`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use config::{Policy, PolicyConfig};
pub use error::{Error, Result};

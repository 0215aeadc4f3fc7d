//! ACE state resolution.
//!
//! A state is the outcome an ACE produces when it matches. Text ACLs spell it
//! as one of four case-insensitive tokens:
//!
//! - `ALLOW` / `GRANT` resolve to `true`
//! - `DENY` / `REJECT` resolve to `false`
//!
//! Structural ACEs may also supply a boolean directly.
//!
//! ```
//! use gatehouse_acl::state::{parse_state, resolve_state};
//! use serde_json::json;
//!
//! assert!(parse_state("Allow").unwrap());
//! assert!(!parse_state("REJECT").unwrap());
//! assert!(resolve_state(&json!(true)).unwrap());
//! assert!(resolve_state(&json!(42)).is_err());
//! ```

use serde_json::Value;

use crate::{Error, Result};

/// Resolve a textual state token.
pub fn parse_state(token: &str) -> Result<bool> {
    match token.to_ascii_lowercase().as_str() {
        "allow" | "grant" => Ok(true),
        "deny" | "reject" => Ok(false),
        _ => Err(Error::InvalidStateValue(token.to_string())),
    }
}

/// Resolve a structural state value.
///
/// Booleans pass through unchanged; strings go through [`parse_state`].
pub fn resolve_state(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(state) => Ok(*state),
        Value::String(token) => parse_state(token),
        other => Err(Error::InvalidStateType(json_type_name(other))),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Error types for gatehouse-acl

use thiserror::Error;

/// Result type alias for gatehouse-acl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a host-level check refused access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// The requester is not authenticated.
    Unauthorized,
    /// The requester is authenticated but not permitted.
    Forbidden,
    /// The object should be reported as missing rather than forbidden.
    NotFound,
}

impl DenialKind {
    /// The HTTP status a host would conventionally answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DenialKind::Unauthorized => 401,
            DenialKind::Forbidden => 403,
            DenialKind::NotFound => 404,
        }
    }
}

impl std::fmt::Display for DenialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialKind::Unauthorized => write!(f, "unauthorized"),
            DenialKind::Forbidden => write!(f, "forbidden"),
            DenialKind::NotFound => write!(f, "not found"),
        }
    }
}

/// Errors that can occur while parsing or evaluating ACLs
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A non-blank ACE line did not split into exactly three fields
    #[error("Malformed ACE on line {line}: expected 3 fields, found {fields} in {text:?}")]
    MalformedAce {
        /// 1-based line number within the text block
        line: usize,
        /// Number of whitespace-separated fields found
        fields: usize,
        /// The offending line, after comment stripping
        text: String,
    },

    /// Predicate token names no registered predicate or family
    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    /// Permission-set token names no registered set
    #[error("Unknown permission set: {0}")]
    UnknownPermissionSet(String),

    /// A permission-set pattern could not be compiled
    #[error("Invalid permission pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// The pattern as written
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// State value is neither a boolean nor a string
    #[error("ACL state must be bool or string, got {0}")]
    InvalidStateType(&'static str),

    /// State string is not one of ALLOW, GRANT, DENY, REJECT
    #[error("Unknown ACL state string: {0:?}")]
    InvalidStateValue(String),

    /// A predicate needed a context key that was absent
    #[error("Predicate {predicate} requires context key '{key}'")]
    MissingContext {
        /// Predicate label
        predicate: String,
        /// Missing key
        key: String,
    },

    /// A context value had the wrong shape for the predicate reading it
    #[error("Context key '{key}' is invalid: {message}")]
    InvalidContext {
        /// Offending key
        key: String,
        /// What was expected
        message: String,
    },

    /// Host-level check refused access
    #[error("Access denied ({0})")]
    Denied(DenialKind),
}

impl Error {
    /// Returns whether this error was raised while parsing ACL sources.
    ///
    /// Parse errors are raised before any ACE is evaluated.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedAce { .. }
                | Error::UnknownPredicate(_)
                | Error::UnknownPermissionSet(_)
                | Error::InvalidPattern { .. }
                | Error::InvalidStateType(_)
                | Error::InvalidStateValue(_)
        )
    }

    /// Creates a missing-context error.
    pub fn missing_context<P, K>(predicate: P, key: K) -> Self
    where
        P: Into<String>,
        K: Into<String>,
    {
        Error::MissingContext {
            predicate: predicate.into(),
            key: key.into(),
        }
    }

    /// Creates an invalid-context error.
    pub fn invalid_context<K, M>(key: K, message: M) -> Self
    where
        K: Into<String>,
        M: Into<String>,
    {
        Error::InvalidContext {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-pattern error.
    pub fn invalid_pattern<P: Into<String>, M: Into<String>>(pattern: P, message: M) -> Self {
        Error::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

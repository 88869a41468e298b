// src/error.rs

//! Error types for the zypper command layer
//!
//! [`Error`] covers everything that can go wrong inside the engine or its
//! resource manager. [`Interrupt`] is the control-flow type command handlers
//! return: it tells the execution guard whether to stop quietly, report a
//! user abort, or treat the failure as unexpected.

use thiserror::Error;

/// Result type for zypper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the engine and the resource manager
#[derive(Error, Debug)]
pub enum Error {
    /// Token that does not name any command
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    /// Option that requires a value was given none
    #[error("option '{0}' requires an argument")]
    MissingArgument(String),

    /// URL that could not be parsed
    #[error("Given URI is invalid: {url} ({reason})")]
    InvalidUrl { url: String, reason: String },

    /// Resolvable type name that is not one of package, patch, pattern, product
    #[error("Unknown resolvable type: {0}")]
    UnknownKind(String),

    /// Repository type name that the backend does not know
    #[error("Unknown repository type: {0}")]
    UnknownRepoType(String),

    /// The package management lock is held by another process
    #[error("package management lock is held by another process")]
    Locked { pid: Option<u32> },

    /// Repository alias lookup failed
    #[error("Repository '{0}' not found")]
    RepoNotFound(String),

    /// Repository alias already in use
    #[error("Repository named '{0}' already exists. Please use another alias.")]
    RepoExists(String),

    /// Malformed .repo file or cache
    #[error("parse error in {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Edition string that could not be parsed
    #[error("invalid edition '{0}'")]
    InvalidEdition(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Solver could not satisfy the request
    #[error("dependency resolution failed: {0}")]
    Resolver(String),

    /// Commit of the transaction failed
    #[error("transaction commit failed: {0}")]
    Commit(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Non-local outcome of a command, handled by the execution guard
#[derive(Error, Debug)]
pub enum Interrupt {
    /// Processing must stop now; the exit code is already set on the session
    #[error("exit requested: {0}")]
    Exit(String),

    /// The user aborted the current command
    #[error("{0}")]
    Abort(String),

    /// Anything else; reported as a bug
    #[error(transparent)]
    Failed(#[from] Error),
}

impl Interrupt {
    pub fn exit(reason: impl Into<String>) -> Self {
        Self::Exit(reason.into())
    }

    pub fn abort(msg: impl Into<String>) -> Self {
        Self::Abort(msg.into())
    }
}

/// Result type for command handlers
pub type Flow<T = ()> = std::result::Result<T, Interrupt>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_display() {
        let err = Error::Locked { pid: Some(42) };
        assert_eq!(
            err.to_string(),
            "package management lock is held by another process"
        );
    }

    #[test]
    fn test_interrupt_from_error() {
        let interrupt: Interrupt = Error::other("boom").into();
        assert!(matches!(interrupt, Interrupt::Failed(Error::Other(_))));
        assert_eq!(interrupt.to_string(), "boom");
    }
}

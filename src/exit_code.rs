// src/exit_code.rs

//! Process exit codes
//!
//! Scripts branch on these values, so they are fixed. Error codes are in
//! the 1..=5 range, informational codes start at 100.

use std::fmt;

/// Outcome of a command, as reported to the calling process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExitCode {
    #[default]
    Ok,
    /// Unexpected situation, most likely a bug
    Bug,
    /// Malformed or unknown option or command
    SyntaxError,
    /// Semantically wrong argument
    InvalidArgs,
    /// Failure reported by the package management library
    ZyppError,
    /// Operation needs root privileges
    PrivilegeError,
    /// Updates are available
    UpdateNeeded,
    /// Security updates are available
    SecurityUpdateNeeded,
    /// A reboot is needed after the transaction
    RebootNeeded,
    /// The package manager itself should be restarted
    RestartNeeded,
}

impl ExitCode {
    /// Numeric process exit status
    pub fn code(self) -> u8 {
        match self {
            ExitCode::Ok => 0,
            ExitCode::Bug => 1,
            ExitCode::SyntaxError => 2,
            ExitCode::InvalidArgs => 3,
            ExitCode::ZyppError => 4,
            ExitCode::PrivilegeError => 5,
            ExitCode::UpdateNeeded => 100,
            ExitCode::SecurityUpdateNeeded => 101,
            ExitCode::RebootNeeded => 102,
            ExitCode::RestartNeeded => 103,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ExitCode::Ok
    }

    /// True for the 1..=5 error range, false for OK and informational codes
    pub fn is_error(self) -> bool {
        (1..100).contains(&self.code())
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitCode::Ok => "OK",
            ExitCode::Bug => "ERR_BUG",
            ExitCode::SyntaxError => "ERR_SYNTAX",
            ExitCode::InvalidArgs => "ERR_INVALID_ARGS",
            ExitCode::ZyppError => "ERR_ZYPP",
            ExitCode::PrivilegeError => "ERR_PRIVILEGES",
            ExitCode::UpdateNeeded => "INF_UPDATE_NEEDED",
            ExitCode::SecurityUpdateNeeded => "INF_SEC_UPDATE_NEEDED",
            ExitCode::RebootNeeded => "INF_REBOOT_NEEDED",
            ExitCode::RestartNeeded => "INF_RESTART_NEEDED",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ExitCode::Ok.code(), 0);
        assert_eq!(ExitCode::SyntaxError.code(), 2);
        assert_eq!(ExitCode::InvalidArgs.code(), 3);
        assert_eq!(ExitCode::ZyppError.code(), 4);
        assert_eq!(ExitCode::PrivilegeError.code(), 5);
        assert_eq!(ExitCode::SecurityUpdateNeeded.code(), 101);
    }

    #[test]
    fn test_error_range() {
        assert!(!ExitCode::Ok.is_error());
        assert!(ExitCode::Bug.is_error());
        assert!(ExitCode::PrivilegeError.is_error());
        assert!(!ExitCode::UpdateNeeded.is_error());
        assert!(!ExitCode::RestartNeeded.is_error());
    }
}

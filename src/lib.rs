// src/lib.rs

//! Zypper command layer
//!
//! Command line front end of a package manager: global and per-command
//! option parsing, command lookup by name or alias, an execution guard that
//! turns every outcome into a process exit code, and an interactive shell
//! that runs many commands in one session.
//!
//! # Architecture
//!
//! - `getopt` and `cli`: option tables and the per-command descriptors
//! - `session`: global state, option processing and the guarded dispatch
//! - `shell`: read-dispatch-reset loop over a [`shell::LineReader`]
//! - `commands`: the command handlers
//! - `manager`: the [`ResourceManager`] seam and its file-backed
//!   implementation [`LocalManager`]

pub mod cli;
pub mod command;
pub mod commands;
pub mod console;
pub mod edition;
mod error;
pub mod exit_code;
pub mod getopt;
pub mod manager;
pub mod options;
pub mod session;
pub mod shell;
pub mod table;

pub use command::{Command, CommandRegistry};
pub use console::Console;
pub use error::{Error, Flow, Interrupt, Result};
pub use exit_code::ExitCode;
pub use manager::{LocalManager, ResourceManager};
pub use options::GlobalOptions;
pub use session::{Host, Session};
pub use shell::{LineReader, ReadOutcome, RustylineReader};

// src/shell.rs

//! The zypper shell
//!
//! Reads one line at a time, runs it as a command in the current session
//! and resets the per-command state before reading the next one. Global
//! options given on the command line stay in effect for every line.
//!
//! Line input goes through [`LineReader`]: the terminal implementation is
//! [`RustylineReader`], tests script their own.

use crate::cli;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::session::Session;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use tracing::{debug, info, warn};

pub const PROMPT: &str = "zypper> ";

/// Result of reading one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl-C: the current line is discarded
    Interrupted,
    /// Ctrl-D or closed input
    Eof,
}

/// Source of shell input lines with a history
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    fn add_history(&mut self, line: &str);

    fn load_history(&mut self, path: &Path) -> Result<()>;

    fn save_history(&mut self, path: &Path) -> Result<()>;
}

/// Terminal line editing with rustyline
pub struct RustylineReader {
    editor: DefaultEditor,
}

impl RustylineReader {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(readline_error)?;
        Ok(Self { editor })
    }
}

fn readline_error(e: ReadlineError) -> Error {
    match e {
        ReadlineError::Io(e) => Error::Io(e),
        other => Error::other(format!("line editor: {other}")),
    }
}

impl LineReader for RustylineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(readline_error(e)),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            debug!("Couldn't add to history: {}", e);
        }
    }

    fn load_history(&mut self, path: &Path) -> Result<()> {
        self.editor.load_history(path).map_err(readline_error)
    }

    fn save_history(&mut self, path: &Path) -> Result<()> {
        self.editor.save_history(path).map_err(readline_error)
    }
}

/// Where the shell loop is
enum ShellState {
    Reading,
    Dispatching(String),
    Resetting,
    Terminated,
}

/// Run the shell until `quit`, Ctrl-D or end of input
pub fn command_shell(s: &mut Session) {
    info!("Entering the shell");

    let mut reader = match s.line_reader.take() {
        Some(reader) => reader,
        None => match RustylineReader::new() {
            Ok(reader) => Box::new(reader) as Box<dyn LineReader>,
            Err(e) => {
                warn!("No line editor: {}", e);
                s.console.err(e);
                s.set_exit_code(crate::exit_code::ExitCode::ZyppError);
                return;
            }
        },
    };

    s.set_running_shell(true);
    let history_path = s.host.history_path.clone();
    if let Some(path) = &history_path {
        if let Err(e) = reader.load_history(path) {
            debug!("No history loaded from {:?}: {}", path, e);
        }
    }

    let mut state = ShellState::Reading;
    loop {
        state = match state {
            ShellState::Reading => match reader.read_line(PROMPT) {
                Ok(ReadOutcome::Line(line)) => {
                    s.console.err_debug(format!("Got: {line}"));
                    if !line.trim().is_empty() {
                        reader.add_history(&line);
                    }
                    ShellState::Dispatching(line)
                }
                Ok(ReadOutcome::Interrupted) => ShellState::Reading,
                Ok(ReadOutcome::Eof) => {
                    s.console.out("");
                    ShellState::Terminated
                }
                Err(e) => {
                    warn!("Reading shell input failed: {}", e);
                    s.console.err(e);
                    ShellState::Terminated
                }
            },
            ShellState::Dispatching(line) => dispatch_line(s, &line),
            ShellState::Resetting => {
                s.reset_for_next_command();
                ShellState::Reading
            }
            ShellState::Terminated => break,
        };
    }

    if let Some(path) = &history_path {
        if let Err(e) = reader.save_history(path) {
            debug!("History not saved to {:?}: {}", path, e);
        }
    }
    s.set_running_shell(false);
    s.line_reader = Some(reader);
    info!("Leaving the shell");
}

fn dispatch_line(s: &mut Session, line: &str) -> ShellState {
    let mut tokens = line.split_whitespace().map(str::to_string);
    let Some(first) = tokens.next() else {
        return ShellState::Reading;
    };

    match s.registry.resolve(&first) {
        Ok(Command::ShellQuit) => {
            if first == "\u{4}" {
                s.console.out("");
            }
            ShellState::Terminated
        }
        Ok(command) => {
            debug!("Shell command {:?}", command);
            s.command = command;
            s.command_args = tokens.collect();
            s.safe_do_command();
            ShellState::Resetting
        }
        Err(e) => {
            s.console.err(e);
            s.console.err(cli::unknown_command_hint(true));
            ShellState::Reading
        }
    }
}

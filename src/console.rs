// src/console.rs

//! User-facing output
//!
//! All program output goes through [`Console`] so that verbosity levels and
//! the machine-readable envelope are applied in one place, and so tests can
//! capture stdout and stderr.
//!
//! Write errors on the terminal are ignored: there is nobody left to report
//! them to.

use std::fmt::Display;
use std::io::{self, BufRead, Write};

/// Opening marker of the machine-readable stream
pub const XML_HEADER: &str = "<?xml version='1.0'?>";
pub const STREAM_OPEN: &str = "<stream>";
pub const STREAM_CLOSE: &str = "</stream>";

pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    input: Box<dyn BufRead>,
    verbosity: i32,
    machine_readable: bool,
    non_interactive: bool,
}

impl Console {
    /// Console without an answer source; every prompt takes its default
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self::with_input(out, err, Box::new(io::empty()))
    }

    pub fn with_input(out: Box<dyn Write>, err: Box<dyn Write>, input: Box<dyn BufRead>) -> Self {
        Self {
            out,
            err,
            input,
            verbosity: 0,
            machine_readable: false,
            non_interactive: false,
        }
    }

    /// Console bound to the process stdin, stdout and stderr
    pub fn stdio() -> Self {
        Self::with_input(
            Box::new(io::stdout()),
            Box::new(io::stderr()),
            Box::new(io::BufReader::new(io::stdin())),
        )
    }

    pub fn set_verbosity(&mut self, verbosity: i32) {
        self.verbosity = verbosity;
    }

    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }

    pub fn set_machine_readable(&mut self, on: bool) {
        self.machine_readable = on;
    }

    pub fn machine_readable(&self) -> bool {
        self.machine_readable
    }

    pub fn set_non_interactive(&mut self, on: bool) {
        self.non_interactive = on;
    }

    /// Ask a yes/no question
    ///
    /// In non-interactive mode, or when no answer can be read, the default
    /// is taken and echoed so the transcript shows what was decided.
    pub fn confirm(&mut self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        self.out_raw(format_args!("{question} {hint}: "));

        if self.non_interactive {
            self.out(if default { "y" } else { "n" });
            return default;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.out("");
                default
            }
            Ok(_) => match line.trim().to_lowercase().as_str() {
                "" => default,
                "y" | "yes" => true,
                _ => false,
            },
        }
    }

    /// Unconditional stdout line
    pub fn out(&mut self, msg: impl Display) {
        let _ = writeln!(self.out, "{msg}");
    }

    /// Stdout text without a trailing newline
    pub fn out_raw(&mut self, msg: impl Display) {
        let _ = write!(self.out, "{msg}");
        let _ = self.out.flush();
    }

    /// Stdout line at normal verbosity (suppressed by `--quiet`)
    pub fn normal(&mut self, msg: impl Display) {
        if self.verbosity >= 0 {
            self.out(msg);
        }
    }

    /// Stdout line shown with `-v`
    pub fn verbose(&mut self, msg: impl Display) {
        if self.verbosity >= 1 {
            self.out(msg);
        }
    }

    /// Unconditional stderr line
    pub fn err(&mut self, msg: impl Display) {
        let _ = writeln!(self.err, "{msg}");
    }

    /// Stderr line shown with `-v`
    pub fn err_verbose(&mut self, msg: impl Display) {
        if self.verbosity >= 1 {
            self.err(msg);
        }
    }

    /// Stderr line shown with `-vv`
    pub fn err_debug(&mut self, msg: impl Display) {
        if self.verbosity >= 2 {
            self.err(msg);
        }
    }

    /// Error report in the current output mode
    ///
    /// Machine-readable mode wraps it in a `<message>` element on stdout,
    /// plain mode prints it to stderr.
    pub fn error_message(&mut self, msg: impl Display) {
        if self.machine_readable {
            self.out(format_args!("<message type=\"error\">{}</message>", xml_escape(&msg.to_string())));
        } else {
            self.err(msg);
        }
    }

    /// Open the machine-readable envelope
    pub fn open_stream(&mut self) {
        self.out(XML_HEADER);
        self.out(STREAM_OPEN);
    }

    pub fn close_stream(&mut self) {
        self.out(STREAM_CLOSE);
        let _ = self.out.flush();
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

/// Escape text for inclusion in XML character data or attributes
pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

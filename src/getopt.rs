// src/getopt.rs

//! Table-driven command line option parser
//!
//! One parser serves both the global options and every command's own
//! options. Tables are plain slices of [`OptionSpec`], so a command table is
//! a `const` next to the command's help text.
//!
//! Parsing does not fail on unknown options. They are collected under the
//! reserved [`UNKNOWN`] key and the caller decides what to do; only a
//! missing value for a required-argument option is an error.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Reserved key collecting options missing from the table
pub const UNKNOWN: &str = "_unknown";

/// Whether an option takes a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Required,
    /// Value only in attached form: `--opt=value` or `-ovalue`
    Optional,
}

/// One entry of an option table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub long: &'static str,
    pub short: Option<char>,
    pub arity: Arity,
}

impl OptionSpec {
    pub const fn flag(long: &'static str, short: Option<char>) -> Self {
        Self {
            long,
            short,
            arity: Arity::None,
        }
    }

    pub const fn required(long: &'static str, short: Option<char>) -> Self {
        Self {
            long,
            short,
            arity: Arity::Required,
        }
    }

    pub const fn optional(long: &'static str, short: Option<char>) -> Self {
        Self {
            long,
            short,
            arity: Arity::Optional,
        }
    }
}

/// How non-option tokens are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop at the first non-option token (global options before the command)
    StopAtPositional,
    /// Keep scanning; non-option tokens are collected as positionals
    Permute,
}

/// Result of parsing an argument vector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    values: BTreeMap<String, Vec<String>>,
    positionals: Vec<String>,
    cursor: usize,
}

impl ParsedOptions {
    /// True if the option was given at least once
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of times the option was given
    pub fn count(&self, name: &str) -> usize {
        self.values.get(name).map_or(0, Vec::len)
    }

    /// All values of an option, in command line order
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map_or(&[], Vec::as_slice)
    }

    /// First value of an option
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    pub fn has_unknown(&self) -> bool {
        self.contains(UNKNOWN)
    }

    /// Unknown option tokens as typed by the user
    pub fn unknown(&self) -> &[String] {
        self.values(UNKNOWN)
    }

    /// Non-option arguments
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Index of the first argument not consumed as an option
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.positionals.is_empty()
    }

    /// Option names that were given, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn push(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_string())
            .or_default()
            .push(value.into());
    }
}

fn find_long<'a>(table: &'a [OptionSpec], name: &str) -> Option<&'a OptionSpec> {
    table.iter().find(|spec| spec.long == name)
}

fn find_short(table: &[OptionSpec], c: char) -> Option<&OptionSpec> {
    table.iter().find(|spec| spec.short == Some(c))
}

/// Parse `args` against `table`
///
/// `args` must not contain the program or command name. The returned
/// cursor is relative to `args`.
pub fn parse_options(args: &[String], table: &[OptionSpec], mode: ScanMode) -> Result<ParsedOptions> {
    let mut parsed = ParsedOptions::default();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();

        if arg == "--" {
            i += 1;
            parsed.positionals.extend(args[i..].iter().cloned());
            i = args.len();
            break;
        }

        if let Some(body) = arg.strip_prefix("--") {
            let (name, attached) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };

            match find_long(table, name) {
                None => parsed.push(UNKNOWN, arg),
                Some(spec) => match spec.arity {
                    Arity::None if attached.is_some() => parsed.push(UNKNOWN, arg),
                    Arity::None => parsed.push(spec.long, ""),
                    Arity::Optional => parsed.push(spec.long, attached.unwrap_or("")),
                    Arity::Required => {
                        let value = match attached {
                            Some(value) => value.to_string(),
                            None => {
                                i += 1;
                                args.get(i)
                                    .cloned()
                                    .ok_or_else(|| Error::MissingArgument(format!("--{}", spec.long)))?
                            }
                        };
                        parsed.push(spec.long, value);
                    }
                },
            }
            i += 1;
            continue;
        }

        if arg.len() > 1 && arg.starts_with('-') {
            let cluster = &arg[1..];
            for (pos, c) in cluster.char_indices() {
                let Some(spec) = find_short(table, c) else {
                    parsed.push(UNKNOWN, format!("-{c}"));
                    continue;
                };
                let rest = &cluster[pos + c.len_utf8()..];
                match spec.arity {
                    Arity::None => parsed.push(spec.long, ""),
                    Arity::Optional => {
                        parsed.push(spec.long, rest);
                        break;
                    }
                    Arity::Required => {
                        if !rest.is_empty() {
                            parsed.push(spec.long, rest);
                        } else {
                            i += 1;
                            let value = args
                                .get(i)
                                .cloned()
                                .ok_or_else(|| Error::MissingArgument(format!("-{c}")))?;
                            parsed.push(spec.long, value);
                        }
                        break;
                    }
                }
            }
            i += 1;
            continue;
        }

        match mode {
            ScanMode::StopAtPositional => break,
            ScanMode::Permute => {
                parsed.positionals.push(arg.to_string());
                i += 1;
            }
        }
    }

    if mode == ScanMode::StopAtPositional && i < args.len() {
        parsed.positionals.extend(args[i..].iter().cloned());
    }
    parsed.cursor = match mode {
        ScanMode::StopAtPositional => i,
        ScanMode::Permute => args.len(),
    };

    Ok(parsed)
}

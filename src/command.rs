// src/command.rs

//! Canonical commands and the alias registry
//!
//! Every command the user can type maps to exactly one [`Command`]. Aliases
//! are exact, case-sensitive strings; there is no prefix or fuzzy matching.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Canonical command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Command {
    Install,
    Remove,
    SrcInstall,
    AddRepo,
    ListRepos,
    RemoveRepo,
    RenameRepo,
    ModifyRepo,
    Refresh,
    PatchCheck,
    ShowPatches,
    ListUpdates,
    XmlListUpdatesPatches,
    Update,
    DistUpgrade,
    Search,
    Info,
    RugPatchInfo,
    RugPatternInfo,
    RugProductInfo,
    Moo,
    Shell,
    ShellQuit,
    Help,
    /// No command given
    #[default]
    None,
}

impl Command {
    /// Every command except [`Command::None`]
    pub const ALL: [Command; 24] = [
        Command::Install,
        Command::Remove,
        Command::SrcInstall,
        Command::AddRepo,
        Command::ListRepos,
        Command::RemoveRepo,
        Command::RenameRepo,
        Command::ModifyRepo,
        Command::Refresh,
        Command::PatchCheck,
        Command::ShowPatches,
        Command::ListUpdates,
        Command::XmlListUpdatesPatches,
        Command::Update,
        Command::DistUpgrade,
        Command::Search,
        Command::Info,
        Command::RugPatchInfo,
        Command::RugPatternInfo,
        Command::RugProductInfo,
        Command::Moo,
        Command::Shell,
        Command::ShellQuit,
        Command::Help,
    ];

    /// Accepted spellings; the first one is the canonical name
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Command::Install => &["install", "in"],
            Command::Remove => &["remove", "rm"],
            Command::SrcInstall => &["source-install", "si"],
            Command::AddRepo => &["addrepo", "ar", "service-add", "sa"],
            Command::ListRepos => &["repos", "lr", "catalogs", "ca", "service-list", "sl"],
            Command::RemoveRepo => &["removerepo", "rr", "service-delete", "sd"],
            Command::RenameRepo => &["renamerepo", "nr", "service-rename", "sr"],
            Command::ModifyRepo => &["modifyrepo", "mr", "service-modify", "sm"],
            Command::Refresh => &["refresh", "ref"],
            Command::PatchCheck => &["patch-check", "pchk"],
            Command::ShowPatches => &["patches", "pch"],
            Command::ListUpdates => &["list-updates", "lu"],
            Command::XmlListUpdatesPatches => &["xml-updates", "xu"],
            Command::Update => &["update", "up"],
            Command::DistUpgrade => &["dist-upgrade", "dup"],
            Command::Search => &["search", "se"],
            Command::Info => &["info", "if"],
            Command::RugPatchInfo => &["patch-info"],
            Command::RugPatternInfo => &["pattern-info"],
            Command::RugProductInfo => &["product-info"],
            Command::Moo => &["moo"],
            Command::Shell => &["shell", "sh"],
            Command::ShellQuit => &["quit", "exit", "\u{4}"],
            Command::Help => &["help", "?"],
            Command::None => &[],
        }
    }

    pub fn name(self) -> &'static str {
        self.aliases().first().copied().unwrap_or("")
    }

    /// Commands that manage repositories themselves; `--plus-repo` is a no-op for them
    pub fn manages_repos(self) -> bool {
        matches!(
            self,
            Command::AddRepo
                | Command::RemoveRepo
                | Command::ModifyRepo
                | Command::RenameRepo
                | Command::Refresh
        )
    }

    /// Commands that leave a selection in the resource manager's pool
    pub fn marks_selections(self) -> bool {
        matches!(self, Command::Install | Command::Remove)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::None => write!(f, "none"),
            cmd => write!(f, "{}", cmd.name()),
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CommandRegistry::builtin().resolve(s)
    }
}

/// Alias to command lookup table
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    aliases: HashMap<&'static str, Command>,
}

impl CommandRegistry {
    /// Registry of all built-in commands and their aliases
    pub fn builtin() -> Self {
        let mut aliases = HashMap::new();
        for cmd in Command::ALL {
            for alias in cmd.aliases() {
                let previous = aliases.insert(*alias, cmd);
                debug_assert!(previous.is_none(), "alias '{alias}' registered twice");
            }
        }
        Self { aliases }
    }

    /// Resolve a typed token to its command
    ///
    /// The empty token means no command was supplied and yields
    /// [`Command::None`]. Any other unregistered token is an error.
    pub fn resolve(&self, token: &str) -> Result<Command> {
        if token.is_empty() {
            return Ok(Command::None);
        }
        self.aliases
            .get(token)
            .copied()
            .ok_or_else(|| Error::UnknownCommand(token.to_string()))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

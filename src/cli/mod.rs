// src/cli/mod.rs
//! Command line definitions for zypper
//!
//! This module holds the declarative side of the command line: the global
//! option table, the main usage text, and one [`CommandDescriptor`] per
//! command. The handlers themselves live in the `commands` module.
//!
//! Option tables and help texts are grouped the way the usage lists them:
//! - `package` - install, remove, source-install, update, dist-upgrade
//! - `repo` - addrepo, repos, removerepo, renamerepo, modifyrepo, refresh
//! - `query` - search, info, patches, updates
//! - `shell` - shell, quit, help, moo

mod package;
mod query;
mod repo;
mod shell;

use crate::command::Command;
use crate::commands;
use crate::error::Flow;
use crate::getopt::OptionSpec;
use crate::session::Session;

/// Command body; runs with the lock held if the descriptor asks for it
pub type Handler = fn(&mut Session) -> Flow;

/// Everything the dispatcher needs to know about one command
pub struct CommandDescriptor {
    pub command: Command,
    pub options: &'static [OptionSpec],
    pub help: &'static str,
    /// Message printed when a non-root user runs this command; `None` if
    /// the command needs no privileges
    pub privilege: Option<&'static str>,
    /// Take the package management lock before running the handler
    pub needs_lock: bool,
    pub handler: Handler,
}

const REPO_PRIVILEGES: &str = "Root privileges are required for modifying system repositories.";
const PACKAGE_PRIVILEGES: &str = "Root privileges are required for installing or uninstalling packages.";

/// Options accepted before the command word
pub const GLOBAL_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag("help", Some('h')),
    OptionSpec::flag("verbose", Some('v')),
    OptionSpec::flag("quiet", Some('q')),
    OptionSpec::flag("version", Some('V')),
    OptionSpec::flag("terse", Some('t')),
    OptionSpec::required("table-style", Some('s')),
    OptionSpec::flag("rug-compatible", Some('r')),
    OptionSpec::flag("non-interactive", Some('n')),
    OptionSpec::flag("no-gpg-checks", None),
    OptionSpec::required("root", Some('R')),
    OptionSpec::required("reposd-dir", Some('D')),
    OptionSpec::required("cache-dir", Some('C')),
    OptionSpec::required("raw-cache-dir", None),
    OptionSpec::optional("opt", Some('o')),
    // target options
    OptionSpec::flag("disable-system-resolvables", None),
    // repository options
    OptionSpec::required("plus-repo", Some('p')),
    OptionSpec::flag("disable-repositories", None),
    OptionSpec::flag("no-refresh", None),
];

pub const MAIN_HELP: &str = "\
  Usage:
\tzypper [--global-options] <command> [--command-options] [arguments]

  Global Options:
\t--help, -h\t\tHelp.
\t--version, -V\t\tOutput the version number.
\t--quiet, -q\t\tSuppress normal output, print only error messages.
\t--verbose, -v\t\tIncrease verbosity.
\t--terse, -t\t\tTerse output for machine consumption.
\t--table-style, -s\tTable style (integer).
\t--rug-compatible, -r\tTurn on rug compatibility.
\t--non-interactive, -n\tDon't ask anything, use default answers automatically.
\t--reposd-dir, -D <dir>\tUse alternative repository definition files directory.
\t--cache-dir, -C <dir>\tUse alternative meta-data cache database directory.
\t--raw-cache-dir <dir>\tUse alternative raw meta-data cache directory.

\tRepository Options:
\t--no-gpg-checks\t\tIgnore GPG check failures and continue.
\t--plus-repo, -p <URI>\tUse an additional repository.
\t--disable-repositories\tDo not read meta-data from repositories.
\t--no-refresh\t\tDo not refresh the repositories.

\tTarget Options:
\t--root, -R <dir>\tOperate on a different root directory.
\t--disable-system-resolvables  Do not read installed resolvables.

  Commands:
\thelp, ?\t\t\tHelp
\tshell, sh\t\tAccept multiple commands at once
\tinstall, in\t\tInstall packages or resolvables
\tremove, rm\t\tRemove packages or resolvables
\tsearch, se\t\tSearch for packages matching a pattern
\trepos, lr\t\tList all defined repositories.
\taddrepo, ar\t\tAdd a new repository
\tremoverepo, rr\t\tRemove specified repository
\trenamerepo, nr\t\tRename specified repository
\tmodifyrepo, mr\t\tModify specified repository
\trefresh, ref\t\tRefresh all repositories
\tpatch-check, pchk\tCheck for patches
\tpatches, pch\t\tList patches
\tlist-updates, lu\tList updates
\txml-updates, xu\t\tList updates and patches in xml format
\tupdate, up\t\tUpdate installed resolvables with newer versions.
\tdist-upgrade, dup\tPerform a distribution upgrade
\tinfo, if\t\tShow full information for packages
\tpatch-info\t\tShow full information for patches
\tsource-install, si\tInstall a source package
";

static DESCRIPTORS: &[CommandDescriptor] = &[
    CommandDescriptor {
        command: Command::Install,
        options: package::INSTALL_OPTIONS,
        help: package::INSTALL_HELP,
        privilege: Some(PACKAGE_PRIVILEGES),
        needs_lock: true,
        handler: commands::cmd_install,
    },
    CommandDescriptor {
        command: Command::Remove,
        options: package::REMOVE_OPTIONS,
        help: package::REMOVE_HELP,
        privilege: Some(PACKAGE_PRIVILEGES),
        needs_lock: true,
        handler: commands::cmd_remove,
    },
    CommandDescriptor {
        command: Command::SrcInstall,
        options: package::SRC_INSTALL_OPTIONS,
        help: package::SRC_INSTALL_HELP,
        privilege: Some("Root privileges are required for installing source packages."),
        needs_lock: true,
        handler: commands::cmd_source_install,
    },
    CommandDescriptor {
        command: Command::AddRepo,
        options: repo::ADDREPO_OPTIONS,
        help: repo::ADDREPO_HELP,
        privilege: Some(REPO_PRIVILEGES),
        needs_lock: true,
        handler: commands::cmd_addrepo,
    },
    CommandDescriptor {
        command: Command::ListRepos,
        options: repo::REPOS_OPTIONS,
        help: repo::REPOS_HELP,
        privilege: None,
        // read-only; listing works while another process holds the lock
        needs_lock: false,
        handler: commands::cmd_repos,
    },
    CommandDescriptor {
        command: Command::RemoveRepo,
        options: repo::REMOVEREPO_OPTIONS,
        help: repo::REMOVEREPO_HELP,
        privilege: Some(REPO_PRIVILEGES),
        needs_lock: true,
        handler: commands::cmd_removerepo,
    },
    CommandDescriptor {
        command: Command::RenameRepo,
        options: repo::RENAMEREPO_OPTIONS,
        help: repo::RENAMEREPO_HELP,
        privilege: Some(REPO_PRIVILEGES),
        needs_lock: true,
        handler: commands::cmd_renamerepo,
    },
    CommandDescriptor {
        command: Command::ModifyRepo,
        options: repo::MODIFYREPO_OPTIONS,
        help: repo::MODIFYREPO_HELP,
        privilege: Some(REPO_PRIVILEGES),
        needs_lock: true,
        handler: commands::cmd_modifyrepo,
    },
    CommandDescriptor {
        command: Command::Refresh,
        options: repo::REFRESH_OPTIONS,
        help: repo::REFRESH_HELP,
        privilege: Some("Root privileges are required for refreshing system repositories."),
        needs_lock: true,
        handler: commands::cmd_refresh,
    },
    CommandDescriptor {
        command: Command::PatchCheck,
        options: query::PATCH_CHECK_OPTIONS,
        help: query::PATCH_CHECK_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_patch_check,
    },
    CommandDescriptor {
        command: Command::ShowPatches,
        options: query::PATCHES_OPTIONS,
        help: query::PATCHES_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_patches,
    },
    CommandDescriptor {
        command: Command::ListUpdates,
        options: query::LIST_UPDATES_OPTIONS,
        help: query::LIST_UPDATES_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_list_updates,
    },
    CommandDescriptor {
        command: Command::XmlListUpdatesPatches,
        options: query::XML_UPDATES_OPTIONS,
        help: query::XML_UPDATES_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_xml_updates,
    },
    CommandDescriptor {
        command: Command::Update,
        options: package::UPDATE_OPTIONS,
        help: package::UPDATE_HELP,
        privilege: Some("Root privileges are required for updating packages."),
        needs_lock: true,
        handler: commands::cmd_update,
    },
    CommandDescriptor {
        command: Command::DistUpgrade,
        options: package::DIST_UPGRADE_OPTIONS,
        help: package::DIST_UPGRADE_HELP,
        privilege: Some("Root privileges are required for performing a distribution upgrade."),
        needs_lock: true,
        handler: commands::cmd_dist_upgrade,
    },
    CommandDescriptor {
        command: Command::Search,
        options: query::SEARCH_OPTIONS,
        help: query::SEARCH_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_search,
    },
    CommandDescriptor {
        command: Command::Info,
        options: query::INFO_OPTIONS,
        help: query::INFO_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_info,
    },
    CommandDescriptor {
        command: Command::RugPatchInfo,
        options: query::RUG_INFO_OPTIONS,
        help: query::PATCH_INFO_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_info,
    },
    CommandDescriptor {
        command: Command::RugPatternInfo,
        options: query::RUG_INFO_OPTIONS,
        help: query::PATTERN_INFO_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_info,
    },
    CommandDescriptor {
        command: Command::RugProductInfo,
        options: query::RUG_INFO_OPTIONS,
        help: query::PRODUCT_INFO_HELP,
        privilege: None,
        needs_lock: true,
        handler: commands::cmd_info,
    },
    CommandDescriptor {
        command: Command::Moo,
        options: shell::HELP_ONLY,
        help: shell::MOO_HELP,
        privilege: None,
        needs_lock: false,
        handler: commands::cmd_moo,
    },
    CommandDescriptor {
        command: Command::Shell,
        options: shell::HELP_ONLY,
        help: shell::SHELL_HELP,
        privilege: None,
        needs_lock: false,
        handler: commands::cmd_shell,
    },
    CommandDescriptor {
        command: Command::ShellQuit,
        options: shell::HELP_ONLY,
        help: shell::QUIT_HELP,
        privilege: None,
        needs_lock: false,
        handler: commands::cmd_quit,
    },
    CommandDescriptor {
        command: Command::Help,
        options: shell::HELP_ONLY,
        help: shell::HELP_HELP,
        privilege: None,
        needs_lock: false,
        handler: commands::cmd_help,
    },
];

/// Descriptor of `command`; `None` only for [`Command::None`]
pub fn descriptor(command: Command) -> Option<&'static CommandDescriptor> {
    DESCRIPTORS.iter().find(|d| d.command == command)
}

/// "Type 'zypper help' ..." line, phrased for the shell or the OS command line
pub fn unknown_command_hint(in_shell: bool) -> String {
    format!(
        "Type '{}' to get a list of global options and commands.",
        if in_shell { "help" } else { "zypper help" }
    )
}

pub fn command_help_hint(in_shell: bool) -> String {
    format!(
        "Type '{}' to get a command-specific help.",
        if in_shell { "help <command>" } else { "zypper help <command>" }
    )
}

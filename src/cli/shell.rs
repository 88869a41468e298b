// src/cli/shell.rs
//! Options and help for shell and miscellaneous commands

use crate::getopt::OptionSpec;

pub const HELP_ONLY: &[OptionSpec] = &[OptionSpec::flag("help", Some('h'))];

pub const MOO_HELP: &str = "\
moo

Show an animal

This command has no additional options.
";

pub const SHELL_HELP: &str = "\
shell (sh)

Enter the zypper command shell.

This command has no additional options.
";

pub const QUIT_HELP: &str = "\
quit (exit, ^D)

Quit the current zypper shell.

This command has no additional options.
";

pub const HELP_HELP: &str = "\
help (?) [command]

Print help for a command, or the list of global options and commands.
";

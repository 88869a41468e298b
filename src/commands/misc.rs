// src/commands/misc.rs
//! Shell-only and miscellaneous commands

use crate::error::Flow;
use crate::session::Session;

const HEDGEHOG: [&str; 3] = [r"   \\\\\", r"  \\\\\\\__o", r"__\\\\\\\'/_"];

/// Show an animal
pub fn cmd_moo(s: &mut Session) -> Flow {
    for line in HEDGEHOG {
        s.console.normal(line);
    }
    Ok(())
}

/// `shell` reaches a handler only when typed inside the shell
pub fn cmd_shell(s: &mut Session) -> Flow {
    if s.running_shell {
        s.console.err("You already are running zypper's shell.");
    } else {
        s.console.err("Unexpected program flow.");
    }
    Ok(())
}

/// Outside the shell there is nothing to quit
pub fn cmd_quit(s: &mut Session) -> Flow {
    if s.running_shell {
        s.console.err("oops, you wanted to quit, didn't you?");
    } else {
        s.console
            .err("This command only makes sense in the zypper shell.");
    }
    Ok(())
}

pub fn cmd_help(s: &mut Session) -> Flow {
    s.print_main_help();
    Ok(())
}

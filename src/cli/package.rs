// src/cli/package.rs
//! Options and help for the commands that change installed packages

use crate::getopt::OptionSpec;

pub const INSTALL_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    // rug compatibility, we have --repo
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::required("type", Some('t')),
    // the default, accepted and ignored
    OptionSpec::flag("name", Some('n')),
    OptionSpec::flag("force", Some('f')),
    OptionSpec::flag("capability", Some('C')),
    // rug compatibility, we have global --non-interactive
    OptionSpec::flag("no-confirm", Some('y')),
    OptionSpec::flag("auto-agree-with-licenses", Some('l')),
    // rug compatibility, we have --auto-agree-with-licenses
    OptionSpec::flag("agree-to-third-party-licenses", None),
    OptionSpec::flag("debug-solver", None),
    OptionSpec::required("force-resolution", Some('R')),
    OptionSpec::flag("dry-run", Some('D')),
    OptionSpec::flag("help", Some('h')),
];

pub const INSTALL_HELP: &str = "\
install (in) [options] <capability|rpm_file_uri> ...

Install resolvables with specified capabilities or RPM files with specified
location. A capability is NAME[OP<VERSION>], where OP is one of <, <=, =, >=, >.

  Command options:
-r, --repo <alias|#|URI>        Install resolvables only from the repository specified by alias.
-t, --type <type>               Type of resolvable (package, patch, pattern, product)
                                Default: package
-n, --name                      Select resolvables by plain name, not by capability
-C, --capability                Select resolvables by capability
-f, --force                     Install even if the item is already installed (reinstall)
-l, --auto-agree-with-licenses  Automatically say 'yes' to third party license confirmation prompt.
                                See 'man zypper' for more details.
    --debug-solver              Create solver test case for debugging
-R, --force-resolution <on|off> Force the solver to find a solution (even an aggressive one)
-D, --dry-run                   Test the installation, do not actually install
";

pub const REMOVE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::required("type", Some('t')),
    OptionSpec::flag("name", Some('n')),
    OptionSpec::flag("capability", Some('C')),
    OptionSpec::flag("no-confirm", Some('y')),
    OptionSpec::flag("debug-solver", None),
    OptionSpec::required("force-resolution", Some('R')),
    OptionSpec::flag("dry-run", Some('D')),
    OptionSpec::flag("help", Some('h')),
];

pub const REMOVE_HELP: &str = "\
remove (rm) [options] <capability> ...

Remove resolvables with specified capabilities. A capability is
NAME[OP<VERSION>], where OP is one of <, <=, =, >=, >.

  Command options:
-r, --repo <alias|#|URI>        Operate only with resolvables from the repository specified by alias.
-t, --type <type>               Type of resolvable (package, patch, pattern, product)
                                Default: package
-n, --name                      Select resolvables by plain name, not by capability
-C, --capability                Select resolvables by capability
    --debug-solver              Create solver test case for debugging
-R, --force-resolution <on|off> Force the solver to find a solution (even an aggressive one)
-D, --dry-run                   Test the removal, do not actually remove
";

pub const SRC_INSTALL_OPTIONS: &[OptionSpec] = &[OptionSpec::flag("help", Some('h'))];

pub const SRC_INSTALL_HELP: &str = "\
source-install (si) <name> ...

Install source packages specified by their names.

This command has no additional options.
";

pub const UPDATE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    OptionSpec::required("catalog", Some('c')),
    OptionSpec::required("type", Some('t')),
    // rug used it only to answer the 'continue with install?' prompt
    OptionSpec::flag("no-confirm", Some('y')),
    OptionSpec::flag("skip-interactive", None),
    OptionSpec::flag("auto-agree-with-licenses", Some('l')),
    OptionSpec::flag("agree-to-third-party-licenses", None),
    OptionSpec::flag("best-effort", None),
    OptionSpec::flag("debug-solver", None),
    OptionSpec::required("force-resolution", Some('R')),
    OptionSpec::flag("dry-run", Some('D')),
    OptionSpec::flag("help", Some('h')),
];

pub const UPDATE_HELP: &str = "\
update (up) [options]

Update all installed resolvables with newer versions, where applicable.

  Command options:

-t, --type <type>               Type of resolvable (package, patch, pattern, product)
                                Default: patch
-r, --repo <alias|#|URI>        Limit updates to the repository specified by the alias.
    --skip-interactive          Skip interactive updates
-l, --auto-agree-with-licenses  Automatically say 'yes' to third party license confirmation prompt.
                                See man zypper for more details.
    --best-effort               Do a 'best effort' approach to update, updates to a lower than
                                latest-and-greatest version are also acceptable
    --debug-solver              Create solver test case for debugging
-R, --force-resolution <on|off> Force the solver to find a solution (even an aggressive one)
-D, --dry-run                   Test the update, do not actually update
";

pub const DIST_UPGRADE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("repo", Some('r')),
    OptionSpec::flag("auto-agree-with-licenses", Some('l')),
    OptionSpec::flag("debug-solver", None),
    OptionSpec::flag("dry-run", Some('D')),
    OptionSpec::flag("help", Some('h')),
];

pub const DIST_UPGRADE_HELP: &str = "\
dist-upgrade (dup) [options]

Perform a distribution upgrade.

  Command options:

-r, --repo <alias|#|URI>        Limit the upgrade to the repository specified by the alias.
-l, --auto-agree-with-licenses  Automatically say 'yes' to third party license confirmation prompt.
                                See man zypper for more details.
    --debug-solver              Create solver test case for debugging
-D, --dry-run                   Test the upgrade, do not actually upgrade
";

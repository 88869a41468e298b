// src/cli/repo.rs
//! Options and help for repository management commands

use crate::getopt::OptionSpec;

pub const ADDREPO_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("type", Some('t')),
    OptionSpec::flag("disabled", Some('d')),
    OptionSpec::flag("no-refresh", Some('n')),
    OptionSpec::required("repo", Some('r')),
    OptionSpec::flag("help", Some('h')),
];

pub const ADDREPO_HELP: &str = "\
addrepo (ar) [options] <URI> <alias>

Add repository specified by URI to the system and assign the specified alias to it.

  Command options:
-r, --repo <FILE.repo>  Read the URL and alias from a file
-t, --type <TYPE>       Type of repository (yast2, rpm-md, plaindir)
-d, --disabled          Add the repository as disabled
-n, --no-refresh        Add the repository with auto-refresh disabled
";

pub const REPOS_OPTIONS: &[OptionSpec] = &[
    OptionSpec::required("export", Some('e')),
    OptionSpec::flag("help", Some('h')),
];

pub const REPOS_HELP: &str = "\
repos (lr)

List all defined repositories.

  Command options:
-e, --export <FILE.repo>  Export all defined repositories as a single local .repo file
";

pub const REMOVEREPO_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag("help", Some('h')),
    OptionSpec::flag("loose-auth", None),
    OptionSpec::flag("loose-query", None),
];

pub const REMOVEREPO_HELP: &str = "\
removerepo (rr) [options] <alias|URL>

Remove repository specified by alias or URL.

  Command options:
    --loose-auth   Ignore user authentication data in the URL
    --loose-query  Ignore query string in the URL
";

pub const RENAMEREPO_OPTIONS: &[OptionSpec] = &[OptionSpec::flag("help", Some('h'))];

pub const RENAMEREPO_HELP: &str = "\
renamerepo (nr) [options] <alias> <new-alias>

Assign new alias to the repository specified by alias.

This command has no additional options.
";

pub const MODIFYREPO_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag("help", Some('h')),
    OptionSpec::flag("disable", Some('d')),
    OptionSpec::flag("enable", Some('e')),
    OptionSpec::flag("enable-autorefresh", Some('a')),
    OptionSpec::flag("disable-autorefresh", None),
];

pub const MODIFYREPO_HELP: &str = "\
modifyrepo (mr) <options> <alias>

Modify properties of the repository specified by alias.

  Command options:
-d, --disable              Disable the repository (but don't remove it)
-e, --enable               Enable a disabled repository
-a, --enable-autorefresh   Enable auto-refresh of the repository
    --disable-autorefresh  Disable auto-refresh of the repository
";

pub const REFRESH_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag("force", Some('f')),
    OptionSpec::flag("force-build", Some('b')),
    OptionSpec::flag("force-download", Some('d')),
    OptionSpec::flag("build-only", Some('B')),
    OptionSpec::flag("download-only", Some('D')),
    OptionSpec::required("repo", Some('r')),
    OptionSpec::flag("help", Some('h')),
];

pub const REFRESH_HELP: &str = "\
refresh (ref) [alias|#] ...

Refresh repositories specified by their alias or number. If none are
specified, all enabled repositories will be refreshed.

  Command options:
-f, --force              Force a complete refresh
-b, --force-build        Force rebuild of the database
-d, --force-download     Force download of raw metadata
-B, --build-only         Only build the database, don't download metadata.
-D, --download-only      Only download raw metadata, don't build the database
-r, --repo <alias|#|URI> Refresh only specified repositories.
";

// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Command argument: resolvable type
fn type_arg() -> Arg {
    Arg::new("type")
        .short('t')
        .long("type")
        .value_name("TYPE")
        .default_value("package")
        .help("Type of resolvable (package, patch, pattern, product)")
}

fn flag(id: &'static str, short: Option<char>, help: &'static str) -> Arg {
    let arg = Arg::new(id).long(id).action(ArgAction::SetTrue).help(help);
    match short {
        Some(c) => arg.short(c),
        None => arg,
    }
}

fn commit_args(cmd: Command) -> Command {
    cmd.arg(type_arg())
        .arg(flag("no-confirm", Some('y'), "Don't require user confirmation"))
        .arg(flag(
            "auto-agree-with-licenses",
            Some('l'),
            "Automatically say 'yes' to third party license confirmation prompt",
        ))
        .arg(flag("debug-solver", None, "Create solver test case for debugging"))
        .arg(flag(
            "dry-run",
            None,
            "Test the transaction, do not actually commit",
        ))
}

fn build_cli() -> Command {
    Command::new("zypper")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Zypper Contributors")
        .about("Command line package manager")
        .subcommand_required(false)
        .arg(flag("verbose", Some('v'), "Increase verbosity").action(ArgAction::Count))
        .arg(flag("quiet", Some('q'), "Suppress normal output, print only error messages"))
        .arg(flag("terse", Some('t'), "Terse output for machine consumption"))
        .arg(
            Arg::new("table-style")
                .short('s')
                .long("table-style")
                .value_name("STYLE")
                .help("Table style (integer)"),
        )
        .arg(flag("rug-compatible", Some('r'), "Turn on rug compatibility"))
        .arg(flag(
            "non-interactive",
            Some('n'),
            "Don't ask anything, use default answers automatically",
        ))
        .arg(flag("no-gpg-checks", None, "Ignore GPG check failures and continue"))
        .arg(
            Arg::new("root")
                .short('R')
                .long("root")
                .value_name("DIR")
                .help("Operate on a different root directory"),
        )
        .arg(
            Arg::new("reposd-dir")
                .short('D')
                .long("reposd-dir")
                .value_name("DIR")
                .help("Use alternative repository definition files directory"),
        )
        .arg(
            Arg::new("cache-dir")
                .short('C')
                .long("cache-dir")
                .value_name("DIR")
                .help("Use alternative meta-data cache database directory"),
        )
        .arg(
            Arg::new("raw-cache-dir")
                .long("raw-cache-dir")
                .value_name("DIR")
                .help("Use alternative raw meta-data cache directory"),
        )
        .arg(
            Arg::new("plus-repo")
                .short('p')
                .long("plus-repo")
                .value_name("URI")
                .action(ArgAction::Append)
                .help("Use an additional repository"),
        )
        .arg(flag("disable-repositories", None, "Do not read meta-data from repositories"))
        .arg(flag("no-refresh", None, "Do not refresh the repositories"))
        .arg(flag(
            "disable-system-resolvables",
            None,
            "Do not read installed resolvables",
        ))
        .subcommand(Command::new("shell").visible_alias("sh").about("Accept multiple commands at once"))
        .subcommand(
            commit_args(Command::new("install").visible_alias("in"))
                .about("Install packages or resolvables")
                .arg(flag("capability", Some('C'), "Select resolvables by capability"))
                .arg(flag("force", Some('f'), "Install even if the item is already installed (reinstall)"))
                .arg(Arg::new("name").num_args(1..).required(true)),
        )
        .subcommand(
            commit_args(Command::new("remove").visible_alias("rm"))
                .about("Remove packages or resolvables")
                .arg(flag("capability", Some('C'), "Select resolvables by capability"))
                .arg(Arg::new("name").num_args(1..).required(true)),
        )
        .subcommand(
            Command::new("source-install")
                .visible_alias("si")
                .about("Install a source package")
                .arg(Arg::new("name").num_args(1..).required(true)),
        )
        .subcommand(
            Command::new("search")
                .visible_alias("se")
                .about("Search for packages matching a pattern")
                .arg(flag("installed-only", Some('i'), "Show only packages that are already installed"))
                .arg(flag("uninstalled-only", Some('u'), "Show only packages that are not currently installed"))
                .arg(flag("match-any", None, "Search for a match with any of the search strings"))
                .arg(flag("match-exact", None, "Searches for an exact package name"))
                .arg(flag("case-sensitive", None, "Perform case-sensitive search"))
                .arg(flag("sort-by-repo", None, "Sort packages by repository"))
                .arg(Arg::new("query").num_args(0..)),
        )
        .subcommand(
            Command::new("repos")
                .visible_alias("lr")
                .about("List all defined repositories")
                .arg(
                    Arg::new("export")
                        .short('e')
                        .long("export")
                        .value_name("FILE")
                        .help("Export all defined repositories as a single local .repo file"),
                ),
        )
        .subcommand(
            Command::new("addrepo")
                .visible_alias("ar")
                .about("Add a new repository")
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .value_name("TYPE")
                        .help("Type of repository (yast2, rpm-md, or plaindir)"),
                )
                .arg(flag("disabled", Some('d'), "Add the repository as disabled"))
                .arg(flag("no-refresh", Some('n'), "Add the repository with auto-refresh disabled"))
                .arg(
                    Arg::new("repo")
                        .short('r')
                        .long("repo")
                        .value_name("FILE")
                        .help("Read the repositories from a .repo file"),
                )
                .arg(Arg::new("uri"))
                .arg(Arg::new("alias")),
        )
        .subcommand(
            Command::new("removerepo")
                .visible_alias("rr")
                .about("Remove specified repository")
                .arg(flag("loose-auth", None, "Ignore user authentication data in the URI"))
                .arg(flag("loose-query", None, "Ignore query string in the URI"))
                .arg(Arg::new("repo").required(true)),
        )
        .subcommand(
            Command::new("renamerepo")
                .visible_alias("nr")
                .about("Rename specified repository")
                .arg(Arg::new("alias").required(true))
                .arg(Arg::new("new-alias").required(true)),
        )
        .subcommand(
            Command::new("modifyrepo")
                .visible_alias("mr")
                .about("Modify specified repository")
                .arg(flag("disable", Some('d'), "Disable the repository"))
                .arg(flag("enable", Some('e'), "Enable a disabled repository"))
                .arg(flag("enable-autorefresh", Some('a'), "Enable auto-refresh of the repository"))
                .arg(flag("disable-autorefresh", None, "Disable auto-refresh of the repository"))
                .arg(Arg::new("alias").required(true)),
        )
        .subcommand(
            Command::new("refresh")
                .visible_alias("ref")
                .about("Refresh all repositories")
                .arg(flag("force", Some('f'), "Force a complete refresh"))
                .arg(flag("force-build", Some('b'), "Force rebuild of the database"))
                .arg(flag("force-download", Some('d'), "Force download of raw metadata"))
                .arg(flag("build-only", Some('B'), "Only build the database, don't download metadata"))
                .arg(flag("download-only", Some('D'), "Only download raw metadata, don't build the database"))
                .arg(Arg::new("repo").num_args(0..)),
        )
        .subcommand(Command::new("patch-check").visible_alias("pchk").about("Check for patches"))
        .subcommand(Command::new("patches").visible_alias("pch").about("List patches"))
        .subcommand(
            Command::new("list-updates")
                .visible_alias("lu")
                .about("List updates")
                .arg(type_arg()),
        )
        .subcommand(
            Command::new("xml-updates")
                .visible_alias("xu")
                .about("List updates and patches in xml format"),
        )
        .subcommand(
            commit_args(Command::new("update").visible_alias("up"))
                .about("Update installed resolvables with newer versions")
                .arg(flag("skip-interactive", None, "Skip interactive updates")),
        )
        .subcommand(
            commit_args(Command::new("dist-upgrade").visible_alias("dup"))
                .about("Perform a distribution upgrade"),
        )
        .subcommand(
            Command::new("info")
                .visible_alias("if")
                .about("Show full information for packages")
                .arg(type_arg())
                .arg(Arg::new("name").num_args(1..).required(true)),
        )
        .subcommand(Command::new("moo").about("Show an animal"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli()).section("8");
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("zypper.8");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

// src/commands/mod.rs
//! Command handlers for zypper
//!
//! Each `cmd_*` function is the body of one command. By the time it runs,
//! the command options are parsed into the session, the privilege check has
//! passed and the package management lock is held if the command needs it.
//! A handler reports its outcome by setting the session exit code; it
//! returns `Err` only to stop early ([`Interrupt::Exit`]), to report a user
//! abort ([`Interrupt::Abort`]) or on an unexpected failure.

mod install;
mod misc;
mod query;
mod repo;
mod update;

pub use install::{cmd_install, cmd_remove, cmd_source_install};
pub use misc::{cmd_help, cmd_moo, cmd_quit, cmd_shell};
pub use query::{
    cmd_info, cmd_list_updates, cmd_patch_check, cmd_patches, cmd_search, cmd_xml_updates,
};
pub use repo::{
    cmd_addrepo, cmd_modifyrepo, cmd_refresh, cmd_removerepo, cmd_renamerepo, cmd_repos,
};
pub use update::{cmd_dist_upgrade, cmd_update};

use crate::edition::Capability;
use crate::error::{Flow, Interrupt};
use crate::exit_code::ExitCode;
use crate::manager::{Action, RepoInfo, Resolvable, ResolvableKind, Selection};
use crate::session::Session;
use tracing::{debug, info, warn};

/// Print "Too many arguments." and the command usage
pub(crate) fn report_too_many_arguments(s: &mut Session) {
    let help = s.command_help;
    s.console.err("Too many arguments.");
    s.console.err(help);
}

/// Print "Required argument missing." and the command usage
pub(crate) fn report_required_arg_missing(s: &mut Session) {
    let help = s.command_help;
    s.console.err("Required argument missing.");
    s.console.err("Usage:");
    s.console.err(help);
}

/// Find a repository by alias, number in the listing (from 1), or URI
pub(crate) fn find_repo<'a>(repos: &'a [RepoInfo], spec: &str) -> Option<&'a RepoInfo> {
    if let Some(repo) = repos.iter().find(|r| r.alias == spec) {
        return Some(repo);
    }
    if let Ok(number) = spec.parse::<usize>() {
        return number.checked_sub(1).and_then(|i| repos.get(i));
    }
    repos
        .iter()
        .find(|r| r.base_urls.iter().any(|u| u.as_str() == spec))
}

/// Resolvable type from `--type`, or `default`
///
/// An unknown type name sets INVALID_ARGS and stops the command.
pub(crate) fn parse_kind(s: &mut Session, default: ResolvableKind) -> Flow<ResolvableKind> {
    let Some(name) = s.copts.first("type").map(str::to_string) else {
        return Ok(default);
    };
    match name.parse() {
        Ok(kind) => Ok(kind),
        Err(e) => {
            s.console.err(e);
            s.set_exit_code(ExitCode::InvalidArgs);
            Err(Interrupt::exit("unknown resolvable type"))
        }
    }
}

/// Parse a `NAME[OP EDITION]` argument; a malformed one sets INVALID_ARGS
pub(crate) fn parse_capability(s: &mut Session, arg: &str) -> Flow<Capability> {
    match Capability::parse(arg) {
        Ok(cap) => Ok(cap),
        Err(e) => {
            s.console.err(format!("Invalid capability '{arg}': {e}"));
            s.set_exit_code(ExitCode::InvalidArgs);
            Err(Interrupt::exit("invalid capability"))
        }
    }
}

/// What a command argument selects: a plain name, or a capability with `-C`
pub(crate) fn select_by(s: &mut Session, arg: &str) -> Flow<Capability> {
    if s.copts.contains("capability") {
        parse_capability(s, arg)
    } else {
        Ok(Capability::named(arg.trim()))
    }
}

/// Apply the license and confirmation options shared by the commands that commit
pub(crate) fn apply_commit_settings(s: &mut Session) {
    if s.copts.contains("auto-agree-with-licenses") || s.copts.contains("agree-to-third-party-licenses") {
        s.cmdopts.license_auto_agree = true;
    }
    if s.copts.contains("no-confirm") {
        if !s.gopts.non_interactive {
            s.console.normal("Entering non-interactive mode.");
        }
        s.gopts.non_interactive = true;
        s.console.set_non_interactive(true);
    }
}

/// Work out the repositories this command operates on
///
/// Enabled system repositories (unless `--disable-repositories`), narrowed
/// by `--repo`/`--catalog`, plus the additional repositories of this
/// process, which are registered with the resource manager the first time
/// they are needed. Repositories with autorefresh on are refreshed unless
/// `--no-refresh` was given.
pub(crate) fn init_repos(s: &mut Session) -> Flow {
    let mut repos: Vec<RepoInfo> = if s.gopts.disable_system_sources {
        Vec::new()
    } else {
        s.manager()
            .repositories()?
            .into_iter()
            .filter(|r| !r.ephemeral)
            .collect()
    };

    let wanted: Vec<String> = s
        .copts
        .values("repo")
        .iter()
        .chain(s.copts.values("catalog"))
        .cloned()
        .collect();
    if !wanted.is_empty() {
        let mut chosen = Vec::new();
        for spec in &wanted {
            match find_repo(&repos, spec) {
                Some(repo) => chosen.push(repo.clone()),
                None => {
                    s.console
                        .err(format!("Repository '{spec}' not found by its alias, number, or URI."));
                    s.set_exit_code(ExitCode::InvalidArgs);
                    return Err(Interrupt::exit("unknown repository"));
                }
            }
        }
        repos = chosen;
    } else {
        repos.retain(|r| r.enabled);
    }

    if !s.gopts.no_refresh {
        let mut usable = Vec::with_capacity(repos.len());
        for repo in repos {
            if !repo.autorefresh {
                usable.push(repo);
                continue;
            }
            debug!("Autorefreshing {}", repo.alias);
            match s.manager().refresh_repository(&repo, Default::default()) {
                Ok(_) => usable.push(repo),
                Err(e) => {
                    warn!("Autorefresh of {} failed: {}", repo.alias, e);
                    s.console.err(format!("Repository '{}' is invalid.", repo.label()));
                    s.console.err(&e);
                    s.console.err(format!(
                        "Skipping repository '{}' because of the above error.",
                        repo.label()
                    ));
                }
            }
        }
        repos = usable;
    }

    for repo in s.data.additional_repos.clone() {
        if !s.data.registered_repos.contains(&repo.alias) {
            if let Err(e) = s.manager().add_repository(&repo) {
                warn!("Cannot use additional repository {}: {}", repo.alias, e);
                s.console.err(format!("Problem adding repository '{}':", repo.label()));
                s.console.err(&e);
                s.console.err(format!(
                    "Skipping repository '{}' because of the above error.",
                    repo.label()
                ));
                continue;
            }
            info!("Registered additional repository {} ({})", repo.alias, repo.label());
            s.data.registered_repos.push(repo.alias.clone());
        }
        repos.push(repo);
    }

    s.data.repos = repos;
    Ok(())
}

/// Fill the resource manager's pool from the initialized repositories
///
/// Installed resolvables are added when `installed` is set and the global
/// `--disable-system-resolvables` is not.
pub(crate) fn load_resolvables(s: &mut Session, installed: bool) -> Flow {
    let repos = s.data.repos.clone();
    let installed = installed && !s.gopts.disable_system_resolvables;
    for repo in &repos {
        s.console.verbose(format!("Reading repository '{}'...", repo.label()));
    }
    if installed {
        s.console.verbose("Reading installed packages...");
    }
    s.manager().load_resolvables(&repos, installed)?;
    debug!("Pool holds {} resolvables", s.manager().pool().len());
    Ok(())
}

/// Installed counterpart of `r`, if any
fn installed_version<'a>(pool: &'a [Resolvable], r: &Resolvable) -> Option<&'a Resolvable> {
    pool.iter()
        .filter(|i| i.installed && i.kind == r.kind && i.name == r.name)
        .max_by(|a, b| a.parsed_edition().cmp(&b.parsed_edition()))
}

/// Patches that are available and not installed at their edition or newer
pub(crate) fn needed_patches(pool: &[Resolvable]) -> Vec<Resolvable> {
    let mut needed: Vec<Resolvable> = pool
        .iter()
        .filter(|p| p.kind == ResolvableKind::Patch && !p.installed)
        .filter(|p| match installed_version(pool, p) {
            Some(installed) => installed.parsed_edition() < p.parsed_edition(),
            None => true,
        })
        .cloned()
        .collect();
    needed.sort_by(|a, b| a.name.cmp(&b.name).then(a.edition.cmp(&b.edition)));
    needed
}

/// Best available update for every installed resolvable of `kind`
///
/// Patches are "updates" when they are needed. Without a dependency solver
/// the best candidate is always the highest edition, so `--best-effort`
/// cannot pick anything else.
pub(crate) fn find_updates(pool: &[Resolvable], kind: ResolvableKind) -> Vec<Resolvable> {
    if kind == ResolvableKind::Patch {
        return needed_patches(pool);
    }

    let mut updates: Vec<Resolvable> = Vec::new();
    for installed in pool.iter().filter(|r| r.installed && r.kind == kind) {
        if updates.iter().any(|u| u.name == installed.name) {
            continue;
        }
        let current = installed_version(pool, installed).unwrap_or(installed).parsed_edition();
        let best = pool
            .iter()
            .filter(|r| !r.installed && r.kind == kind && r.name == installed.name)
            .filter(|r| r.parsed_edition() > current)
            .max_by(|a, b| a.parsed_edition().cmp(&b.parsed_edition()));
        if let Some(best) = best {
            updates.push(best.clone());
        }
    }
    updates.sort_by(|a, b| a.name.cmp(&b.name));
    updates
}

/// Mark the best candidate matching `cap` for installation
pub(crate) fn mark_for_install(s: &mut Session, kind: ResolvableKind, cap: &Capability, force: bool) {
    let pool = s.manager().pool().to_vec();
    let candidate = pool
        .iter()
        .filter(|r| !r.installed && r.kind == kind && cap.matches(&r.name, &r.parsed_edition()))
        .max_by(|a, b| a.parsed_edition().cmp(&b.parsed_edition()));

    let Some(candidate) = candidate else {
        s.console.err(format!("{kind} '{cap}' not found"));
        return;
    };

    if !force {
        if let Some(installed) = installed_version(&pool, candidate) {
            if installed.parsed_edition() >= candidate.parsed_edition() {
                s.console
                    .normal(format!("skipping {kind} '{}' (the newer version already installed)", cap.name));
                return;
            }
        }
    }

    debug!("Marking {} {}-{} for installation", kind, candidate.name, candidate.edition);
    s.manager().mark(Selection::install(candidate.clone()));
}

/// Mark every installed resolvable matching `cap` for removal
pub(crate) fn mark_for_remove(s: &mut Session, kind: ResolvableKind, cap: &Capability) {
    let matching: Vec<Resolvable> = s
        .manager()
        .pool()
        .iter()
        .filter(|r| r.installed && r.kind == kind && cap.matches(&r.name, &r.parsed_edition()))
        .cloned()
        .collect();

    if matching.is_empty() {
        s.console.err(format!("{kind} '{cap}' is not installed."));
        return;
    }
    for r in matching {
        debug!("Marking {} {}-{} for removal", kind, r.name, r.edition);
        s.manager().mark(Selection::remove(r));
    }
}

/// Mark the updates of `kind`; returns how many were marked
pub(crate) fn mark_updates(s: &mut Session, kind: ResolvableKind, skip_interactive: bool) -> usize {
    let updates = find_updates(s.manager().pool(), kind);
    let mut marked = 0;
    for update in updates {
        if update.interactive && skip_interactive {
            s.console
                .verbose(format!("Skipping interactive {} {}", update.kind, update.name));
            continue;
        }
        s.manager().mark(Selection::install(update));
        marked += 1;
    }
    marked
}

/// Write the solver test case instead of committing
pub(crate) fn debug_solver(s: &mut Session) -> Flow {
    let dir = s.gopts.solver_testcase_path();
    s.console.normal("Generating solver test case...");
    match s.manager().write_solver_testcase(&dir) {
        Ok(()) => s.console.normal("Solver test case generated successfully."),
        Err(e) => {
            warn!("Solver test case in {:?} failed: {}", dir, e);
            s.console.err("Error creating the solver test case.");
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
    }
    Ok(())
}

fn print_summary(s: &mut Session, selections: &[Selection]) {
    for (action, title) in [
        (Action::Install, "The following resolvables are going to be installed:"),
        (Action::Remove, "The following resolvables are going to be REMOVED:"),
    ] {
        let items: Vec<String> = selections
            .iter()
            .filter(|sel| sel.action == action)
            .map(|sel| format!("{}-{}", sel.resolvable.name, sel.resolvable.edition))
            .collect();
        if items.is_empty() {
            continue;
        }
        s.console.normal("");
        s.console.normal(title);
        s.console.normal(format!("  {}", items.join(" ")));
    }
    s.console.normal("");
}

/// Ask for the licenses of the resolvables about to be installed
fn confirm_licenses(s: &mut Session, selections: &[Selection]) -> Flow {
    for sel in selections.iter().filter(|sel| sel.action == Action::Install) {
        let Some(license) = &sel.resolvable.license else {
            continue;
        };
        let r = &sel.resolvable;
        if s.cmdopts.license_auto_agree {
            s.console
                .verbose(format!("Automatically agreeing with {} {} license.", r.kind, r.name));
            continue;
        }
        s.console.normal(format!("{} {}-{} license:", r.kind, r.name, r.edition));
        s.console.normal(license);
        if !s.console.confirm("Do you agree with the terms of the license?", false) {
            return Err(Interrupt::abort(
                "Aborting installation due to the need for license confirmation.",
            ));
        }
    }
    Ok(())
}

/// Resolve the marked selections and commit them
///
/// Maps the outcome to an exit code: a resolver or commit failure is
/// ZYPP_ERROR, a committed patch that needs a reboot or a restart of the
/// package manager is REBOOT_NEEDED or RESTART_NEEDED.
pub(crate) fn solve_and_commit(s: &mut Session) -> Flow {
    let dry_run = s.copts.contains("dry-run");

    if s.manager().selections().is_empty() {
        s.console.normal("Nothing to do.");
        return Ok(());
    }

    s.console.verbose("Resolving dependencies...");
    if let Err(e) = s.manager().resolve() {
        warn!("Resolver failed: {}", e);
        s.console.err(format!("Problem: {e}"));
        s.set_exit_code(ExitCode::ZyppError);
        return Ok(());
    }

    let selections = s.manager().selections().to_vec();
    print_summary(s, &selections);
    confirm_licenses(s, &selections)?;
    if !s.console.confirm("Continue?", true) {
        return Err(Interrupt::abort("Aborting."));
    }

    match s.manager().commit(dry_run) {
        Ok(result) => {
            info!(
                "Commit done: {} installed, {} removed",
                result.installed, result.removed
            );
            if dry_run {
                s.console.normal("Dry run finished, nothing was changed.");
            }
            if result.reboot_needed {
                s.console.normal(
                    "WARNING: One of the installed patches requires a reboot of your machine. \
                     Please do it as soon as possible.",
                );
                s.set_exit_code(ExitCode::RebootNeeded);
            } else if result.restart_needed {
                s.console.normal(
                    "WARNING: One of the installed patches affects the package manager itself, \
                     thus it requires its restart before executing any further operations.",
                );
                s.set_exit_code(ExitCode::RestartNeeded);
            }
        }
        Err(e) => {
            warn!("Commit failed: {}", e);
            s.console.err("Problem occurred during or after installation or removal of packages:");
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn repo(alias: &str, url: &str) -> RepoInfo {
        RepoInfo::new(alias, Url::parse(url).unwrap())
    }

    fn installed(kind: ResolvableKind, name: &str, edition: &str) -> Resolvable {
        let mut r = Resolvable::new(kind, name, edition);
        r.installed = true;
        r
    }

    #[test]
    fn test_find_repo_by_alias_number_and_url() {
        let repos = vec![
            repo("oss", "http://download.example.com/oss"),
            repo("update", "http://download.example.com/update"),
        ];
        assert_eq!(find_repo(&repos, "update").unwrap().alias, "update");
        assert_eq!(find_repo(&repos, "1").unwrap().alias, "oss");
        assert!(find_repo(&repos, "0").is_none());
        assert!(find_repo(&repos, "3").is_none());
        assert_eq!(
            find_repo(&repos, "http://download.example.com/update").unwrap().alias,
            "update"
        );
        assert!(find_repo(&repos, "nope").is_none());
    }

    #[test]
    fn test_needed_patches() {
        let pool = vec![
            Resolvable::new(ResolvableKind::Patch, "sec-1", "2"),
            installed(ResolvableKind::Patch, "sec-1", "1"),
            Resolvable::new(ResolvableKind::Patch, "done", "1"),
            installed(ResolvableKind::Patch, "done", "1"),
            Resolvable::new(ResolvableKind::Patch, "fresh", "1"),
            Resolvable::new(ResolvableKind::Package, "vim", "9.0-1"),
        ];
        let names: Vec<String> = needed_patches(&pool).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["fresh", "sec-1"]);
    }

    #[test]
    fn test_find_updates_picks_highest_newer_edition() {
        let pool = vec![
            installed(ResolvableKind::Package, "vim", "9.0-1"),
            Resolvable::new(ResolvableKind::Package, "vim", "9.0-3"),
            Resolvable::new(ResolvableKind::Package, "vim", "9.1-1"),
            Resolvable::new(ResolvableKind::Package, "vim", "8.2-1"),
            installed(ResolvableKind::Package, "zlib", "1.3-1"),
            Resolvable::new(ResolvableKind::Package, "zlib", "1.3-1"),
            Resolvable::new(ResolvableKind::Package, "emacs", "29-1"),
        ];
        let updates = find_updates(&pool, ResolvableKind::Package);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].name, "vim");
        assert_eq!(updates[0].edition, "9.1-1");
        assert!(find_updates(&pool, ResolvableKind::Pattern).is_empty());
    }
}

// src/commands/install.rs
//! Install, remove and source-install commands

use super::{
    apply_commit_settings, debug_solver, init_repos, load_resolvables, mark_for_install,
    mark_for_remove, parse_capability, parse_kind, select_by, solve_and_commit,
};
use crate::error::{Error, Flow, Result};
use crate::exit_code::ExitCode;
use crate::manager::{rpm_file_nevra, RepoInfo, RepoType, Resolvable, ResolvableKind, Selection};
use crate::session::Session;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use url::Url;

/// Alias of the repository holding RPM files given on the command line
pub const RPM_CACHE_ALIAS: &str = "_tmpRPMcache_";

/// Copy an RPM file argument into the RPM cache
///
/// Returns the capability (`name = version-release`) that selects the
/// package from the cache repository.
fn cache_rpm_file(s: &Session, arg: &str) -> Result<String> {
    let source = match Url::parse(arg) {
        Ok(url) if url.scheme() == "file" || url.scheme() == "dir" => PathBuf::from(url.path()),
        Ok(url) => {
            return Err(Error::other(format!(
                "cannot download from '{}': unsupported URI scheme '{}'",
                arg,
                url.scheme()
            )));
        }
        Err(_) => PathBuf::from(arg),
    };

    let file_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::other(format!("'{arg}' does not name a file")))?
        .to_string();
    let (name, edition, _arch) = rpm_file_nevra(&file_name).ok_or_else(|| {
        Error::other(format!("'{file_name}' is not a name-version-release.arch.rpm file"))
    })?;

    let cache = s.gopts.rpm_cache_dir();
    fs::create_dir_all(&cache)?;
    fs::copy(&source, cache.join(&file_name))?;
    debug!("Cached {:?} in {:?}", source, cache);

    Ok(format!("{name} = {edition}"))
}

/// Add the RPM cache as an additional repository, once per process
fn add_rpm_cache_repo(s: &mut Session) -> Result<()> {
    if s.data.additional_repos.iter().any(|r| r.alias == RPM_CACHE_ALIAS) {
        return Ok(());
    }
    let dir = s.gopts.rpm_cache_dir();
    let uri = format!("dir://{}", dir.display());
    let url = Url::parse(&uri).map_err(|e| Error::InvalidUrl {
        url: uri.clone(),
        reason: e.to_string(),
    })?;

    let mut repo = RepoInfo::new(RPM_CACHE_ALIAS, url);
    repo.name = "RPM files cache".to_string();
    repo.repo_type = RepoType::PlainDir;
    repo.autorefresh = false;
    repo.ephemeral = true;
    s.data.additional_repos.push(repo);
    Ok(())
}

/// Install resolvables by name, capability or RPM file
pub fn cmd_install(s: &mut Session) -> Flow {
    if s.arguments.is_empty() {
        let help = s.command_help;
        s.console.err("Too few arguments. At least one package name is required.");
        s.console.err(help);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    info!("Installing {}", s.arguments.join(" "));

    apply_commit_settings(s);
    let kind = parse_kind(s, ResolvableKind::Package)?;

    let mut wanted = Vec::new();
    let mut rpm_files = false;
    for arg in s.arguments.clone() {
        if !arg.ends_with(".rpm") {
            wanted.push(select_by(s, &arg)?);
            continue;
        }
        s.console
            .verbose(format!("'{arg}' looks like an RPM file. Will try to download it."));
        match cache_rpm_file(s, &arg) {
            Ok(cap) => {
                wanted.push(parse_capability(s, &cap)?);
                rpm_files = true;
            }
            Err(e) => {
                debug!("RPM argument {} rejected: {}", arg, e);
                s.console
                    .err(format!("Problem with the RPM file specified as '{arg}', skipping."));
                s.console.err(e);
            }
        }
    }

    if wanted.is_empty() {
        s.console.err("No valid arguments specified.");
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    if rpm_files {
        add_rpm_cache_repo(s)?;
    }

    init_repos(s)?;
    if s.data.repos.is_empty() {
        s.console.err(
            "Warning: No repositories defined. Operating only with the installed resolvables. \
             Nothing can be installed.",
        );
    }
    load_resolvables(s, true)?;

    let force = s.copts.contains("force");
    for cap in &wanted {
        mark_for_install(s, kind, cap, force);
    }

    if s.copts.contains("debug-solver") {
        return debug_solver(s);
    }
    solve_and_commit(s)
}

/// Remove installed resolvables by name or capability
pub fn cmd_remove(s: &mut Session) -> Flow {
    if s.arguments.is_empty() {
        let help = s.command_help;
        s.console.err("Too few arguments. At least one package name is required.");
        s.console.err(help);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    info!("Removing {}", s.arguments.join(" "));

    apply_commit_settings(s);
    let kind = parse_kind(s, ResolvableKind::Package)?;

    init_repos(s)?;
    load_resolvables(s, true)?;

    for arg in s.arguments.clone() {
        let cap = select_by(s, &arg)?;
        mark_for_remove(s, kind, &cap);
    }

    if s.copts.contains("debug-solver") {
        return debug_solver(s);
    }
    solve_and_commit(s)
}

/// Install source packages by name
pub fn cmd_source_install(s: &mut Session) -> Flow {
    if s.arguments.is_empty() {
        s.console.err("Source package name is a required argument.");
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    info!("Installing source packages {}", s.arguments.join(" "));

    init_repos(s)?;
    load_resolvables(s, false)?;

    for name in s.arguments.clone() {
        let best: Option<Resolvable> = s
            .manager()
            .pool()
            .iter()
            .filter(|r| r.kind == ResolvableKind::SrcPackage && r.name == name)
            .max_by(|a, b| a.parsed_edition().cmp(&b.parsed_edition()))
            .cloned();
        match best {
            Some(src) => s.manager().mark(Selection::install(src)),
            None => s
                .console
                .err(format!("Source package '{name}' not found.")),
        }
    }

    solve_and_commit(s)
}

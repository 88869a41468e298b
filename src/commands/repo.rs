// src/commands/repo.rs
//! Repository management commands

use super::{find_repo, report_required_arg_missing, report_too_many_arguments};
use crate::console::xml_escape;
use crate::error::{Error, Flow};
use crate::exit_code::ExitCode;
use crate::manager::{repofile, RefreshOptions, RefreshStatus, RepoInfo, RepoType};
use crate::session::Session;
use crate::table::Table;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Persistent repositories; the additional ones of this process are not listed
fn system_repos(s: &mut Session) -> Flow<Vec<RepoInfo>> {
    Ok(s.manager()
        .repositories()?
        .into_iter()
        .filter(|r| !r.ephemeral)
        .collect())
}

/// List repositories
pub fn cmd_repos(s: &mut Session) -> Flow {
    info!("Listing repositories");
    let repos = system_repos(s)?;

    if let Some(file) = s.copts.first("export").map(PathBuf::from) {
        if let Err(e) = fs::write(&file, repofile::write(&repos)) {
            warn!("Export to {:?} failed: {}", file, e);
            s.console.err(format!("Cannot write to file '{}'.", file.display()));
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
            return Ok(());
        }
        s.console.normal(format!(
            "Repositories have been successfully exported to {}.",
            file.display()
        ));
        return Ok(());
    }

    if s.gopts.machine_readable {
        s.console.out("<repo-list>");
        for repo in &repos {
            s.console.out(format!(
                "<repo alias=\"{}\" name=\"{}\" type=\"{}\" enabled=\"{}\" autorefresh=\"{}\">",
                xml_escape(&repo.alias),
                xml_escape(repo.label()),
                repo.repo_type,
                u8::from(repo.enabled),
                u8::from(repo.autorefresh),
            ));
            for url in &repo.base_urls {
                s.console.out(format!("<url>{}</url>", xml_escape(url.as_str())));
            }
            s.console.out("</repo>");
        }
        s.console.out("</repo-list>");
        return Ok(());
    }

    if repos.is_empty() {
        s.console.normal(
            "No repositories defined. Use the 'zypper addrepo' command to add one or more repositories.",
        );
        return Ok(());
    }

    let mut table = if s.gopts.rug_compatible {
        Table::new(s.gopts.table_style).header(["#", "Status", "Type", "Name", "URI"])
    } else {
        Table::new(s.gopts.table_style).header(["#", "Enabled", "Refresh", "Type", "Alias", "Name", "URI"])
    };
    for (i, repo) in repos.iter().enumerate() {
        let url = repo.url().map(Url::to_string).unwrap_or_default();
        if s.gopts.rug_compatible {
            let status = if repo.enabled { "Active" } else { "Disabled" };
            table.add_row([
                (i + 1).to_string(),
                status.to_string(),
                repo.repo_type.to_string(),
                repo.label().to_string(),
                url,
            ]);
        } else {
            table.add_row([
                (i + 1).to_string(),
                yes_no(repo.enabled).to_string(),
                yes_no(repo.autorefresh).to_string(),
                repo.repo_type.to_string(),
                repo.alias.clone(),
                repo.label().to_string(),
                url,
            ]);
        }
    }
    s.console.out_raw(table);
    Ok(())
}

fn add_repo(s: &mut Session, repo: &RepoInfo) {
    match s.manager().add_repository(repo) {
        Ok(()) => {
            s.console.normal(format!("Repository '{}' successfully added:", repo.alias));
            s.console.normal(format!("Enabled: {}", yes_no(repo.enabled)));
            s.console.normal(format!("Autorefresh: {}", yes_no(repo.autorefresh)));
            if let Some(url) = repo.url() {
                s.console.normal(format!("URL: {url}"));
            }
        }
        Err(e @ Error::RepoExists(_)) => {
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
        Err(e) => {
            warn!("Adding {} failed: {}", repo.alias, e);
            s.console.err(format!("Problem adding repository '{}':", repo.alias));
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
    }
}

/// Add a repository given by URI and alias, or all repositories of a .repo file
pub fn cmd_addrepo(s: &mut Session) -> Flow {
    if s.arguments.len() > 2 {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    if let Some(file) = s.copts.first("repo").map(PathBuf::from) {
        info!("Adding repositories from {:?}", file);
        let parsed = fs::read_to_string(&file)
            .map_err(Error::from)
            .and_then(|text| repofile::parse(&text, &file.to_string_lossy()));
        match parsed {
            Ok(repos) => {
                if repos.is_empty() {
                    s.console.err(format!("No repositories defined in '{}'.", file.display()));
                    s.set_exit_code(ExitCode::InvalidArgs);
                }
                for repo in &repos {
                    add_repo(s, repo);
                }
            }
            Err(e) => {
                s.console.err(format!("Problem reading the repository file '{}':", file.display()));
                s.console.err(e);
                s.set_exit_code(ExitCode::InvalidArgs);
            }
        }
        return Ok(());
    }

    if s.arguments.len() < 2 {
        let help = s.command_help;
        s.console.err("Too few arguments. At least URL and alias are required.");
        s.console.err(help);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let (uri, alias) = (s.arguments[0].clone(), s.arguments[1].clone());
    let url = match Url::parse(&uri) {
        Ok(url) => url,
        Err(e) => {
            s.console.err(Error::InvalidUrl {
                url: uri,
                reason: e.to_string(),
            });
            s.set_exit_code(ExitCode::InvalidArgs);
            return Ok(());
        }
    };

    let repo_type = match s.copts.first("type").map(str::to_string) {
        None => RepoType::default(),
        Some(name) => match name.parse::<RepoType>() {
            Ok(t) => t,
            Err(_) => {
                s.console
                    .err(format!("Specified type is not a valid repository type: {name}"));
                s.console.err(
                    "See 'zypper -h addrepo' or man zypper to get a list of known repository types.",
                );
                s.set_exit_code(ExitCode::InvalidArgs);
                return Ok(());
            }
        },
    };

    info!("Adding repository {} ({})", alias, url);
    let mut repo = RepoInfo::new(alias, url);
    repo.repo_type = repo_type;
    repo.enabled = !s.copts.contains("disabled");
    repo.autorefresh = !s.copts.contains("no-refresh");
    add_repo(s, &repo);
    Ok(())
}

/// Compare repository URLs, optionally ignoring credentials and the query
fn same_url(a: &Url, b: &Url, loose_auth: bool, loose_query: bool) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    if loose_auth {
        for url in [&mut a, &mut b] {
            let _ = url.set_username("");
            let _ = url.set_password(None);
        }
    }
    if loose_query {
        a.set_query(None);
        b.set_query(None);
    }
    a == b
}

/// Remove a repository by alias or URL
pub fn cmd_removerepo(s: &mut Session) -> Flow {
    if s.arguments.is_empty() {
        report_required_arg_missing(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    if s.arguments.len() > 1 {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let target = s.arguments[0].clone();
    let repos = system_repos(s)?;

    let mut found = repos.iter().find(|r| r.alias == target);
    if found.is_none() {
        s.console
            .verbose("Repository not found by alias, trying delete by URL...");
        let loose_auth = s.copts.contains("loose-auth");
        let loose_query = s.copts.contains("loose-query");
        if let Ok(url) = Url::parse(&target) {
            found = repos.iter().find(|r| {
                r.base_urls
                    .iter()
                    .any(|u| same_url(u, &url, loose_auth, loose_query))
            });
        }
    }

    let Some(repo) = found else {
        s.console.err("Repository not found by given alias or URL.");
        s.set_exit_code(ExitCode::ZyppError);
        return Ok(());
    };

    info!("Removing repository {}", repo.alias);
    match s.manager().remove_repository(&repo.alias) {
        Ok(()) => s
            .console
            .normal(format!("Repository '{}' has been removed.", repo.alias)),
        Err(e) => {
            s.console.err(format!("Problem removing repository '{}':", repo.alias));
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
    }
    Ok(())
}

/// Give a repository a new alias
pub fn cmd_renamerepo(s: &mut Session) -> Flow {
    if s.arguments.len() < 2 {
        let help = s.command_help;
        s.console.err("Too few arguments. At least URL and alias are required.");
        s.console.err(help);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    if s.arguments.len() > 2 {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let (old, new) = (s.arguments[0].clone(), s.arguments[1].clone());
    let repos = system_repos(s)?;
    let Some(existing) = repos.iter().find(|r| r.alias == old) else {
        s.console.err(Error::RepoNotFound(old));
        s.set_exit_code(ExitCode::ZyppError);
        return Ok(());
    };

    let mut renamed = existing.clone();
    renamed.alias = new.clone();
    if renamed.name == old {
        renamed.name = new.clone();
    }

    info!("Renaming repository {} to {}", old, new);
    match s.manager().modify_repository(&old, &renamed) {
        Ok(()) => s
            .console
            .normal(format!("Repository '{old}' renamed to '{new}'.")),
        Err(e) => {
            s.console.err("Error while modifying the repository:");
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
    }
    Ok(())
}

/// Enable, disable or change the autorefresh of a repository
pub fn cmd_modifyrepo(s: &mut Session) -> Flow {
    if s.arguments.is_empty() {
        let help = s.command_help;
        s.console.err("Alias is a required argument.");
        s.console.err(help);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }
    if s.arguments.len() > 1 {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let alias = s.arguments[0].clone();
    let repos = system_repos(s)?;
    let Some(existing) = repos.iter().find(|r| r.alias == alias) else {
        s.console.err(Error::RepoNotFound(alias));
        s.set_exit_code(ExitCode::ZyppError);
        return Ok(());
    };

    let mut modified = existing.clone();
    if s.copts.contains("enable") {
        modified.enabled = true;
    }
    if s.copts.contains("disable") {
        modified.enabled = false;
    }
    if s.copts.contains("enable-autorefresh") {
        modified.autorefresh = true;
    }
    if s.copts.contains("disable-autorefresh") {
        modified.autorefresh = false;
    }

    if &modified == existing {
        s.console
            .normal(format!("Nothing to change for repository '{alias}'."));
        return Ok(());
    }

    info!("Modifying repository {}", alias);
    match s.manager().modify_repository(&alias, &modified) {
        Ok(()) => {
            if modified.enabled != existing.enabled {
                let state = if modified.enabled { "enabled" } else { "disabled" };
                s.console
                    .normal(format!("Repository '{alias}' has been successfully {state}."));
            }
            if modified.autorefresh != existing.autorefresh {
                let state = if modified.autorefresh { "enabled" } else { "disabled" };
                s.console
                    .normal(format!("Autorefresh has been {state} for repository '{alias}'."));
            }
        }
        Err(e) => {
            s.console.err("Error while modifying the repository:");
            s.console.err(e);
            s.set_exit_code(ExitCode::ZyppError);
        }
    }
    Ok(())
}

/// Refresh all enabled repositories, or the ones given by alias or number
pub fn cmd_refresh(s: &mut Session) -> Flow {
    if s.gopts.no_refresh {
        s.console
            .normal("The '--no-refresh' global option has no effect here.");
    }

    let force = s.copts.contains("force");
    let options = RefreshOptions {
        force_download: force || s.copts.contains("force-download"),
        force_build: force || s.copts.contains("force-build"),
        download_only: s.copts.contains("download-only"),
        build_only: s.copts.contains("build-only"),
    };
    if options.download_only && options.build_only {
        s.console
            .err("You cannot use --download-only together with --build-only.");
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let repos = system_repos(s)?;
    let specified: Vec<String> = s
        .arguments
        .iter()
        .chain(s.copts.values("repo"))
        .cloned()
        .collect();

    let mut targets = Vec::new();
    if specified.is_empty() {
        targets.extend(repos.iter().filter(|r| r.enabled).cloned());
        if targets.is_empty() {
            s.console.err("There are no enabled repositories defined.");
            s.console
                .err("Use 'zypper addrepo' or 'zypper modifyrepo' commands to add or enable repositories.");
            return Ok(());
        }
    } else {
        for spec in &specified {
            match find_repo(&repos, spec) {
                Some(repo) if !repo.enabled => s
                    .console
                    .normal(format!("Skipping disabled repository '{}'", repo.label())),
                Some(repo) => {
                    if !targets.contains(repo) {
                        targets.push(repo.clone());
                    }
                }
                None => s
                    .console
                    .err(format!("Repository '{spec}' not found by its alias, number, or URI.")),
            }
        }
        if targets.is_empty() {
            s.console.err("Specified repositories are not enabled or defined.");
            s.set_exit_code(ExitCode::InvalidArgs);
            return Ok(());
        }
    }

    let mut failed = 0;
    for repo in &targets {
        info!("Refreshing {}", repo.alias);
        match s.manager().refresh_repository(repo, options) {
            Ok(RefreshStatus::Refreshed) => s
                .console
                .normal(format!("Repository '{}' has been refreshed.", repo.label())),
            Ok(RefreshStatus::UpToDate) => s
                .console
                .normal(format!("Repository '{}' is up to date.", repo.label())),
            Err(e) => {
                warn!("Refresh of {} failed: {}", repo.alias, e);
                s.console
                    .err(format!("Problem refreshing repository '{}':", repo.label()));
                s.console.err(e);
                failed += 1;
            }
        }
    }

    if failed == targets.len() {
        s.console.err("Could not refresh the repositories because of errors.");
        s.set_exit_code(ExitCode::ZyppError);
    } else if failed > 0 {
        s.console
            .err("Some of the repositories have not been refreshed because of an error.");
        s.set_exit_code(ExitCode::ZyppError);
    } else if specified.is_empty() {
        s.console.normal("All repositories have been refreshed.");
    } else {
        s.console.normal("Specified repositories have been refreshed.");
    }
    Ok(())
}

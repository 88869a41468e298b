// src/commands/query.rs
//! Read-only query commands: search, info, patches and updates

use super::{
    find_updates, init_repos, load_resolvables, needed_patches, parse_kind,
    report_required_arg_missing, report_too_many_arguments,
};
use crate::command::Command;
use crate::console::xml_escape;
use crate::error::Flow;
use crate::exit_code::ExitCode;
use crate::manager::{Resolvable, ResolvableKind};
use crate::session::Session;
use crate::table::Table;
use glob::{MatchOptions, Pattern};
use tracing::{debug, info};

/// One search string
enum Term {
    /// Contains `*` or `?`; must match the whole field
    Wildcard(Pattern),
    Text(String),
}

/// Search strings with the matching rules selected by the `search` options
struct SearchQuery {
    terms: Vec<Term>,
    match_any: bool,
    match_words: bool,
    match_exact: bool,
    case_sensitive: bool,
    descriptions: bool,
}

impl SearchQuery {
    fn from_session(s: &Session) -> Self {
        let terms = s
            .arguments
            .iter()
            .map(|arg| {
                if arg.contains(['*', '?']) {
                    if let Ok(pattern) = Pattern::new(arg) {
                        return Term::Wildcard(pattern);
                    }
                }
                Term::Text(arg.clone())
            })
            .collect();

        Self {
            terms,
            match_any: s.copts.contains("match-any"),
            match_words: s.copts.contains("match-words"),
            match_exact: s.copts.contains("match-exact"),
            case_sensitive: s.copts.contains("case-sensitive"),
            descriptions: s.copts.contains("search-descriptions"),
        }
    }

    fn term_matches(&self, term: &Term, field: &str) -> bool {
        match term {
            Term::Wildcard(pattern) => pattern.matches_with(
                field,
                MatchOptions {
                    case_sensitive: self.case_sensitive,
                    require_literal_separator: false,
                    require_literal_leading_dot: false,
                },
            ),
            Term::Text(text) => {
                let (field, text) = if self.case_sensitive {
                    (field.to_string(), text.clone())
                } else {
                    (field.to_lowercase(), text.to_lowercase())
                };
                if self.match_exact {
                    field == text
                } else if self.match_words {
                    field.split(|c: char| !c.is_alphanumeric()).any(|w| w == text)
                } else {
                    field.contains(&text)
                }
            }
        }
    }

    fn matches(&self, r: &Resolvable) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let mut fields = vec![r.name.as_str()];
        if self.descriptions {
            fields.push(&r.summary);
            fields.push(&r.description);
        }
        let hit = |term: &Term| fields.iter().any(|f| self.term_matches(term, f));
        if self.match_any {
            self.terms.iter().any(hit)
        } else {
            self.terms.iter().all(hit)
        }
    }
}

/// Display name of the repository a resolvable comes from
fn repo_label(s: &Session, alias: &str) -> String {
    s.data
        .repos
        .iter()
        .find(|r| r.alias == alias)
        .map(|r| r.label().to_string())
        .unwrap_or_else(|| alias.to_string())
}

fn repo_column(s: &Session) -> &'static str {
    if s.gopts.rug_compatible { "Catalog" } else { "Repository" }
}

/// Search the pool for resolvables matching the query strings
pub fn cmd_search(s: &mut Session) -> Flow {
    let installed_only = s.copts.contains("installed-only");
    let uninstalled_only =
        s.copts.contains("uninstalled-only") || s.gopts.disable_system_resolvables;

    let mut kinds = Vec::new();
    for name in s.copts.values("type").to_vec() {
        match name.parse::<ResolvableKind>() {
            Ok(kind) => kinds.push(kind),
            Err(_) => {
                s.console.err(format!("Unknown resolvable type {name}"));
                s.set_exit_code(ExitCode::InvalidArgs);
                return Ok(());
            }
        }
    }
    if kinds.is_empty() && s.gopts.rug_compatible {
        kinds.push(ResolvableKind::Package);
    }

    info!("Searching for {:?}", s.arguments);
    let query = SearchQuery::from_session(s);
    init_repos(s)?;
    load_resolvables(s, !uninstalled_only)?;

    let mut table = Table::new(s.gopts.table_style).header([
        "S",
        repo_column(s),
        "Type",
        "Name",
        "Version",
        "Arch",
    ]);
    let pool = s.manager().pool().to_vec();
    for r in pool.iter() {
        if !kinds.is_empty() && !kinds.contains(&r.kind) {
            continue;
        }
        if (installed_only && !r.installed) || (uninstalled_only && r.installed) {
            continue;
        }
        if !query.matches(r) {
            continue;
        }
        table.add_row([
            (if r.installed { "i" } else { "" }).to_string(),
            repo_label(s, &r.repo),
            r.kind.to_string(),
            r.name.clone(),
            r.edition.clone(),
            r.arch.clone(),
        ]);
    }
    debug!("{} resolvables matched", table.len());

    if table.is_empty() {
        s.console.normal("No resolvables found.");
        return Ok(());
    }

    if s.copts.contains("sort-by-repo") || s.copts.contains("sort-by-catalog") {
        table.sort_by_column(1);
    } else {
        table.sort_by_column(3);
    }
    s.console.out("");
    s.console.out_raw(table);
    Ok(())
}

/// Highest edition of `name`, among installed or among available resolvables
fn newest<'a>(
    pool: &'a [Resolvable],
    kind: ResolvableKind,
    name: &str,
    installed: bool,
) -> Option<&'a Resolvable> {
    pool.iter()
        .filter(|r| r.installed == installed && r.kind == kind && r.name == name)
        .max_by(|a, b| a.parsed_edition().cmp(&b.parsed_edition()))
}

fn print_info(s: &mut Session, r: &Resolvable, installed: Option<&Resolvable>) {
    let status = match installed {
        Some(i) if i.parsed_edition() < r.parsed_edition() => {
            format!("out-of-date (version {} installed)", i.edition)
        }
        Some(_) => "up-to-date".to_string(),
        None => "not installed".to_string(),
    };
    let yes_no = |b: bool| if b { "Yes" } else { "No" };
    let repo = repo_label(s, &r.repo);

    s.console.out("");
    s.console.out(format!("Information for {} {}:", r.kind, r.name));
    s.console.out("");
    s.console.out(format!("Repository: {repo}"));
    s.console.out(format!("Name: {}", r.name));
    s.console.out(format!("Version: {}", r.edition));
    s.console.out(format!("Arch: {}", r.arch));
    s.console.out(format!("Installed: {}", yes_no(installed.is_some())));
    s.console.out(format!("Status: {status}"));
    if r.kind == ResolvableKind::Patch {
        s.console
            .out(format!("Category: {}", r.category.as_deref().unwrap_or("")));
        s.console
            .out(format!("Reboot Required: {}", yes_no(r.reboot_suggested)));
        s.console.out(format!(
            "Restart Required: {}",
            yes_no(r.restart_suggested || r.affects_package_manager)
        ));
        s.console
            .out(format!("Interactive: {}", yes_no(r.interactive)));
    }
    s.console.out(format!("Summary: {}", r.summary));
    s.console.out("Description: ");
    s.console.out(&r.description);
}

/// Show full information for resolvables
///
/// The rug aliases fix the kind; `info` takes it from `--type`.
pub fn cmd_info(s: &mut Session) -> Flow {
    if s.arguments.is_empty() {
        report_required_arg_missing(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let kind = match s.command {
        Command::RugPatchInfo => ResolvableKind::Patch,
        Command::RugPatternInfo => ResolvableKind::Pattern,
        Command::RugProductInfo => ResolvableKind::Product,
        _ => parse_kind(s, ResolvableKind::Package)?,
    };

    init_repos(s)?;
    load_resolvables(s, true)?;

    let pool = s.manager().pool().to_vec();
    for name in s.arguments.clone() {
        let installed = newest(&pool, kind, &name, true);
        let Some(shown) = newest(&pool, kind, &name, false).or(installed) else {
            s.console.out("");
            s.console.normal(format!("{kind} '{name}' not found."));
            continue;
        };
        print_info(s, shown, installed);
    }
    Ok(())
}

/// Count the needed patches and report them through the exit code
pub fn cmd_patch_check(s: &mut Session) -> Flow {
    if !s.arguments.is_empty() {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    init_repos(s)?;
    load_resolvables(s, true)?;

    let needed = needed_patches(s.manager().pool());
    let security = needed.iter().filter(|p| p.is_security()).count();
    s.data.patches_count = needed.len();
    s.data.security_patches_count = security;
    info!("{} patches needed, {} security", needed.len(), security);

    s.console.normal(format!(
        "{} patches needed ({} security patches)",
        needed.len(),
        security
    ));

    if security > 0 {
        s.set_exit_code(ExitCode::SecurityUpdateNeeded);
    } else if !needed.is_empty() {
        s.set_exit_code(ExitCode::UpdateNeeded);
    }
    Ok(())
}

/// List all available patches with their status
pub fn cmd_patches(s: &mut Session) -> Flow {
    if !s.arguments.is_empty() {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    init_repos(s)?;
    load_resolvables(s, true)?;

    let pool = s.manager().pool().to_vec();
    let needed = needed_patches(&pool);
    let mut table = Table::new(s.gopts.table_style).header([
        repo_column(s),
        "Name",
        "Version",
        "Category",
        "Status",
    ]);
    for patch in pool
        .iter()
        .filter(|r| r.kind == ResolvableKind::Patch && !r.installed)
    {
        let status = if needed.contains(patch) {
            "Needed"
        } else if pool
            .iter()
            .any(|i| i.installed && i.kind == patch.kind && i.name == patch.name && i.edition == patch.edition)
        {
            "Installed"
        } else {
            "Not Needed"
        };
        table.add_row([
            repo_label(s, &patch.repo),
            patch.name.clone(),
            patch.edition.clone(),
            patch.category.clone().unwrap_or_default(),
            status.to_string(),
        ]);
    }

    if table.is_empty() {
        s.console.normal("No patches found.");
        return Ok(());
    }
    table.sort_by_column(1);
    s.console.out_raw(table);
    Ok(())
}

/// List available updates of one resolvable kind
pub fn cmd_list_updates(s: &mut Session) -> Flow {
    if !s.arguments.is_empty() {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    let default = if s.gopts.rug_compatible {
        ResolvableKind::Package
    } else {
        ResolvableKind::Patch
    };
    let kind = parse_kind(s, default)?;
    if s.copts.contains("best-effort") && s.gopts.rug_compatible {
        s.console
            .normal("Running as 'rug', can't do 'best-effort' approach to update.");
    }

    init_repos(s)?;
    load_resolvables(s, true)?;

    let updates = find_updates(s.manager().pool(), kind);
    if updates.is_empty() {
        s.console.normal("No updates found.");
        return Ok(());
    }

    let style = s.gopts.table_style;
    let mut table = if kind == ResolvableKind::Patch {
        Table::new(style).header([repo_column(s), "Name", "Version", "Category", "Status"])
    } else {
        Table::new(style).header(["S", repo_column(s), "Name", "Version", "Arch"])
    };
    for u in &updates {
        let repo = repo_label(s, &u.repo);
        if kind == ResolvableKind::Patch {
            table.add_row([
                repo,
                u.name.clone(),
                u.edition.clone(),
                u.category.clone().unwrap_or_default(),
                "Needed".to_string(),
            ]);
        } else {
            table.add_row([
                "v".to_string(),
                repo,
                u.name.clone(),
                u.edition.clone(),
                u.arch.clone(),
            ]);
        }
    }
    s.console.out_raw(table);
    Ok(())
}

fn write_xml_update(s: &mut Session, r: &Resolvable) {
    let mut attrs = format!(
        "kind=\"{}\" name=\"{}\" edition=\"{}\" arch=\"{}\"",
        r.kind,
        xml_escape(&r.name),
        xml_escape(&r.edition),
        xml_escape(&r.arch)
    );
    if let Some(category) = &r.category {
        attrs.push_str(&format!(" category=\"{}\"", xml_escape(category)));
    }
    if r.kind == ResolvableKind::Patch {
        attrs.push_str(&format!(
            " pkgmanager=\"{}\" restart=\"{}\" interactive=\"{}\"",
            r.affects_package_manager, r.restart_suggested, r.interactive
        ));
    }

    let source = s
        .data
        .repos
        .iter()
        .find(|repo| repo.alias == r.repo)
        .map(|repo| {
            format!(
                "<source url=\"{}\" alias=\"{}\"/>",
                xml_escape(repo.url().map(|u| u.as_str()).unwrap_or("")),
                xml_escape(&repo.alias)
            )
        });

    s.console.out(format!("<update {attrs}>"));
    s.console
        .out(format!("<summary>{}</summary>", xml_escape(&r.summary)));
    s.console
        .out(format!("<description>{}</description>", xml_escape(&r.description)));
    if let Some(license) = &r.license {
        s.console.out(format!("<license>{}</license>", xml_escape(license)));
    }
    if let Some(source) = source {
        s.console.out(source);
    }
    s.console.out("</update>");
}

/// Needed patches and package updates as an `<update-status>` document
///
/// Package updates are left out while a patch for the package manager
/// itself is pending; that patch has to be installed first.
pub fn cmd_xml_updates(s: &mut Session) -> Flow {
    init_repos(s)?;
    load_resolvables(s, true)?;

    let pool = s.manager().pool().to_vec();
    let patches = needed_patches(&pool);
    let pkgmgr_patch = patches.iter().any(|p| p.affects_package_manager);

    s.console.out("<update-status version=\"0.6\">");
    s.console.out("<update-list>");
    for patch in &patches {
        write_xml_update(s, patch);
    }
    if !pkgmgr_patch {
        for update in find_updates(&pool, ResolvableKind::Package) {
            write_xml_update(s, &update);
        }
    }
    s.console.out("</update-list>");
    s.console.out("</update-status>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(terms: &[&str]) -> SearchQuery {
        SearchQuery {
            terms: terms
                .iter()
                .map(|t| match Pattern::new(t) {
                    Ok(p) if t.contains(['*', '?']) => Term::Wildcard(p),
                    _ => Term::Text(t.to_string()),
                })
                .collect(),
            match_any: false,
            match_words: false,
            match_exact: false,
            case_sensitive: false,
            descriptions: false,
        }
    }

    fn package(name: &str, summary: &str) -> Resolvable {
        let mut r = Resolvable::new(ResolvableKind::Package, name, "1.0-1");
        r.summary = summary.to_string();
        r
    }

    #[test]
    fn test_substring_and_case() {
        let q = query(&["VIM"]);
        assert!(q.matches(&package("vim-data", "")));
        let mut q = query(&["VIM"]);
        q.case_sensitive = true;
        assert!(!q.matches(&package("vim-data", "")));
    }

    #[test]
    fn test_match_all_and_any() {
        let mut q = query(&["vim", "data"]);
        assert!(q.matches(&package("vim-data", "")));
        assert!(!q.matches(&package("vim", "")));
        q.match_any = true;
        assert!(q.matches(&package("vim", "")));
    }

    #[test]
    fn test_exact_words_and_wildcards() {
        let mut q = query(&["vim"]);
        q.match_exact = true;
        assert!(q.matches(&package("vim", "")));
        assert!(!q.matches(&package("gvim", "")));

        let mut q = query(&["data"]);
        q.match_words = true;
        assert!(q.matches(&package("vim-data", "")));
        assert!(!q.matches(&package("metadata", "")));

        let q = query(&["v?m*"]);
        assert!(q.matches(&package("vim-data", "")));
        assert!(!q.matches(&package("gvim", "")));
    }

    #[test]
    fn test_descriptions_searched_on_request() {
        let mut q = query(&["editor"]);
        let r = package("vim", "Vi IMproved text editor");
        assert!(!q.matches(&r));
        q.descriptions = true;
        assert!(q.matches(&r));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(query(&[]).matches(&package("anything", "")));
    }
}

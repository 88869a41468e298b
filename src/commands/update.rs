// src/commands/update.rs
//! Update and distribution upgrade

use super::{
    apply_commit_settings, debug_solver, init_repos, load_resolvables, mark_updates,
    parse_kind, report_too_many_arguments, solve_and_commit,
};
use crate::error::Flow;
use crate::exit_code::ExitCode;
use crate::manager::ResolvableKind;
use crate::session::Session;
use tracing::info;

/// Update installed resolvables of one kind (patches by default)
pub fn cmd_update(s: &mut Session) -> Flow {
    if !s.arguments.is_empty() {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    apply_commit_settings(s);
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
    let skip_interactive = s.copts.contains("skip-interactive") || s.gopts.non_interactive;

    init_repos(s)?;
    load_resolvables(s, true)?;

    let marked = mark_updates(s, kind, skip_interactive);
    info!("Marked {} {} updates", marked, kind);

    if s.copts.contains("debug-solver") {
        return debug_solver(s);
    }
    solve_and_commit(s)
}

/// Upgrade every installed package, pattern and product to the newest available edition
pub fn cmd_dist_upgrade(s: &mut Session) -> Flow {
    if !s.arguments.is_empty() {
        report_too_many_arguments(s);
        s.set_exit_code(ExitCode::InvalidArgs);
        return Ok(());
    }

    apply_commit_settings(s);
    init_repos(s)?;
    load_resolvables(s, true)?;

    s.console.normal("Computing upgrade...");
    let mut marked = 0;
    for kind in [
        ResolvableKind::Package,
        ResolvableKind::Pattern,
        ResolvableKind::Product,
    ] {
        marked += mark_updates(s, kind, false);
    }
    info!("Distribution upgrade marked {} resolvables", marked);

    if s.copts.contains("debug-solver") {
        return debug_solver(s);
    }
    solve_and_commit(s)
}

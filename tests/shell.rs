// tests/shell.rs

//! The interactive shell loop.

mod common;

use common::{available, repo, Harness, ScriptedReader};
use zypper::console::{STREAM_CLOSE, STREAM_OPEN};
use zypper::manager::ResolvableKind;
use zypper::{Command, ExitCode, ReadOutcome};

fn shell_harness(is_root: bool) -> Harness {
    let h = Harness::new(is_root);
    {
        let mut state = h.state.borrow_mut();
        state.repos.push(repo("main", "http://example.com/main"));
        state
            .pool
            .push(available(ResolvableKind::Package, "foo", "1.0-1", "main"));
    }
    h
}

#[test]
fn test_shell_runs_lines_until_quit() {
    let mut h = shell_harness(false);
    let (reader, log) = ScriptedReader::new(&["moo", "quit", "moo"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert_eq!(h.stdout().matches("__o").count(), 1);
    assert_eq!(log.borrow().prompts, 2);
    assert!(!h.session.running_shell());
}

#[test]
fn test_shell_alias_and_end_of_input() {
    let mut h = shell_harness(false);
    let (reader, log) = ScriptedReader::new(&["moo"]);
    h.script(reader);

    assert_eq!(h.run(&["sh"]), ExitCode::Ok);
    assert!(h.stdout().contains("__o"));
    // the second read hits end of input
    assert_eq!(log.borrow().prompts, 2);
}

#[test]
fn test_shell_resets_state_between_commands() {
    let mut h = shell_harness(true);
    let (reader, _log) = ScriptedReader::new(&["install --bogus foo", "repos"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(h.stderr().contains("Unknown option '--bogus'"));
    assert!(h.stdout().contains("main"));

    assert_eq!(h.session.exit_code(), ExitCode::Ok);
    assert_eq!(h.session.command(), Command::None);
    assert!(!h.session.running_help());
    assert!(h.session.arguments().is_empty());
    assert!(!h.session.command_options().contains("help"));
    assert!(h.session.command_options().positionals().is_empty());
}

#[test]
fn test_shell_failure_does_not_stick() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["install foo", "moo"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(h.stderr().contains("Root privileges are required"));
    assert!(h.stdout().contains("__o"));
    assert!(!h.state.borrow().called("lock"));
}

#[test]
fn test_shell_clears_selections_after_install() {
    let mut h = shell_harness(true);
    let (reader, _log) = ScriptedReader::new(&["install foo", "moo"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);

    let state = h.state.borrow();
    assert_eq!(state.count("clear_selections"), 1);
    assert!(state.position("commit") < state.position("clear_selections"));
    assert_eq!(state.count("lock"), 1);
    assert_eq!(state.count("unlock"), 1);
    assert!(state.position("unlock") < state.position("clear_selections"));
}

#[test]
fn test_shell_lock_not_held_across_lines() {
    let mut h = shell_harness(true);
    let (reader, _log) = ScriptedReader::new(&["install foo", "search foo", "remove foo"]);
    h.script(reader);

    h.run(&["shell"]);

    let state = h.state.borrow();
    assert_eq!(state.count("lock"), 3);
    assert_eq!(state.count("unlock"), 3);
    let mut held = false;
    for call in &state.calls {
        match call.as_str() {
            "lock" => {
                assert!(!held, "lock taken twice: {:?}", state.calls);
                held = true;
            }
            "unlock" => held = false,
            _ => {}
        }
    }
    assert!(!held);
}

#[test]
fn test_shell_unknown_command_keeps_reading() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["frob", "moo"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(h.stderr().contains("Unknown command 'frob'"));
    assert!(h.stderr().contains("Type 'help' to get a list"));
    assert!(h.stdout().contains("__o"));
}

#[test]
fn test_shell_interrupt_discards_line() {
    let mut h = shell_harness(false);
    let (reader, log) = ScriptedReader::from_outcomes(vec![
        ReadOutcome::Interrupted,
        ReadOutcome::Line("moo".to_string()),
    ]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(h.stdout().contains("__o"));
    assert_eq!(log.borrow().prompts, 3);
}

#[test]
fn test_shell_eot_quits_immediately() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["\u{4}", "moo"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(!h.stdout().contains("__o"));
}

#[test]
fn test_shell_skips_empty_lines() {
    let mut h = shell_harness(false);
    let (reader, log) = ScriptedReader::new(&["", "   ", "moo"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(h.stdout().contains("__o"));
    assert_eq!(log.borrow().history, vec!["moo".to_string()]);
}

#[test]
fn test_shell_help_word() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["help install", "help", "help frob"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    let out = h.stdout();
    assert!(out.contains("install (in) [options]"));
    assert!(out.contains("Global Options:"));
    assert!(out.contains("Type 'help <command>' to get a command-specific help."));
    assert!(out.contains("Unknown command 'frob'"));
    assert!(!h.state.borrow().called("lock"));
}

#[test]
fn test_shell_inside_shell() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["shell"]);
    h.script(reader);

    assert_eq!(h.run(&["shell"]), ExitCode::Ok);
    assert!(h.stderr().contains("You already are running zypper's shell."));
}

#[test]
fn test_shell_terse_stream_closed_per_command() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["repos", "repos"]);
    h.script(reader);

    assert_eq!(h.run(&["-t", "shell"]), ExitCode::Ok);
    let out = h.stdout();
    assert_eq!(out.matches(STREAM_OPEN).count(), 1);
    assert_eq!(out.matches("<repo-list>").count(), 2);
    assert_eq!(out.matches(STREAM_CLOSE).count(), 2);
    let first_close = out.find(STREAM_CLOSE).unwrap();
    let second_list = out.rfind("<repo-list>").unwrap();
    assert!(first_close < second_list);
    assert!(out.trim_end().ends_with(STREAM_CLOSE));
}

#[test]
fn test_shell_terse_without_commands_still_closed() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&[]);
    h.script(reader);

    assert_eq!(h.run(&["-t", "shell"]), ExitCode::Ok);
    assert_eq!(h.stdout().matches(STREAM_CLOSE).count(), 1);
}

#[test]
fn test_shell_keeps_global_options() {
    let mut h = shell_harness(false);
    let (reader, _log) = ScriptedReader::new(&["moo", "moo"]);
    h.script(reader);

    h.run(&["-q", "shell"]);
    assert_eq!(h.session.global_options().verbosity, -1);
    assert!(!h.stdout().contains("__o"));
}

#[test]
fn test_shell_additional_repo_registered_once() {
    let mut h = shell_harness(true);
    let (reader, _log) = ScriptedReader::new(&["install foo", "install foo"]);
    h.script(reader);

    assert_eq!(h.run(&["-p", "http://example.com/extra", "shell"]), ExitCode::Ok);
    let state = h.state.borrow();
    assert_eq!(state.count("add tmp1"), 1);
    assert_eq!(state.count("remove tmp1"), 1);
}

#[test]
fn test_shell_history_file() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join(".zypper_history");
    let mut h = Harness::with_history(false, history.clone());
    let (reader, log) = ScriptedReader::new(&["moo", "quit"]);
    h.script(reader);

    h.run(&["shell"]);
    let log = log.borrow();
    assert_eq!(log.loaded, vec![history.clone()]);
    assert_eq!(log.saved, vec![history]);
    assert_eq!(log.history, vec!["moo".to_string(), "quit".to_string()]);
}

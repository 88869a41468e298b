// src/main.rs

use anyhow::{Context, Result};
use tracing::{debug, warn};
use zypper::cli::GLOBAL_OPTIONS;
use zypper::getopt::{parse_options, ParsedOptions, ScanMode};
use zypper::{
    Command, CommandRegistry, Console, GlobalOptions, Host, LocalManager, ResourceManager,
    RustylineReader, Session,
};

/// Log level when `RUST_LOG` is not set, following `-q` and `-v`
fn default_log_level(parsed: Option<&ParsedOptions>) -> &'static str {
    let Some(parsed) = parsed else {
        return "warn";
    };
    if parsed.contains("quiet") {
        return "warn";
    }
    match parsed.count("verbose") {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// The command word names the shell
fn wants_shell(parsed: Option<&ParsedOptions>) -> bool {
    parsed
        .and_then(|p| p.positionals().first())
        .and_then(|word| CommandRegistry::builtin().resolve(word).ok())
        == Some(Command::Shell)
}

fn line_reader() -> Result<RustylineReader> {
    RustylineReader::new().context("Failed to set up the line editor")
}

fn main() -> std::process::ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = parse_options(&args, GLOBAL_OPTIONS, ScanMode::StopAtPositional).ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(default_log_level(parsed.as_ref()))
                }),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut session = Session::new(
        Console::stdio(),
        Host::probe(),
        Box::new(|gopts: &GlobalOptions| -> Box<dyn ResourceManager> {
            Box::new(LocalManager::new(gopts))
        }),
    );

    if wants_shell(parsed.as_ref()) {
        match line_reader() {
            Ok(reader) => session.set_line_reader(Box::new(reader)),
            Err(e) => warn!("{:#}", e),
        }
    }

    debug!("Arguments: {:?}", args);
    session.run(&args).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<ParsedOptions> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        parse_options(&args, GLOBAL_OPTIONS, ScanMode::StopAtPositional).ok()
    }

    #[test]
    fn test_wants_shell_follows_command_word() {
        assert!(wants_shell(parse(&["shell"]).as_ref()));
        assert!(wants_shell(parse(&["-v", "sh"]).as_ref()));
        assert!(!wants_shell(parse(&["search", "sh"]).as_ref()));
        assert!(!wants_shell(parse(&["install", "shell"]).as_ref()));
        assert!(!wants_shell(parse(&[]).as_ref()));
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(parse(&["-q", "-v"]).as_ref()), "warn");
        assert_eq!(default_log_level(parse(&["-v"]).as_ref()), "info");
        assert_eq!(default_log_level(parse(&["-vv", "lr"]).as_ref()), "debug");
        assert_eq!(default_log_level(None), "warn");
    }
}

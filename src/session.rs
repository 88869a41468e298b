// src/session.rs

//! The zypper session
//!
//! One [`Session`] exists per process. It owns the global options, the
//! state of the command being run, the runtime data shared between
//! commands, the console and the resource manager, and is handed by
//! `&mut` to every command handler.
//!
//! A single-shot invocation goes through [`Session::run`]: global options,
//! then one guarded command execution, then cleanup. The shell runs the
//! same guarded execution once per input line and resets the per-command
//! state in between.

use crate::cli::{self, CommandDescriptor};
use crate::command::{Command, CommandRegistry};
use crate::console::Console;
use crate::error::{Error, Flow, Interrupt};
use crate::exit_code::ExitCode;
use crate::getopt::{parse_options, ParsedOptions, ScanMode};
use crate::manager::{RepoInfo, ResourceManager};
use crate::options::{CommandSettings, GlobalOptions};
use crate::shell::{self, LineReader};
use crate::table::TableStyle;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use url::Url;

/// Shell history file name, relative to the home directory
pub const HISTORY_FILE: &str = ".zypper_history";

const BUG_REPORT_HINT: &str = "Please file a bug report about this.\n\
See http://en.opensuse.org/Zypper#Troubleshooting for instructions.";

const LOCK_CONFLICT: &str = "A ZYpp transaction is already in progress. \
This means, there is another application using the ZYpp library for package management running. \
All such applications must be closed before using this command.";

/// Builds the resource manager once the global options are known
pub type ManagerFactory = Box<dyn Fn(&GlobalOptions) -> Box<dyn ResourceManager>>;

/// Facts about the process environment, probed once at startup
#[derive(Debug, Clone, Default)]
pub struct Host {
    /// Effective user is root
    pub is_root: bool,
    /// Where the shell keeps its history; `None` without a home directory
    pub history_path: Option<PathBuf>,
}

impl Host {
    pub fn probe() -> Self {
        Self {
            is_root: nix::unistd::geteuid().is_root(),
            history_path: dirs::home_dir().map(|home| home.join(HISTORY_FILE)),
        }
    }
}

/// Data shared between commands of one session
#[derive(Debug, Default)]
pub struct RuntimeData {
    /// Repositories given with `--plus-repo` (and the RPM file cache)
    pub additional_repos: Vec<RepoInfo>,
    /// Aliases registered with the resource manager, removed at cleanup
    pub registered_repos: Vec<String>,
    /// Repositories the current command works with
    pub repos: Vec<RepoInfo>,
    /// Repository scratch state of the current command
    pub current_repo: Option<RepoInfo>,
    pub patches_count: usize,
    pub security_patches_count: usize,
}

pub struct Session {
    pub(crate) gopts: GlobalOptions,
    pub(crate) command: Command,
    /// Tokens after the command word, not yet parsed
    pub(crate) command_args: Vec<String>,
    pub(crate) copts: ParsedOptions,
    pub(crate) cmdopts: CommandSettings,
    /// Positional arguments of the command
    pub(crate) arguments: Vec<String>,
    pub(crate) command_help: &'static str,
    pub(crate) running_help: bool,
    pub(crate) running_shell: bool,
    exit_code: ExitCode,
    pub(crate) data: RuntimeData,
    pub(crate) console: Console,
    pub(crate) registry: CommandRegistry,
    pub(crate) host: Host,
    factory: ManagerFactory,
    manager: Option<Box<dyn ResourceManager>>,
    locked: bool,
    stream_open: bool,
    pub(crate) line_reader: Option<Box<dyn LineReader>>,
}

fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}

impl Session {
    pub fn new(console: Console, host: Host, factory: ManagerFactory) -> Self {
        Self {
            gopts: GlobalOptions::default(),
            command: Command::None,
            command_args: Vec::new(),
            copts: ParsedOptions::default(),
            cmdopts: CommandSettings::default(),
            arguments: Vec::new(),
            command_help: "",
            running_help: false,
            running_shell: false,
            exit_code: ExitCode::Ok,
            data: RuntimeData::default(),
            console,
            registry: CommandRegistry::builtin(),
            host,
            factory,
            manager: None,
            locked: false,
            stream_open: false,
            line_reader: None,
        }
    }

    /// Line source for the shell; without one the shell uses the terminal
    pub fn set_line_reader(&mut self, reader: Box<dyn LineReader>) {
        self.line_reader = Some(reader);
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub(crate) fn set_exit_code(&mut self, code: ExitCode) {
        debug!("Setting exit code to {}", code);
        self.exit_code = code;
    }

    pub fn global_options(&self) -> &GlobalOptions {
        &self.gopts
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn command_options(&self) -> &ParsedOptions {
        &self.copts
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn running_help(&self) -> bool {
        self.running_help
    }

    pub fn running_shell(&self) -> bool {
        self.running_shell
    }

    pub fn runtime_data(&self) -> &RuntimeData {
        &self.data
    }

    /// The resource manager, built on first use from the global options
    pub fn manager(&mut self) -> &mut Box<dyn ResourceManager> {
        self.manager.get_or_insert_with(|| {
            debug!("Creating the resource manager");
            (self.factory)(&self.gopts)
        })
    }

    /// Run zypper with the arguments that follow the program name
    pub fn run(&mut self, args: &[String]) -> ExitCode {
        match self.process_global_options(args) {
            Ok(()) => self.dispatch(),
            Err(interrupt) => self.report_interrupt(interrupt),
        }
        self.close_stream();
        self.console.flush();
        info!("Exiting with {}", self.exit_code);
        self.exit_code
    }

    fn dispatch(&mut self) {
        if self.running_help {
            self.safe_do_command();
            return;
        }
        match self.command {
            Command::None => {}
            Command::Shell => {
                shell::command_shell(self);
                self.cleanup();
            }
            _ => {
                self.safe_do_command();
                self.cleanup();
            }
        }
    }

    /// Interpret the global options and resolve the command word
    pub fn process_global_options(&mut self, args: &[String]) -> Flow {
        debug!("Processing global options: {:?}", args);

        let parsed = match parse_options(args, cli::GLOBAL_OPTIONS, ScanMode::StopAtPositional) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.console.err(e);
                self.console.err(cli::unknown_command_hint(false));
                self.set_exit_code(ExitCode::SyntaxError);
                return Err(Interrupt::exit("bad global option"));
            }
        };
        if parsed.has_unknown() {
            for token in parsed.unknown() {
                self.console.err(format!("Unknown option '{token}'"));
            }
            self.console.err(cli::unknown_command_hint(false));
            self.set_exit_code(ExitCode::SyntaxError);
            return Err(Interrupt::exit("unknown global option"));
        }

        if parsed.contains("help") {
            self.running_help = true;
        }

        if parsed.contains("quiet") {
            self.gopts.verbosity = -1;
            debug!("Verbosity {}", self.gopts.verbosity);
        } else if parsed.contains("verbose") {
            self.gopts.verbosity += parsed.count("verbose") as i32;
            self.console.out(format!("Verbosity: {}", self.gopts.verbosity));
            debug!("Verbosity {}", self.gopts.verbosity);
        }
        self.console.set_verbosity(self.gopts.verbosity);

        if parsed.contains("non-interactive") {
            self.gopts.non_interactive = true;
            self.console.set_non_interactive(true);
            self.console.normal("Entering non-interactive mode.");
        }
        if parsed.contains("no-gpg-checks") {
            self.gopts.no_gpg_checks = true;
            self.console.normal("Entering no-gpg-checks mode.");
        }
        if parsed.contains("rug-compatible") {
            self.gopts.rug_compatible = true;
            info!("Switching to rug-compatible mode");
        }

        if let Some(value) = parsed.first("table-style") {
            match value.parse::<u32>().ok().and_then(TableStyle::from_index) {
                Some(style) => self.gopts.table_style = style,
                None => {
                    self.console.err(format!("Invalid table style {value}"));
                    self.console.err(format!(
                        "Use an integer number from 0 to {}",
                        TableStyle::COUNT - 1
                    ));
                }
            }
        }

        if let Some(value) = parsed.first("root") {
            let root = PathBuf::from(value);
            if !root.is_absolute() {
                self.console
                    .err("The path specified in the --root option must be absolute.");
                self.set_exit_code(ExitCode::InvalidArgs);
                return Err(Interrupt::exit("relative root"));
            }
            debug!("Root directory: {:?}", root);
            self.gopts.rm_options.prefix_root(&root);
            self.gopts.root_dir = root;
        }

        if let Some(dir) = parsed.first("reposd-dir") {
            self.gopts.rm_options.known_repos_path = PathBuf::from(dir);
        }
        if let Some(dir) = parsed.first("cache-dir") {
            self.gopts.rm_options.repo_cache_path = PathBuf::from(dir);
        }
        if let Some(dir) = parsed.first("raw-cache-dir") {
            self.gopts.rm_options.repo_raw_cache_path = PathBuf::from(dir);
        }
        debug!("Repository manager paths: {:?}", self.gopts.rm_options);

        if parsed.contains("terse") {
            self.gopts.machine_readable = true;
            self.console.set_machine_readable(true);
            self.console.open_stream();
            self.stream_open = true;
        }

        if parsed.contains("disable-repositories") {
            self.gopts.disable_system_sources = true;
            self.console
                .normal("Repositories disabled, using the database of installed packages only.");
        }
        if parsed.contains("no-refresh") {
            self.gopts.no_refresh = true;
            self.console.verbose("Autorefresh disabled.");
        }
        if parsed.contains("disable-system-resolvables") {
            self.gopts.disable_system_resolvables = true;
            self.console.normal("Ignoring installed resolvables.");
        }
        if parsed.contains("opt") {
            let echoed: String = parsed.values("opt").iter().map(|v| format!("{v}, ")).collect();
            self.console.out(format!("Opt arg: {echoed}"));
        }

        let mut rest = parsed.positionals().iter().cloned();
        match rest.next() {
            Some(token) => match self.registry.resolve(&token) {
                Ok(command) => self.command = command,
                Err(e) => {
                    debug!("Command token {:?} not recognized", token);
                    self.console.err(e);
                }
            },
            None if !parsed.contains("version") => self.running_help = true,
            None => {}
        }

        if self.command == Command::Help {
            self.running_help = true;
            match rest.next() {
                Some(arg) => match self.registry.resolve(&arg) {
                    Ok(command) => self.command = command,
                    Err(e) if !is_help_flag(&arg) => {
                        self.console.out(e);
                        self.console.out(cli::unknown_command_hint(false));
                        return Err(Interrupt::exit("help for an unknown command"));
                    }
                    Err(_) => {}
                },
                None => {
                    self.print_main_help();
                    return Err(Interrupt::exit("main help printed"));
                }
            }
        } else if self.command == Command::None {
            if self.running_help {
                self.print_main_help();
            } else if parsed.contains("version") {
                self.console
                    .out(format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
            } else {
                self.console.err(cli::unknown_command_hint(false));
                self.set_exit_code(ExitCode::SyntaxError);
            }
        } else if self.command == Command::Shell {
            if let Some(extra) = rest.next() {
                if is_help_flag(&extra) {
                    self.running_help = true;
                } else {
                    self.console.err("Too many arguments.");
                    self.set_exit_code(ExitCode::InvalidArgs);
                    return Err(Interrupt::exit("arguments after 'shell'"));
                }
            }
        }

        let plus_repos = parsed.values("plus-repo");
        if !plus_repos.is_empty() {
            if self.command.manages_repos() {
                self.console
                    .err("The --plus-repo option has no effect here, ignoring.");
            } else {
                for value in plus_repos {
                    let url = match Url::parse(value) {
                        Ok(url) => url,
                        Err(e) => {
                            self.console.err(Error::InvalidUrl {
                                url: value.clone(),
                                reason: e.to_string(),
                            });
                            self.set_exit_code(ExitCode::InvalidArgs);
                            return Err(Interrupt::exit("invalid --plus-repo URI"));
                        }
                    };
                    let repo = RepoInfo::additional(self.data.additional_repos.len() + 1, url);
                    debug!("Additional repository {} -> {}", repo.alias, repo.name);
                    self.data.additional_repos.push(repo);
                }
            }
        }

        self.command_args = rest.collect();
        debug!("Done processing global options, command {:?}", self.command);
        Ok(())
    }

    pub(crate) fn print_main_help(&mut self) {
        self.console.out(cli::MAIN_HELP);
        let hint = cli::command_help_hint(self.running_shell);
        self.console.out(hint);
    }

    fn show_command_help(&mut self, desc: &CommandDescriptor) {
        self.console.out(desc.help);
        if desc.command == Command::Help {
            self.console.out(cli::unknown_command_hint(self.running_shell));
            self.console.out(cli::command_help_hint(self.running_shell));
        }
    }

    /// Parse the command options and take the preconditions of the command
    pub fn process_command_options(&mut self) -> Flow {
        debug!("Processing options of command {:?}", self.command);

        // inside the shell `help` arrives as a command word
        if self.command == Command::Help {
            match self.command_args.first().cloned() {
                Some(arg) => {
                    self.running_help = true;
                    match self.registry.resolve(&arg) {
                        Ok(command) => self.command = command,
                        Err(e) if !is_help_flag(&arg) => {
                            self.console.out(e);
                            self.console.out(cli::unknown_command_hint(self.running_shell));
                            return Err(Interrupt::exit("help for an unknown command"));
                        }
                        Err(_) => {}
                    }
                }
                None => {
                    self.print_main_help();
                    return Err(Interrupt::exit("main help printed"));
                }
            }
        }

        let Some(desc) = cli::descriptor(self.command) else {
            return Ok(());
        };
        self.command_help = desc.help;

        if self.running_help {
            self.show_command_help(desc);
            return Ok(());
        }

        let copts = match parse_options(&self.command_args, desc.options, ScanMode::Permute) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.console.err(e);
                self.console.err(cli::command_help_hint(self.running_shell));
                self.set_exit_code(ExitCode::SyntaxError);
                return Err(Interrupt::exit("missing option argument"));
            }
        };
        if copts.has_unknown() {
            for token in copts.unknown() {
                self.console.err(format!("Unknown option '{token}'"));
            }
            self.console.err(cli::command_help_hint(self.running_shell));
            self.set_exit_code(ExitCode::SyntaxError);
            return Err(Interrupt::exit("unknown command option"));
        }
        debug!("Done parsing options: {:?}", copts.names().collect::<Vec<_>>());

        self.arguments = copts.positionals().to_vec();
        let wants_help = copts.contains("help");
        self.copts = copts;
        if wants_help {
            self.running_help = true;
            self.show_command_help(desc);
            return Ok(());
        }

        if !self.arguments.is_empty() {
            let listed: String = self.arguments.iter().map(|a| format!("'{a}' ")).collect();
            self.console
                .verbose(format!("Non-option program arguments: {listed}"));
        }

        if let Some(message) = desc.privilege {
            if !self.host.is_root {
                warn!("{} needs root privileges", desc.command);
                self.console.err(message);
                self.set_exit_code(ExitCode::PrivilegeError);
                return Err(Interrupt::exit("insufficient privileges"));
            }
        }

        if desc.needs_lock {
            self.acquire_lock()?;
        }
        Ok(())
    }

    fn acquire_lock(&mut self) -> Flow {
        match self.manager().lock() {
            Ok(()) => {
                debug!("Package management lock acquired");
                self.locked = true;
                Ok(())
            }
            Err(Error::Locked { pid }) => {
                error!("Package management lock held by {:?}", pid);
                let message = match pid {
                    Some(pid) => format!("{LOCK_CONFLICT} (The lock is held by process {pid}.)"),
                    None => LOCK_CONFLICT.to_string(),
                };
                self.console.error_message(message);
                self.set_exit_code(ExitCode::ZyppError);
                Err(Interrupt::exit("package management lock held elsewhere"))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn release_lock(&mut self) {
        if !self.locked {
            return;
        }
        if let Some(manager) = self.manager.as_mut() {
            manager.unlock();
        }
        self.locked = false;
        debug!("Package management lock released");
    }

    fn report_interrupt(&mut self, interrupt: Interrupt) {
        match interrupt {
            Interrupt::Abort(message) => {
                info!("User abort: {}", message);
                self.console.err(message);
            }
            Interrupt::Exit(reason) => debug!("Caught exit request: {}", reason),
            Interrupt::Failed(e) => {
                error!("Unexpected error in {:?}: {}", self.command, e);
                self.console.err("Unexpected exception.");
                self.console.err(&e);
                self.console.err(BUG_REPORT_HINT);
                if !self.exit_code.is_error() {
                    self.set_exit_code(ExitCode::Bug);
                }
            }
        }
    }

    fn do_command(&mut self) -> Flow {
        if self.command == Command::None || self.running_help || !self.exit_code.is_ok() {
            return Ok(());
        }
        let Some(desc) = cli::descriptor(self.command) else {
            return Ok(());
        };
        info!("Running command {}", self.command);
        (desc.handler)(self)
    }

    /// Parse command options and run the command, isolating any failure
    ///
    /// Nothing escapes: the outcome ends up in the exit code and on the
    /// console, the lock is released and the machine-readable stream is
    /// closed. In the shell that happens once per line.
    pub fn safe_do_command(&mut self) {
        let outcome = self.process_command_options().and_then(|()| self.do_command());
        if let Err(interrupt) = outcome {
            self.report_interrupt(interrupt);
        }
        self.release_lock();
        if self.gopts.machine_readable {
            self.console.close_stream();
            self.stream_open = false;
        }
    }

    /// Bring the per-command state back to the baseline for the next shell line
    pub fn reset_for_next_command(&mut self) {
        debug!("Cleaning up after {:?}", self.command);
        if self.command.marks_selections() {
            if let Some(manager) = self.manager.as_mut() {
                manager.clear_selections();
            }
        }
        self.arguments.clear();
        self.command_args.clear();
        self.copts = ParsedOptions::default();
        self.cmdopts = CommandSettings::default();
        self.command_help = "";
        self.command = Command::None;
        self.running_help = false;
        self.exit_code = ExitCode::Ok;
        self.data.current_repo = None;
    }

    /// Retract the additional repositories from the resource manager
    ///
    /// Safe to call more than once; runs again when the session is dropped.
    pub fn cleanup(&mut self) {
        let registered = std::mem::take(&mut self.data.registered_repos);
        if registered.is_empty() {
            return;
        }
        debug!("Removing {} additional repositories", registered.len());
        if let Some(manager) = self.manager.as_mut() {
            for alias in registered {
                if let Err(e) = manager.remove_repository(&alias) {
                    warn!("Cannot remove additional repository {}: {}", alias, e);
                }
            }
        }
    }

    pub(crate) fn close_stream(&mut self) {
        if self.stream_open {
            self.console.close_stream();
            self.stream_open = false;
        }
    }

    pub(crate) fn set_running_shell(&mut self, on: bool) {
        self.running_shell = on;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release_lock();
        self.cleanup();
    }
}

// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use zypper::manager::{
    CommitResult, RefreshOptions, RefreshStatus, RepoInfo, Resolvable, ResolvableKind, Selection,
};
use zypper::session::ManagerFactory;
use zypper::{
    Console, Error, GlobalOptions, Host, LineReader, ReadOutcome, ResourceManager, Result, Session,
};

/// Writer whose contents stay readable after the console took it
#[derive(Clone, Default)]
pub struct Buf(Rc<RefCell<Vec<u8>>>);

impl Buf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for Buf {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What the mock resource manager was asked to do, plus its canned data
#[derive(Default)]
pub struct MockState {
    /// One entry per call, e.g. `lock`, `add tmp1`, `mark install foo`
    pub calls: Vec<String>,
    /// Another process holds the lock
    pub lock_holder: Option<Option<u32>>,
    pub repos: Vec<RepoInfo>,
    pub pool: Vec<Resolvable>,
    pub fail_load: bool,
    pub commit_result: CommitResult,
}

impl MockState {
    pub fn called(&self, call: &str) -> bool {
        self.calls.iter().any(|c| c == call)
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

pub type SharedState = Rc<RefCell<MockState>>;

/// Resource manager that records every call in a [`MockState`]
pub struct MockManager {
    state: SharedState,
    pool: Vec<Resolvable>,
    selections: Vec<Selection>,
}

impl MockManager {
    pub fn new(state: SharedState) -> Self {
        state.borrow_mut().calls.push("create".to_string());
        Self {
            state,
            pool: Vec::new(),
            selections: Vec::new(),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.state.borrow_mut().calls.push(call.into());
    }
}

impl ResourceManager for MockManager {
    fn lock(&mut self) -> Result<()> {
        self.record("lock");
        match self.state.borrow().lock_holder {
            Some(pid) => Err(Error::Locked { pid }),
            None => Ok(()),
        }
    }

    fn unlock(&mut self) {
        self.record("unlock");
    }

    fn repositories(&self) -> Result<Vec<RepoInfo>> {
        Ok(self.state.borrow().repos.clone())
    }

    fn add_repository(&mut self, repo: &RepoInfo) -> Result<()> {
        self.record(format!("add {}", repo.alias));
        self.state.borrow_mut().repos.push(repo.clone());
        Ok(())
    }

    fn remove_repository(&mut self, alias: &str) -> Result<()> {
        self.record(format!("remove {alias}"));
        let mut state = self.state.borrow_mut();
        let before = state.repos.len();
        state.repos.retain(|r| r.alias != alias);
        if state.repos.len() == before {
            return Err(Error::RepoNotFound(alias.to_string()));
        }
        Ok(())
    }

    fn modify_repository(&mut self, alias: &str, repo: &RepoInfo) -> Result<()> {
        self.record(format!("modify {alias}"));
        let mut state = self.state.borrow_mut();
        match state.repos.iter_mut().find(|r| r.alias == alias) {
            Some(existing) => {
                *existing = repo.clone();
                Ok(())
            }
            None => Err(Error::RepoNotFound(alias.to_string())),
        }
    }

    fn refresh_repository(&mut self, repo: &RepoInfo, _options: RefreshOptions) -> Result<RefreshStatus> {
        self.record(format!("refresh {}", repo.alias));
        Ok(RefreshStatus::UpToDate)
    }

    fn load_resolvables(&mut self, _repos: &[RepoInfo], installed: bool) -> Result<()> {
        self.record("load");
        let state = self.state.borrow();
        if state.fail_load {
            return Err(Error::other("metadata cache is corrupt"));
        }
        self.pool = state
            .pool
            .iter()
            .filter(|r| installed || !r.installed)
            .cloned()
            .collect();
        Ok(())
    }

    fn pool(&self) -> &[Resolvable] {
        &self.pool
    }

    fn mark(&mut self, selection: Selection) {
        self.record(format!(
            "mark {:?} {}",
            selection.action, selection.resolvable.name
        ));
        self.selections.push(selection);
    }

    fn selections(&self) -> &[Selection] {
        &self.selections
    }

    fn clear_selections(&mut self) {
        self.record("clear_selections");
        self.selections.clear();
    }

    fn resolve(&mut self) -> Result<()> {
        self.record("resolve");
        Ok(())
    }

    fn write_solver_testcase(&self, dir: &Path) -> Result<()> {
        self.record(format!("testcase {}", dir.display()));
        Ok(())
    }

    fn commit(&mut self, dry_run: bool) -> Result<CommitResult> {
        self.record(if dry_run { "commit dry-run" } else { "commit" });
        self.selections.clear();
        Ok(self.state.borrow().commit_result)
    }
}

pub fn mock_factory(state: &SharedState) -> ManagerFactory {
    let state = Rc::clone(state);
    Box::new(move |_: &GlobalOptions| -> Box<dyn ResourceManager> {
        Box::new(MockManager::new(Rc::clone(&state)))
    })
}

/// What the scripted reader saw
#[derive(Default)]
pub struct ReaderLog {
    pub prompts: usize,
    pub history: Vec<String>,
    pub loaded: Vec<PathBuf>,
    pub saved: Vec<PathBuf>,
}

/// Line reader replaying a fixed script, then reporting end of input
pub struct ScriptedReader {
    script: VecDeque<ReadOutcome>,
    log: Rc<RefCell<ReaderLog>>,
}

impl ScriptedReader {
    pub fn new(lines: &[&str]) -> (Self, Rc<RefCell<ReaderLog>>) {
        let script = lines.iter().map(|l| ReadOutcome::Line(l.to_string())).collect();
        Self::from_outcomes(script)
    }

    pub fn from_outcomes(script: Vec<ReadOutcome>) -> (Self, Rc<RefCell<ReaderLog>>) {
        let log = Rc::new(RefCell::new(ReaderLog::default()));
        let reader = Self {
            script: script.into(),
            log: Rc::clone(&log),
        };
        (reader, log)
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
        self.log.borrow_mut().prompts += 1;
        Ok(self.script.pop_front().unwrap_or(ReadOutcome::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.log.borrow_mut().history.push(line.to_string());
    }

    fn load_history(&mut self, path: &Path) -> Result<()> {
        self.log.borrow_mut().loaded.push(path.to_path_buf());
        Ok(())
    }

    fn save_history(&mut self, path: &Path) -> Result<()> {
        self.log.borrow_mut().saved.push(path.to_path_buf());
        Ok(())
    }
}

/// A session wired to captured output and a mock resource manager
pub struct Harness {
    pub session: Session,
    pub out: Buf,
    pub err: Buf,
    pub state: SharedState,
}

impl Harness {
    pub fn new(is_root: bool) -> Self {
        Self::with_input(is_root, "")
    }

    /// Harness whose prompts read their answers from `input`
    pub fn with_input(is_root: bool, input: &str) -> Self {
        Self::build(is_root, input, None)
    }

    pub fn with_history(is_root: bool, history_path: PathBuf) -> Self {
        Self::build(is_root, "", Some(history_path))
    }

    fn build(is_root: bool, input: &str, history_path: Option<PathBuf>) -> Self {
        let out = Buf::default();
        let err = Buf::default();
        let state: SharedState = Rc::new(RefCell::new(MockState::default()));
        let console = Console::with_input(
            Box::new(out.clone()),
            Box::new(err.clone()),
            Box::new(Cursor::new(input.as_bytes().to_vec())),
        );
        let host = Host {
            is_root,
            history_path,
        };
        let session = Session::new(console, host, mock_factory(&state));
        Self {
            session,
            out,
            err,
            state,
        }
    }

    pub fn run(&mut self, args: &[&str]) -> zypper::ExitCode {
        self.session.run(&args_of(args))
    }

    /// Feed the shell from `reader` instead of the terminal
    pub fn script(&mut self, reader: ScriptedReader) {
        self.session.set_line_reader(Box::new(reader));
    }

    pub fn stdout(&self) -> String {
        self.out.contents()
    }

    pub fn stderr(&self) -> String {
        self.err.contents()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }
}

pub fn args_of(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

pub fn repo(alias: &str, url: &str) -> RepoInfo {
    RepoInfo::new(alias, url::Url::parse(url).unwrap())
}

pub fn available(kind: ResolvableKind, name: &str, edition: &str, repo: &str) -> Resolvable {
    let mut r = Resolvable::new(kind, name, edition);
    r.repo = repo.to_string();
    r
}

pub fn installed(kind: ResolvableKind, name: &str, edition: &str) -> Resolvable {
    let mut r = Resolvable::new(kind, name, edition);
    r.installed = true;
    r.repo = "@System".to_string();
    r
}

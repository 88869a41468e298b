// src/options.rs

//! Global options and per-command settings

use crate::table::TableStyle;
use std::path::{Path, PathBuf};

/// Default location of the `.repo` definition files
pub const DEFAULT_KNOWN_REPOS_PATH: &str = "/etc/zypp/repos.d";
/// Default location of the parsed metadata cache
pub const DEFAULT_REPO_CACHE_PATH: &str = "/var/cache/zypp";
/// Default location of the raw (downloaded) metadata cache
pub const DEFAULT_REPO_RAW_CACHE_PATH: &str = "/var/cache/zypp/raw";

/// Paths the resource manager works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoManagerOptions {
    pub known_repos_path: PathBuf,
    pub repo_cache_path: PathBuf,
    pub repo_raw_cache_path: PathBuf,
}

impl Default for RepoManagerOptions {
    fn default() -> Self {
        Self {
            known_repos_path: PathBuf::from(DEFAULT_KNOWN_REPOS_PATH),
            repo_cache_path: PathBuf::from(DEFAULT_REPO_CACHE_PATH),
            repo_raw_cache_path: PathBuf::from(DEFAULT_REPO_RAW_CACHE_PATH),
        }
    }
}

impl RepoManagerOptions {
    /// Move all three paths under `root`
    pub fn prefix_root(&mut self, root: &Path) {
        self.known_repos_path = under_root(root, &self.known_repos_path);
        self.repo_cache_path = under_root(root, &self.repo_cache_path);
        self.repo_raw_cache_path = under_root(root, &self.repo_raw_cache_path);
    }
}

/// `root` + `path`, keeping `path` inside `root` even when it is absolute
pub fn under_root(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

/// Options given before the command word
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// -1 quiet, 0 normal, >0 verbose
    pub verbosity: i32,
    pub non_interactive: bool,
    /// `--terse`: wrap output in the XML stream envelope
    pub machine_readable: bool,
    pub rug_compatible: bool,
    pub no_gpg_checks: bool,
    pub root_dir: PathBuf,
    pub rm_options: RepoManagerOptions,
    pub table_style: TableStyle,
    /// `--disable-repositories`: work with installed resolvables only
    pub disable_system_sources: bool,
    pub no_refresh: bool,
    pub disable_system_resolvables: bool,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            non_interactive: false,
            machine_readable: false,
            rug_compatible: false,
            no_gpg_checks: false,
            root_dir: PathBuf::from("/"),
            rm_options: RepoManagerOptions::default(),
            table_style: TableStyle::default(),
            disable_system_sources: false,
            no_refresh: false,
            disable_system_resolvables: false,
        }
    }
}

impl GlobalOptions {
    /// `--root` was given with something other than `/`
    pub fn has_alternate_root(&self) -> bool {
        self.root_dir != Path::new("/")
    }

    /// Where downloaded RPM files given on the command line are cached
    pub fn rpm_cache_dir(&self) -> PathBuf {
        under_root(&self.root_dir, Path::new(RPM_CACHE_DIR))
    }

    /// Package management lock file
    pub fn lock_path(&self) -> PathBuf {
        under_root(&self.root_dir, Path::new(LOCK_FILE))
    }

    /// Installed resolvables database
    pub fn installed_db_path(&self) -> PathBuf {
        under_root(&self.root_dir, Path::new(INSTALLED_DB))
    }

    /// Where `--debug-solver` writes its test case
    pub fn solver_testcase_path(&self) -> PathBuf {
        under_root(&self.root_dir, Path::new(SOLVER_TESTCASE_DIR))
    }
}

pub const RPM_CACHE_DIR: &str = "/var/cache/zypper/RPMS";
pub const LOCK_FILE: &str = "/var/run/zypp.pid";
pub const INSTALLED_DB: &str = "/var/lib/zypp/installed.json";
pub const SOLVER_TESTCASE_DIR: &str = "/var/log/zypper.solverTestCase";

/// Settings derived from command options that outlive option parsing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSettings {
    pub license_auto_agree: bool,
}

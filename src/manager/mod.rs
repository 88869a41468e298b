// src/manager/mod.rs

//! Resource manager boundary
//!
//! Everything that touches package state goes through [`ResourceManager`]:
//! the package management lock, repository definitions, metadata refresh,
//! the resolvable pool, the solver and the transaction commit. The command
//! layer only decides what to ask for and how to report the outcome.
//!
//! [`LocalManager`] is the filesystem-backed implementation shipped with
//! the binary.

mod local;
mod lock;
pub mod repofile;

pub use local::{rpm_file_nevra, LocalManager};
pub use lock::PackageLock;

use crate::edition::Edition;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// Alias under which resolvables of the installed system are reported
pub const SYSTEM_REPO_ALIAS: &str = "@System";

/// Kind of a resolvable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvableKind {
    Package,
    Patch,
    Pattern,
    Product,
    #[serde(rename = "srcpackage")]
    SrcPackage,
}

impl ResolvableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvableKind::Package => "package",
            ResolvableKind::Patch => "patch",
            ResolvableKind::Pattern => "pattern",
            ResolvableKind::Product => "product",
            ResolvableKind::SrcPackage => "srcpackage",
        }
    }
}

impl FromStr for ResolvableKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "package" => Ok(ResolvableKind::Package),
            "patch" => Ok(ResolvableKind::Patch),
            "pattern" => Ok(ResolvableKind::Pattern),
            "product" => Ok(ResolvableKind::Product),
            "srcpackage" => Ok(ResolvableKind::SrcPackage),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for ResolvableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository metadata format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoType {
    #[default]
    RpmMd,
    Yast2,
    /// Directory of RPM files without metadata
    PlainDir,
}

impl RepoType {
    pub fn as_str(self) -> &'static str {
        match self {
            RepoType::RpmMd => "rpm-md",
            RepoType::Yast2 => "yast2",
            RepoType::PlainDir => "plaindir",
        }
    }
}

impl FromStr for RepoType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rpm-md" | "rpm" | "rpmmd" | "repomd" | "yum" | "up2date" => Ok(RepoType::RpmMd),
            "yast2" | "susetags" | "yast" | "ya" => Ok(RepoType::Yast2),
            "plaindir" | "plain" | "dir" => Ok(RepoType::PlainDir),
            _ => Err(Error::UnknownRepoType(s.to_string())),
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub alias: String,
    pub name: String,
    pub base_urls: Vec<Url>,
    pub enabled: bool,
    pub autorefresh: bool,
    pub repo_type: RepoType,
    /// Lives only for this process (`--plus-repo`, RPM file cache)
    pub ephemeral: bool,
}

impl RepoInfo {
    pub fn new(alias: impl Into<String>, url: Url) -> Self {
        let alias = alias.into();
        Self {
            name: alias.clone(),
            alias,
            base_urls: vec![url],
            enabled: true,
            autorefresh: true,
            repo_type: RepoType::default(),
            ephemeral: false,
        }
    }

    /// Repository added for this invocation only with `--plus-repo`
    ///
    /// `index` counts from 1 and gives the alias `tmp<index>`.
    pub fn additional(index: usize, url: Url) -> Self {
        let mut repo = Self::new(format!("tmp{index}"), url.clone());
        repo.name = url.to_string();
        repo.ephemeral = true;
        repo
    }

    pub fn url(&self) -> Option<&Url> {
        self.base_urls.first()
    }

    /// Display name, falling back to the alias
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.alias
        } else {
            &self.name
        }
    }
}

/// A package, patch, pattern, product or source package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolvable {
    pub name: String,
    pub kind: ResolvableKind,
    pub edition: String,
    #[serde(default = "default_arch")]
    pub arch: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    /// Alias of the repository providing it
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub installed: bool,
    /// Patch category: security, recommended, optional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub affects_package_manager: bool,
    #[serde(default)]
    pub reboot_suggested: bool,
    #[serde(default)]
    pub restart_suggested: bool,
    /// License text that must be confirmed before installation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

fn default_arch() -> String {
    "noarch".to_string()
}

impl Resolvable {
    pub fn new(kind: ResolvableKind, name: &str, edition: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            edition: edition.to_string(),
            arch: default_arch(),
            summary: String::new(),
            description: String::new(),
            repo: String::new(),
            installed: false,
            category: None,
            interactive: false,
            affects_package_manager: false,
            reboot_suggested: false,
            restart_suggested: false,
            license: None,
        }
    }

    /// Parsed edition; unparsable editions compare as `0`
    pub fn parsed_edition(&self) -> Edition {
        Edition::parse(&self.edition).unwrap_or(Edition {
            epoch: 0,
            version: "0".to_string(),
            release: None,
        })
    }

    pub fn is_security(&self) -> bool {
        self.category.as_deref() == Some("security")
    }
}

/// What to do with a marked resolvable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Remove,
}

/// A resolvable marked for the next transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub action: Action,
    pub resolvable: Resolvable,
}

impl Selection {
    pub fn install(resolvable: Resolvable) -> Self {
        Self {
            action: Action::Install,
            resolvable,
        }
    }

    pub fn remove(resolvable: Resolvable) -> Self {
        Self {
            action: Action::Remove,
            resolvable,
        }
    }
}

/// How hard `refresh` should work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    pub force_download: bool,
    pub force_build: bool,
    pub download_only: bool,
    pub build_only: bool,
}

/// What a refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Refreshed,
    UpToDate,
}

/// Outcome of a committed transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitResult {
    pub installed: usize,
    pub removed: usize,
    pub reboot_needed: bool,
    pub restart_needed: bool,
}

/// Service interface to the package management backend
pub trait ResourceManager {
    /// Take the exclusive package management lock without waiting
    ///
    /// Fails with [`Error::Locked`] when another process holds it.
    fn lock(&mut self) -> Result<()>;

    /// Release the lock taken by [`ResourceManager::lock`]; no-op if not held
    fn unlock(&mut self);

    /// All known repositories, persistent and registered ephemeral ones
    fn repositories(&self) -> Result<Vec<RepoInfo>>;

    fn add_repository(&mut self, repo: &RepoInfo) -> Result<()>;

    fn remove_repository(&mut self, alias: &str) -> Result<()>;

    /// Replace the definition stored under `alias` (which may rename it)
    fn modify_repository(&mut self, alias: &str, repo: &RepoInfo) -> Result<()>;

    fn refresh_repository(&mut self, repo: &RepoInfo, options: RefreshOptions) -> Result<RefreshStatus>;

    /// Fill the pool from `repos`, plus the installed system when `installed`
    fn load_resolvables(&mut self, repos: &[RepoInfo], installed: bool) -> Result<()>;

    fn pool(&self) -> &[Resolvable];

    fn mark(&mut self, selection: Selection);

    fn selections(&self) -> &[Selection];

    fn clear_selections(&mut self);

    /// Check the marked selections against the pool
    fn resolve(&mut self) -> Result<()>;

    /// Dump the solver input for debugging instead of committing
    fn write_solver_testcase(&self, dir: &Path) -> Result<()>;

    fn commit(&mut self, dry_run: bool) -> Result<CommitResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("patch".parse::<ResolvableKind>().unwrap(), ResolvableKind::Patch);
        assert_eq!("srcpackage".parse::<ResolvableKind>().unwrap(), ResolvableKind::SrcPackage);
        assert!(matches!(
            "bundle".parse::<ResolvableKind>(),
            Err(Error::UnknownKind(k)) if k == "bundle"
        ));
    }

    #[test]
    fn test_repo_type_aliases() {
        assert_eq!("YUM".parse::<RepoType>().unwrap(), RepoType::RpmMd);
        assert_eq!("susetags".parse::<RepoType>().unwrap(), RepoType::Yast2);
        assert!("nfs".parse::<RepoType>().is_err());
    }

    #[test]
    fn test_additional_repo() {
        let url = Url::parse("http://example.com/repo").unwrap();
        let repo = RepoInfo::additional(2, url);
        assert_eq!(repo.alias, "tmp2");
        assert_eq!(repo.name, "http://example.com/repo");
        assert!(repo.enabled && repo.autorefresh && repo.ephemeral);
    }

    #[test]
    fn test_resolvable_json_defaults() {
        let r: Resolvable =
            serde_json::from_str(r#"{"name":"vim","kind":"package","edition":"9.0-1"}"#).unwrap();
        assert_eq!(r.arch, "noarch");
        assert!(!r.installed);
        assert_eq!(r.parsed_edition(), Edition::parse("9.0-1").unwrap());

        let patch: Resolvable = serde_json::from_str(
            r#"{"name":"p","kind":"patch","edition":"1","category":"security"}"#,
        )
        .unwrap();
        assert!(patch.is_security());
    }
}

// src/manager/local.rs

//! Filesystem-backed resource manager
//!
//! Layout, all relative to the configured paths:
//!
//! - `<reposd>/<alias>.repo`: repository definitions
//! - `<raw-cache>/<alias>/resolvables.json`: metadata as fetched
//! - `<cache>/<alias>/resolvables.json`: metadata ready for loading
//! - `<root>/var/lib/zypp/installed.json`: the installed system
//!
//! Only local repositories (`file://`, `dir://`) can be refreshed. A
//! repository directory carries its metadata in `resolvables.json`; a
//! `plaindir` repository is a directory of RPM files whose names give the
//! name, edition and architecture.

use super::lock::PackageLock;
use super::{
    repofile, Action, CommitResult, RefreshOptions, RefreshStatus, RepoInfo, RepoType,
    Resolvable, ResolvableKind, ResourceManager, Selection, SYSTEM_REPO_ALIAS,
};
use crate::error::{Error, Result};
use crate::options::GlobalOptions;
use crate::options::RepoManagerOptions;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

const METADATA_FILE: &str = "resolvables.json";
const SOLVER_TESTCASE_FILE: &str = "solver-test.json";

pub struct LocalManager {
    paths: RepoManagerOptions,
    lock_path: PathBuf,
    installed_db: PathBuf,
    lock: Option<PackageLock>,
    /// Registered ephemeral repositories, never written to disk
    ephemeral: Vec<RepoInfo>,
    pool: Vec<Resolvable>,
    selections: Vec<Selection>,
    resolved: bool,
}

impl LocalManager {
    pub fn new(gopts: &GlobalOptions) -> Self {
        Self {
            paths: gopts.rm_options.clone(),
            lock_path: gopts.lock_path(),
            installed_db: gopts.installed_db_path(),
            lock: None,
            ephemeral: Vec::new(),
            pool: Vec::new(),
            selections: Vec::new(),
            resolved: false,
        }
    }

    fn repo_file(&self, alias: &str) -> PathBuf {
        self.paths.known_repos_path.join(format!("{alias}.repo"))
    }

    fn cache_file(&self, alias: &str) -> PathBuf {
        self.paths.repo_cache_path.join(alias).join(METADATA_FILE)
    }

    fn raw_cache_file(&self, alias: &str) -> PathBuf {
        self.paths.repo_raw_cache_path.join(alias).join(METADATA_FILE)
    }

    /// Persistent repositories with the file each one is defined in
    fn stored_repos(&self) -> Result<Vec<(PathBuf, RepoInfo)>> {
        let dir = &self.paths.known_repos_path;
        if !dir.is_dir() {
            debug!("No repository directory at {:?}", dir);
            return Ok(Vec::new());
        }

        let pattern = dir.join("*.repo");
        let entries = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| Error::other(format!("bad repository path {:?}: {}", dir, e)))?;

        let mut repos = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            let text = fs::read_to_string(&path)?;
            for repo in repofile::parse(&text, &path.to_string_lossy())? {
                repos.push((path.clone(), repo));
            }
        }
        repos.sort_by(|a, b| a.1.alias.cmp(&b.1.alias));
        Ok(repos)
    }

    fn alias_in_use(&self, alias: &str) -> Result<bool> {
        Ok(self.ephemeral.iter().any(|r| r.alias == alias)
            || self.stored_repos()?.iter().any(|(_, r)| r.alias == alias))
    }

    /// Rewrite the file `path` without `alias`, applying `replacement` if given
    fn rewrite_repo_file(&self, path: &Path, alias: &str, replacement: Option<&RepoInfo>) -> Result<()> {
        let text = fs::read_to_string(path)?;
        let mut repos = repofile::parse(&text, &path.to_string_lossy())?;
        repos.retain(|r| r.alias != alias);

        if let Some(repo) = replacement {
            // renamed repositories move to their own file
            if path == self.repo_file(alias) && repos.is_empty() {
                fs::remove_file(path)?;
                return self.write_repo_file(&self.repo_file(&repo.alias), &[repo.clone()]);
            }
            repos.push(repo.clone());
        }

        if repos.is_empty() {
            fs::remove_file(path)?;
            Ok(())
        } else {
            self.write_repo_file(path, &repos)
        }
    }

    fn write_repo_file(&self, path: &Path, repos: &[RepoInfo]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, repofile::write(repos))?;
        Ok(())
    }

    fn read_installed(&self) -> Result<Vec<Resolvable>> {
        if !self.installed_db.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.installed_db)?;
        let mut installed: Vec<Resolvable> = serde_json::from_str(&text)?;
        for r in &mut installed {
            r.installed = true;
            r.repo = SYSTEM_REPO_ALIAS.to_string();
        }
        Ok(installed)
    }

    fn write_installed(&self, installed: &[Resolvable]) -> Result<()> {
        if let Some(parent) = self.installed_db.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.installed_db.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(installed)?)?;
        fs::rename(&tmp, &self.installed_db)?;
        Ok(())
    }

    /// Fetch metadata for `repo` from its base URL
    fn fetch(&self, repo: &RepoInfo) -> Result<Vec<Resolvable>> {
        let url = repo
            .url()
            .ok_or_else(|| Error::other(format!("Repository '{}' has no URI", repo.alias)))?;
        let dir = local_dir(url).ok_or_else(|| {
            Error::other(format!(
                "Cannot download metadata of '{}': unsupported URI scheme '{}'",
                repo.alias,
                url.scheme()
            ))
        })?;

        if repo.repo_type == RepoType::PlainDir {
            return scan_rpm_dir(&dir);
        }

        let path = dir.join(METADATA_FILE);
        let text = fs::read_to_string(&path).map_err(|e| {
            Error::other(format!("Cannot read metadata of '{}' from {:?}: {}", repo.alias, path, e))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    fn read_cache(&self, alias: &str) -> Result<Option<Vec<Resolvable>>> {
        let path = self.cache_file(alias);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// Local directory behind a `file://` or `dir://` URL
fn local_dir(url: &Url) -> Option<PathBuf> {
    match url.scheme() {
        "file" | "dir" => Some(PathBuf::from(url.path())),
        _ => None,
    }
}

fn write_json(path: &Path, resolvables: &[Resolvable]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(resolvables)?)?;
    Ok(())
}

/// Resolvables for every parsable `*.rpm` in `dir`
fn scan_rpm_dir(dir: &Path) -> Result<Vec<Resolvable>> {
    let pattern = dir.join("*.rpm");
    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| Error::other(format!("bad directory {:?}: {}", dir, e)))?;

    let mut found = Vec::new();
    for path in entries.flatten() {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match rpm_file_nevra(file_name) {
            Some((name, edition, arch)) => {
                let kind = if arch == "src" || arch == "nosrc" {
                    ResolvableKind::SrcPackage
                } else {
                    ResolvableKind::Package
                };
                let mut r = Resolvable::new(kind, &name, &edition);
                r.arch = arch;
                found.push(r);
            }
            None => warn!("Skipping {:?}: not a name-version-release.arch.rpm file", path),
        }
    }
    Ok(found)
}

/// Split `name-version-release.arch.rpm` into (name, version-release, arch)
pub fn rpm_file_nevra(file_name: &str) -> Option<(String, String, String)> {
    let stem = file_name.strip_suffix(".rpm")?;
    let (nvr, arch) = stem.rsplit_once('.')?;
    let (nv, release) = nvr.rsplit_once('-')?;
    let (name, version) = nv.rsplit_once('-')?;
    if name.is_empty() || version.is_empty() || release.is_empty() || arch.is_empty() {
        return None;
    }
    Some((name.to_string(), format!("{version}-{release}"), arch.to_string()))
}

impl ResourceManager for LocalManager {
    fn lock(&mut self) -> Result<()> {
        if self.lock.is_none() {
            self.lock = Some(PackageLock::acquire(&self.lock_path)?);
        }
        Ok(())
    }

    fn unlock(&mut self) {
        self.lock = None;
    }

    fn repositories(&self) -> Result<Vec<RepoInfo>> {
        let mut repos: Vec<RepoInfo> = self.stored_repos()?.into_iter().map(|(_, r)| r).collect();
        repos.extend(self.ephemeral.iter().cloned());
        Ok(repos)
    }

    fn add_repository(&mut self, repo: &RepoInfo) -> Result<()> {
        if self.alias_in_use(&repo.alias)? {
            return Err(Error::RepoExists(repo.alias.clone()));
        }
        if repo.ephemeral {
            // nothing gets cached for it, so its source has to be readable now
            self.fetch(repo)?;
            debug!("Registering ephemeral repository {}", repo.alias);
            self.ephemeral.push(repo.clone());
            return Ok(());
        }
        info!("Adding repository {} to {:?}", repo.alias, self.paths.known_repos_path);
        self.write_repo_file(&self.repo_file(&repo.alias), std::slice::from_ref(repo))
    }

    fn remove_repository(&mut self, alias: &str) -> Result<()> {
        if let Some(pos) = self.ephemeral.iter().position(|r| r.alias == alias) {
            debug!("Unregistering ephemeral repository {}", alias);
            self.ephemeral.remove(pos);
        } else {
            let (path, _) = self
                .stored_repos()?
                .into_iter()
                .find(|(_, r)| r.alias == alias)
                .ok_or_else(|| Error::RepoNotFound(alias.to_string()))?;
            info!("Removing repository {} from {:?}", alias, path);
            self.rewrite_repo_file(&path, alias, None)?;
        }

        for cache in [self.cache_file(alias), self.raw_cache_file(alias)] {
            if let Some(dir) = cache.parent().filter(|d| d.exists()) {
                if let Err(e) = fs::remove_dir_all(dir) {
                    warn!("Failed to remove cache {:?}: {}", dir, e);
                }
            }
        }
        Ok(())
    }

    fn modify_repository(&mut self, alias: &str, repo: &RepoInfo) -> Result<()> {
        if repo.alias != alias && self.alias_in_use(&repo.alias)? {
            return Err(Error::RepoExists(repo.alias.clone()));
        }
        if let Some(existing) = self.ephemeral.iter_mut().find(|r| r.alias == alias) {
            *existing = repo.clone();
            return Ok(());
        }
        let (path, _) = self
            .stored_repos()?
            .into_iter()
            .find(|(_, r)| r.alias == alias)
            .ok_or_else(|| Error::RepoNotFound(alias.to_string()))?;
        self.rewrite_repo_file(&path, alias, Some(repo))
    }

    fn refresh_repository(&mut self, repo: &RepoInfo, options: RefreshOptions) -> Result<RefreshStatus> {
        let raw = self.raw_cache_file(&repo.alias);
        let cache = self.cache_file(&repo.alias);
        let mut status = RefreshStatus::UpToDate;

        let mut downloaded = false;
        if !options.build_only && (options.force_download || !raw.exists()) {
            debug!("Fetching metadata of {}", repo.alias);
            let resolvables = self.fetch(repo)?;
            write_json(&raw, &resolvables)?;
            downloaded = true;
            status = RefreshStatus::Refreshed;
        }

        if !options.download_only && (downloaded || options.force_build || !cache.exists()) {
            let text = fs::read_to_string(&raw).map_err(|e| {
                Error::other(format!("No raw metadata for '{}' to build from: {}", repo.alias, e))
            })?;
            let mut resolvables: Vec<Resolvable> = serde_json::from_str(&text)?;
            for r in &mut resolvables {
                r.repo = repo.alias.clone();
                r.installed = false;
            }
            write_json(&cache, &resolvables)?;
            status = RefreshStatus::Refreshed;
        }

        Ok(status)
    }

    fn load_resolvables(&mut self, repos: &[RepoInfo], installed: bool) -> Result<()> {
        self.pool.clear();
        self.resolved = false;

        for repo in repos.iter().filter(|r| r.enabled) {
            let resolvables = match self.read_cache(&repo.alias)? {
                Some(cached) => cached,
                // ephemeral repositories are read straight from their source
                None if repo.ephemeral => match self.fetch(repo) {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        warn!("Repository '{}' became unreadable, skipping it: {}", repo.alias, e);
                        continue;
                    }
                },
                None => {
                    warn!("Repository '{}' is not cached, skipping it", repo.alias);
                    continue;
                }
            };
            debug!("Loaded {} resolvables from {}", resolvables.len(), repo.alias);
            self.pool.extend(resolvables.into_iter().map(|mut r| {
                r.repo = repo.alias.clone();
                r.installed = false;
                r
            }));
        }

        if installed {
            self.pool.extend(self.read_installed()?);
        }
        Ok(())
    }

    fn pool(&self) -> &[Resolvable] {
        &self.pool
    }

    fn mark(&mut self, selection: Selection) {
        self.resolved = false;
        if !self.selections.contains(&selection) {
            self.selections.push(selection);
        }
    }

    fn selections(&self) -> &[Selection] {
        &self.selections
    }

    fn clear_selections(&mut self) {
        self.selections.clear();
        self.resolved = false;
    }

    fn resolve(&mut self) -> Result<()> {
        let mut installing = HashSet::new();
        let mut removing = HashSet::new();

        for sel in &self.selections {
            let key = (sel.resolvable.kind, sel.resolvable.name.as_str());
            let clash = match sel.action {
                Action::Install => !installing.insert(key) || removing.contains(&key),
                Action::Remove => !removing.insert(key) || installing.contains(&key),
            };
            if clash {
                return Err(Error::Resolver(format!(
                    "conflicting requests for {} '{}'",
                    sel.resolvable.kind, sel.resolvable.name
                )));
            }
            if sel.action == Action::Remove && !sel.resolvable.installed {
                return Err(Error::Resolver(format!(
                    "{} '{}' is not installed",
                    sel.resolvable.kind, sel.resolvable.name
                )));
            }
        }

        self.resolved = true;
        Ok(())
    }

    fn write_solver_testcase(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let jobs: Vec<_> = self
            .selections
            .iter()
            .map(|s| {
                serde_json::json!({
                    "action": match s.action {
                        Action::Install => "install",
                        Action::Remove => "remove",
                    },
                    "kind": s.resolvable.kind,
                    "name": s.resolvable.name,
                    "edition": s.resolvable.edition,
                    "repo": s.resolvable.repo,
                })
            })
            .collect();
        let testcase = serde_json::json!({
            "pool": self.pool,
            "jobs": jobs,
        });
        fs::write(dir.join(SOLVER_TESTCASE_FILE), serde_json::to_string_pretty(&testcase)?)?;
        Ok(())
    }

    fn commit(&mut self, dry_run: bool) -> Result<CommitResult> {
        if !self.resolved {
            self.resolve()?;
        }

        let mut installed = self.read_installed()?;
        let mut result = CommitResult::default();

        for sel in &self.selections {
            let r = &sel.resolvable;
            match sel.action {
                Action::Install => {
                    installed.retain(|i| !(i.kind == r.kind && i.name == r.name));
                    let mut new = r.clone();
                    new.installed = true;
                    new.repo = SYSTEM_REPO_ALIAS.to_string();
                    installed.push(new);
                    result.installed += 1;
                    result.reboot_needed |= r.reboot_suggested;
                    result.restart_needed |= r.restart_suggested || r.affects_package_manager;
                }
                Action::Remove => {
                    let before = installed.len();
                    installed.retain(|i| !(i.kind == r.kind && i.name == r.name && i.edition == r.edition));
                    result.removed += before - installed.len();
                }
            }
        }

        if dry_run {
            info!("Dry run: {} to install, {} to remove", result.installed, result.removed);
        } else {
            installed.sort_by(|a, b| a.name.cmp(&b.name));
            self.write_installed(&installed)
                .map_err(|e| Error::Commit(format!("cannot write {:?}: {}", self.installed_db, e)))?;
            info!("Committed: {} installed, {} removed", result.installed, result.removed);
        }

        self.selections.clear();
        self.resolved = false;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(root: &Path) -> LocalManager {
        let mut gopts = GlobalOptions::default();
        gopts.root_dir = root.to_path_buf();
        gopts.rm_options.prefix_root(root);
        LocalManager::new(&gopts)
    }

    fn dir_url(path: &Path) -> Url {
        Url::parse(&format!("dir://{}", path.display())).unwrap()
    }

    fn write_metadata(dir: &Path, resolvables: &[Resolvable]) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(METADATA_FILE), serde_json::to_string(resolvables).unwrap()).unwrap();
    }

    #[test]
    fn test_rpm_file_nevra() {
        assert_eq!(
            rpm_file_nevra("vim-data-9.0.1-2.1.noarch.rpm"),
            Some(("vim-data".into(), "9.0.1-2.1".into(), "noarch".into()))
        );
        assert_eq!(rpm_file_nevra("foo.rpm"), None);
        assert_eq!(rpm_file_nevra("foo-1.x86_64.rpm"), None);
        assert_eq!(rpm_file_nevra("foo-1-1.x86_64.deb"), None);
    }

    #[test]
    fn test_repository_crud() {
        let root = TempDir::new().unwrap();
        let mut mgr = manager(root.path());
        assert!(mgr.repositories().unwrap().is_empty());

        let repo = RepoInfo::new("oss", Url::parse("http://example.com/oss/").unwrap());
        mgr.add_repository(&repo).unwrap();
        assert!(root.path().join("etc/zypp/repos.d/oss.repo").exists());
        assert!(matches!(mgr.add_repository(&repo), Err(Error::RepoExists(_))));

        let mut renamed = repo.clone();
        renamed.alias = "main".into();
        renamed.enabled = false;
        mgr.modify_repository("oss", &renamed).unwrap();
        let repos = mgr.repositories().unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].alias, "main");
        assert!(!repos[0].enabled);
        assert!(!root.path().join("etc/zypp/repos.d/oss.repo").exists());

        mgr.remove_repository("main").unwrap();
        assert!(mgr.repositories().unwrap().is_empty());
        assert!(matches!(mgr.remove_repository("main"), Err(Error::RepoNotFound(_))));
    }

    #[test]
    fn test_ephemeral_repos_stay_in_memory() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("srv/extra");
        write_metadata(&source, &[Resolvable::new(ResolvableKind::Package, "vim", "9.0-1")]);
        let mut mgr = manager(root.path());
        let repo = RepoInfo::additional(1, dir_url(&source));

        mgr.add_repository(&repo).unwrap();
        assert_eq!(mgr.repositories().unwrap().len(), 1);
        assert!(!root.path().join("etc/zypp/repos.d").exists());

        mgr.remove_repository("tmp1").unwrap();
        assert!(mgr.repositories().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_ephemeral_repo_rejected() {
        let root = TempDir::new().unwrap();
        let mut mgr = manager(root.path());

        let remote = RepoInfo::additional(1, Url::parse("http://example.com/repo").unwrap());
        assert!(mgr.add_repository(&remote).is_err());
        let missing = RepoInfo::additional(2, dir_url(&root.path().join("nowhere")));
        assert!(mgr.add_repository(&missing).is_err());
        assert!(mgr.repositories().unwrap().is_empty());
    }

    #[test]
    fn test_refresh_load_and_commit() {
        let root = TempDir::new().unwrap();
        let source = root.path().join("srv/repo");
        let mut vim = Resolvable::new(ResolvableKind::Package, "vim", "9.0-1");
        vim.summary = "Vi IMproved".into();
        write_metadata(&source, &[vim]);

        let mut mgr = manager(root.path());
        let repo = RepoInfo::new("local", dir_url(&source));
        mgr.add_repository(&repo).unwrap();

        let opts = RefreshOptions::default();
        assert_eq!(mgr.refresh_repository(&repo, opts).unwrap(), RefreshStatus::Refreshed);
        assert_eq!(mgr.refresh_repository(&repo, opts).unwrap(), RefreshStatus::UpToDate);

        mgr.load_resolvables(&[repo.clone()], true).unwrap();
        assert_eq!(mgr.pool().len(), 1);
        assert_eq!(mgr.pool()[0].repo, "local");

        let candidate = mgr.pool()[0].clone();
        mgr.mark(Selection::install(candidate));
        mgr.resolve().unwrap();

        let dry = mgr.commit(true).unwrap();
        assert_eq!(dry.installed, 1);
        assert!(!root.path().join("var/lib/zypp/installed.json").exists());

        let candidate = mgr.pool()[0].clone();
        mgr.mark(Selection::install(candidate));
        mgr.commit(false).unwrap();
        assert!(mgr.selections().is_empty());

        mgr.load_resolvables(&[repo], true).unwrap();
        let installed: Vec<_> = mgr.pool().iter().filter(|r| r.installed).collect();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].repo, SYSTEM_REPO_ALIAS);
    }

    #[test]
    fn test_plaindir_repo() {
        let root = TempDir::new().unwrap();
        let rpms = root.path().join("rpms");
        fs::create_dir_all(&rpms).unwrap();
        fs::write(rpms.join("hello-2.12-1.1.x86_64.rpm"), b"").unwrap();
        fs::write(rpms.join("README"), b"").unwrap();

        let mut mgr = manager(root.path());
        let mut repo = RepoInfo::new("_tmpRPMcache_", dir_url(&rpms));
        repo.repo_type = RepoType::PlainDir;
        repo.ephemeral = true;
        mgr.add_repository(&repo).unwrap();

        mgr.load_resolvables(&[repo], false).unwrap();
        assert_eq!(mgr.pool().len(), 1);
        assert_eq!(mgr.pool()[0].name, "hello");
        assert_eq!(mgr.pool()[0].edition, "2.12-1.1");
        assert_eq!(mgr.pool()[0].arch, "x86_64");
    }

    #[test]
    fn test_resolve_rejects_conflicts() {
        let root = TempDir::new().unwrap();
        let mut mgr = manager(root.path());
        let mut vim = Resolvable::new(ResolvableKind::Package, "vim", "9.0-1");
        mgr.mark(Selection::install(vim.clone()));
        vim.installed = true;
        mgr.mark(Selection::remove(vim));
        assert!(matches!(mgr.resolve(), Err(Error::Resolver(_))));
    }

    #[test]
    fn test_remote_refresh_unsupported() {
        let root = TempDir::new().unwrap();
        let mut mgr = manager(root.path());
        let repo = RepoInfo::new("remote", Url::parse("https://example.com/repo").unwrap());
        let err = mgr.refresh_repository(&repo, RefreshOptions::default()).unwrap_err();
        assert!(err.to_string().contains("unsupported URI scheme 'https'"));
    }

    #[test]
    fn test_lock_is_exclusive() {
        let root = TempDir::new().unwrap();
        let mut first = manager(root.path());
        let mut second = manager(root.path());
        first.lock().unwrap();
        assert!(matches!(second.lock(), Err(Error::Locked { .. })));
        first.unlock();
        second.lock().unwrap();
    }
}

// tests/end_to_end.rs

//! Whole invocations against the filesystem-backed resource manager.

mod common;

use common::{args_of, Buf};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zypper::manager::{PackageLock, Resolvable};
use zypper::{Console, ExitCode, GlobalOptions, Host, LocalManager, ResourceManager, Session};

/// One zypper process with `--root` pointing into the test's tree
struct Invocation {
    out: Buf,
    err: Buf,
    code: ExitCode,
}

fn zypper(root: &Path, args: &[&str]) -> Invocation {
    let out = Buf::default();
    let err = Buf::default();
    let console = Console::new(Box::new(out.clone()), Box::new(err.clone()));
    let host = Host {
        is_root: true,
        history_path: None,
    };
    let mut session = Session::new(
        console,
        host,
        Box::new(|gopts: &GlobalOptions| -> Box<dyn ResourceManager> {
            Box::new(LocalManager::new(gopts))
        }),
    );

    let root = root.to_string_lossy().into_owned();
    let mut full = args_of(&["--root", &root]);
    full.extend(args_of(args));
    let code = session.run(&full);
    Invocation { out, err, code }
}

fn write_repo(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("resolvables.json"),
        r#"[
  {"name": "hello", "kind": "package", "edition": "2.0-1", "arch": "x86_64",
   "summary": "Friendly greeter"},
  {"name": "hello", "kind": "package", "edition": "1.0-1", "arch": "x86_64"},
  {"name": "fix-hello", "kind": "patch", "edition": "1", "category": "security"}
]"#,
    )
    .unwrap();
}

fn installed_names(root: &Path) -> Vec<String> {
    let path = root.join("var/lib/zypp/installed.json");
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let installed: Vec<Resolvable> = serde_json::from_str(&text).unwrap();
    installed
        .into_iter()
        .map(|r| format!("{}-{}", r.name, r.edition))
        .collect()
}

fn setup() -> (TempDir, PathBuf, String) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    let repo_dir = tmp.path().join("srv/repo");
    write_repo(&repo_dir);
    let uri = format!("dir://{}", repo_dir.display());
    (tmp, root, uri)
}

#[test]
fn test_repository_lifecycle() {
    let (_tmp, root, uri) = setup();

    let added = zypper(&root, &["addrepo", &uri, "local"]);
    assert_eq!(added.code, ExitCode::Ok, "{}", added.err.contents());
    assert!(added.out.contents().contains("Repository 'local' successfully added"));
    assert!(root.join("etc/zypp/repos.d/local.repo").exists());

    let again = zypper(&root, &["ar", &uri, "local"]);
    assert_eq!(again.code, ExitCode::ZyppError);
    assert!(again.err.contents().contains("already exists"));

    let refreshed = zypper(&root, &["refresh"]);
    assert_eq!(refreshed.code, ExitCode::Ok, "{}", refreshed.err.contents());
    assert!(refreshed.out.contents().contains("Repository 'local' has been refreshed."));
    assert!(root.join("var/cache/zypp/local/resolvables.json").exists());

    let listed = zypper(&root, &["lr"]);
    assert!(listed.out.contents().contains("local"));

    let renamed = zypper(&root, &["renamerepo", "local", "mine"]);
    assert_eq!(renamed.code, ExitCode::Ok, "{}", renamed.err.contents());
    assert!(root.join("etc/zypp/repos.d/mine.repo").exists());
    assert!(!root.join("etc/zypp/repos.d/local.repo").exists());

    let removed = zypper(&root, &["removerepo", "mine"]);
    assert_eq!(removed.code, ExitCode::Ok, "{}", removed.err.contents());
    assert!(!root.join("etc/zypp/repos.d/mine.repo").exists());

    let missing = zypper(&root, &["rr", "mine"]);
    assert_eq!(missing.code, ExitCode::ZyppError);
}

#[test]
fn test_install_patch_check_and_remove() {
    let (_tmp, root, uri) = setup();
    assert_eq!(zypper(&root, &["addrepo", &uri, "local"]).code, ExitCode::Ok);

    let checked = zypper(&root, &["patch-check"]);
    assert_eq!(checked.code, ExitCode::SecurityUpdateNeeded);
    assert!(checked.out.contents().contains("1 patches needed (1 security patches)"));

    let installed = zypper(&root, &["-n", "install", "hello"]);
    assert_eq!(installed.code, ExitCode::Ok, "{}", installed.err.contents());
    assert_eq!(installed_names(&root), vec!["hello-2.0-1".to_string()]);

    let again = zypper(&root, &["-n", "install", "hello"]);
    assert!(again.out.contents().contains("already installed"));

    let patched = zypper(&root, &["-n", "install", "-t", "patch", "fix-hello"]);
    assert_eq!(patched.code, ExitCode::Ok, "{}", patched.err.contents());
    assert_eq!(zypper(&root, &["pchk"]).code, ExitCode::Ok);

    let removed = zypper(&root, &["-n", "remove", "hello"]);
    assert_eq!(removed.code, ExitCode::Ok, "{}", removed.err.contents());
    assert_eq!(installed_names(&root), vec!["fix-hello-1".to_string()]);
}

#[test]
fn test_capability_install_picks_matching_edition() {
    let (_tmp, root, uri) = setup();
    assert_eq!(zypper(&root, &["addrepo", &uri, "local"]).code, ExitCode::Ok);

    let installed = zypper(&root, &["-n", "install", "-C", "hello < 2.0"]);
    assert_eq!(installed.code, ExitCode::Ok, "{}", installed.err.contents());
    assert_eq!(installed_names(&root), vec!["hello-1.0-1".to_string()]);

    let updated = zypper(&root, &["-n", "update", "-t", "package"]);
    assert_eq!(updated.code, ExitCode::Ok, "{}", updated.err.contents());
    assert_eq!(installed_names(&root), vec!["hello-2.0-1".to_string()]);
}

#[test]
fn test_search_lists_matches() {
    let (_tmp, root, uri) = setup();
    assert_eq!(zypper(&root, &["addrepo", &uri, "local"]).code, ExitCode::Ok);

    let found = zypper(&root, &["search", "hel*"]);
    assert_eq!(found.code, ExitCode::Ok, "{}", found.err.contents());
    let out = found.out.contents();
    assert!(out.contains("hello"));
    assert!(!out.contains("fix-hello"));

    let none = zypper(&root, &["se", "nothing-like-this"]);
    assert!(none.out.contents().contains("No resolvables found."));
}

#[test]
fn test_install_from_rpm_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("root");
    let rpm = tmp.path().join("greet-0.3-2.x86_64.rpm");
    fs::write(&rpm, b"not really an rpm").unwrap();

    let rpm_arg = rpm.to_string_lossy().into_owned();
    let installed = zypper(&root, &["-n", "install", &rpm_arg]);
    assert_eq!(installed.code, ExitCode::Ok, "{}", installed.err.contents());
    assert_eq!(installed_names(&root), vec!["greet-0.3-2".to_string()]);
    assert!(root.join("var/cache/zypper/RPMS/greet-0.3-2.x86_64.rpm").exists());
    // the cache repository lives for one process only
    assert!(!root.join("etc/zypp/repos.d/_tmpRPMcache_.repo").exists());
}

#[test]
fn test_install_with_lock_held_elsewhere() {
    let (_tmp, root, uri) = setup();
    assert_eq!(zypper(&root, &["addrepo", &uri, "local"]).code, ExitCode::Ok);

    let _lock = PackageLock::acquire(root.join("var/run/zypp.pid")).unwrap();
    let blocked = zypper(&root, &["install", "hello"]);
    assert_eq!(blocked.code, ExitCode::ZyppError);
    assert!(blocked
        .err
        .contents()
        .contains(&format!("held by process {}", std::process::id())));
    assert!(installed_names(&root).is_empty());
}

#[test]
fn test_debug_solver_writes_testcase() {
    let (_tmp, root, uri) = setup();
    assert_eq!(zypper(&root, &["addrepo", &uri, "local"]).code, ExitCode::Ok);

    let debug = zypper(&root, &["install", "--debug-solver", "hello"]);
    assert_eq!(debug.code, ExitCode::Ok, "{}", debug.err.contents());
    assert!(root
        .join("var/log/zypper.solverTestCase/solver-test.json")
        .exists());
    assert!(installed_names(&root).is_empty());
}

#[test]
fn test_unreachable_plus_repo_is_skipped() {
    let (_tmp, root, uri) = setup();
    assert_eq!(zypper(&root, &["addrepo", &uri, "local"]).code, ExitCode::Ok);

    let found = zypper(&root, &["-p", "http://example.com/repo", "search", "hello"]);
    assert_eq!(found.code, ExitCode::Ok, "{}", found.err.contents());
    let err = found.err.contents();
    assert!(err.contains("Problem adding repository 'http://example.com/repo':"));
    assert!(err.contains("Skipping repository 'http://example.com/repo' because of the above error."));
    assert!(!err.contains("Please file a bug report"));
    assert!(found.out.contents().contains("hello"));
}

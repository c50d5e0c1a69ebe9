//! End-to-end install tests against an offline `file://` remote

mod common;

use std::thread;

use common::{TestWorkspace, marker_field, marker_lines};
use predicates::prelude::*;

#[test]
fn test_install_outside_git_repository_refused() {
    let workspace = TestWorkspace::new();
    std::fs::create_dir_all(&workspace.dest).unwrap();
    let transcript = workspace.temp.path().join("logs/install.log");

    let output = workspace
        .install()
        .arg("--transcript")
        .arg(&transcript)
        .assert()
        .code(2)
        .stdout(predicate::str::is_match(r"(?m)^\[install\] guard GitRepoRequired").unwrap())
        .stderr(predicate::str::contains("GitRepoRequired"))
        .get_output()
        .clone();

    // the final stderr line alone still names the category
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap();
    assert!(last.contains("GitRepoRequired"), "{stderr}");

    assert!(!workspace.dest.join("foo.txt").exists());
    assert!(!transcript.exists());
    assert!(!workspace.temp.path().join("logs").exists());
    assert!(workspace.leftover_workspaces().is_empty());
}

#[test]
fn test_install_copies_overlay() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();

    let output = workspace.install().assert().success().get_output().clone();

    assert_eq!(
        std::fs::read_to_string(workspace.dest.join("foo.txt")).unwrap(),
        "foo"
    );
    assert!(workspace.dest.join(".github/workflows/ci.yml").is_file());
    // files outside the overlay directory stay behind
    assert_eq!(
        std::fs::read_to_string(workspace.dest.join("README.md")).unwrap(),
        "app\n"
    );

    let success = regex::Regex::new(
        r#"^\[install\] success ref="main" overlay="overlay" duration="\d+(\.\d+)?"$"#,
    )
    .unwrap();
    let markers = marker_lines(&output.stdout);
    assert_eq!(markers.iter().filter(|l| success.is_match(l)).count(), 1);
    assert!(markers.iter().any(|l| l.starts_with("[install] temp workspace=")));
    assert!(workspace.leftover_workspaces().is_empty());
}

#[test]
fn test_install_twice_is_idempotent() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();

    workspace.install().assert().success();
    let first: Vec<_> = walk_files(&workspace.dest);
    workspace.install().assert().success();
    let second: Vec<_> = walk_files(&workspace.dest);

    assert_eq!(first, second);
}

#[test]
fn test_install_unknown_ref_fails_without_touching_destination() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();

    let mut cmd = workspace.albt();
    cmd.args(["install", "--ref", "no-such-branch", "--dest"])
        .arg(&workspace.dest)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[install] temp").not());

    assert!(!workspace.dest.join("foo.txt").exists());
}

#[test]
fn test_install_missing_overlay_directory_fails() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();

    let mut cmd = workspace.albt();
    cmd.args(["install", "--ref", "main", "--source-subdir", "nope", "--dest"])
        .arg(&workspace.dest)
        .assert()
        .failure();

    assert!(!workspace.dest.join("foo.txt").exists());
    assert!(workspace.leftover_workspaces().is_empty());
}

#[test]
fn test_install_with_commit() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();

    let mut cmd = workspace.install();
    cmd.args(["--commit-message", "chore: add build tools"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[install] step name=\"commit\" status=\"committed\"",
        ));

    let repo = git2::Repository::open(&workspace.dest).unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message(), Some("chore: add build tools"));
    assert!(repo.statuses(None).unwrap().is_empty());
}

#[test]
fn test_require_clean_refuses_dirty_tree() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();
    std::fs::write(workspace.dest.join("wip.al"), "codeunit 50100 Wip {}").unwrap();

    let mut cmd = workspace.install();
    cmd.arg("--require-clean")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[install] guard DirtyWorkingTree"));
}

#[test]
fn test_transcript_receives_markers() {
    let workspace = TestWorkspace::new();
    workspace.init_dest_repo();
    let transcript = workspace.temp.path().join("install.log");

    let mut cmd = workspace.install();
    cmd.arg("--transcript").arg(&transcript).assert().success();

    let logged = std::fs::read_to_string(&transcript).unwrap();
    assert!(logged.lines().any(|l| l.starts_with("[install] success ")));
}

#[test]
fn test_concurrent_installs_use_private_workspaces() {
    let workspace = TestWorkspace::new();
    let dests: Vec<_> = (0..3)
        .map(|i| {
            let dest = workspace.temp.path().join(format!("app-{i}"));
            common::init_repo(&dest);
            dest
        })
        .collect();

    let handles: Vec<_> = dests
        .iter()
        .cloned()
        .map(|dest| {
            let mut cmd = workspace.albt();
            cmd.args(["install", "--ref", "main", "--dest"]).arg(&dest);
            thread::spawn(move || cmd.output().unwrap())
        })
        .collect();

    let mut temp_dirs = Vec::new();
    for handle in handles {
        let output = handle.join().unwrap();
        assert!(output.status.success(), "{output:?}");
        let markers = marker_lines(&output.stdout);
        let temp = markers
            .iter()
            .find(|l| l.starts_with("[install] temp "))
            .and_then(|l| marker_field(l, "workspace"))
            .unwrap();
        temp_dirs.push(temp);
    }

    temp_dirs.sort();
    temp_dirs.dedup();
    assert_eq!(temp_dirs.len(), 3);
    for dest in &dests {
        assert_eq!(std::fs::read_to_string(dest.join("foo.txt")).unwrap(), "foo");
    }
    assert!(workspace.leftover_workspaces().is_empty());
}

/// Relative path and content of every file outside `.git`
fn walk_files(root: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().display().to_string();
            (rel, std::fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

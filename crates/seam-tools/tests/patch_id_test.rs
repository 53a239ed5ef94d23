//! Patch identity tests against real git repositories.
//!
//! These tests drive the actual `git` executable from PATH, the same way
//! the tool is used in production. Each test builds a throwaway repository
//! under a tempdir.

#![allow(clippy::all, clippy::pedantic, clippy::nursery)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use seam_tools::{GitTool, PatchId, ToolError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a git command in the given directory. Panics on failure.
fn git(root: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn git {}: {e}", args.join(" ")));
    assert!(
        out.status.success(),
        "git {} failed (exit {}):\nstdout: {}\nstderr: {}",
        args.join(" "),
        out.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr),
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

/// Create a repo with one base commit of `file.txt`.
fn setup_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    git(root, &["init"]);
    git(root, &["config", "user.name", "Test"]);
    git(root, &["config", "user.email", "test@test.com"]);
    git(root, &["config", "commit.gpgsign", "false"]);

    fs::write(root.join("file.txt"), "one\ntwo\nthree\n").unwrap();
    git(root, &["add", "file.txt"]);
    git(root, &["commit", "-m", "base"]);
    dir
}

/// Commit a content change and return the format-patch file for it.
fn commit_change(root: &Path, content: &str, message: &str, out_dir: &Path) -> PathBuf {
    fs::write(root.join("file.txt"), content).unwrap();
    git(root, &["add", "file.txt"]);
    git(root, &["commit", "-m", message]);
    let out_dir_arg = out_dir.to_str().unwrap();
    let name = git(root, &["format-patch", "-1", "-o", out_dir_arg, "HEAD"]);
    PathBuf::from(name.lines().last().unwrap().trim())
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

#[test]
fn file_and_commit_identities_agree() {
    let dir = setup_repo();
    let patches = TempDir::new().unwrap();
    let patch = commit_change(dir.path(), "one\nTWO\nthree\n", "change two", patches.path());

    let tool = GitTool::new("git");
    let from_commit = PatchId::of_commit(&tool, dir.path(), 0).unwrap();
    let from_file = PatchId::of_file(&tool, &patch).unwrap();
    assert_eq!(from_commit, from_file);
    assert_eq!(from_commit.as_str().len(), PatchId::LEN);
}

#[test]
fn commit_depth_indexes_history_newest_first() {
    let dir = setup_repo();
    let patches = TempDir::new().unwrap();
    let first = commit_change(dir.path(), "one\nTWO\nthree\n", "first", patches.path());
    let second = commit_change(dir.path(), "ONE\nTWO\nthree\n", "second", patches.path());

    let tool = GitTool::new("git");
    assert_eq!(
        PatchId::of_commit(&tool, dir.path(), 0).unwrap(),
        PatchId::of_file(&tool, &second).unwrap(),
    );
    assert_eq!(
        PatchId::of_commit(&tool, dir.path(), 1).unwrap(),
        PatchId::of_file(&tool, &first).unwrap(),
    );
}

#[test]
fn identity_ignores_commit_metadata() {
    let dir = setup_repo();
    let patches = TempDir::new().unwrap();
    let patch = commit_change(dir.path(), "one\ntwo!\nthree\n", "change", patches.path());

    // Same hunks, different author/date/subject.
    let original = fs::read_to_string(&patch).unwrap();
    let rewritten: String = original
        .lines()
        .map(|line| {
            if line.starts_with("From: ") {
                "From: Somebody Else <else@example.com>".to_owned()
            } else if line.starts_with("Date: ") {
                "Date: Thu, 1 Jan 2015 00:00:00 +0000".to_owned()
            } else if line.starts_with("Subject: ") {
                "Subject: [PATCH] entirely different subject".to_owned()
            } else {
                line.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let other = patch.with_file_name("rewritten.patch");
    fs::write(&other, rewritten + "\n").unwrap();

    let tool = GitTool::new("git");
    assert_eq!(
        PatchId::of_file(&tool, &patch).unwrap(),
        PatchId::of_file(&tool, &other).unwrap(),
    );
}

#[test]
fn distinct_changes_have_distinct_identities() {
    let dir = setup_repo();
    let patches = TempDir::new().unwrap();
    let first = commit_change(dir.path(), "one\nTWO\nthree\n", "first", patches.path());
    let second = commit_change(dir.path(), "ONE\nTWO\nthree\n", "second", patches.path());

    let tool = GitTool::new("git");
    assert_ne!(
        PatchId::of_file(&tool, &first).unwrap(),
        PatchId::of_file(&tool, &second).unwrap(),
    );
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn empty_commit_has_no_identity() {
    let dir = setup_repo();
    git(dir.path(), &["commit", "--allow-empty", "-m", "empty"]);

    let tool = GitTool::new("git");
    let err = PatchId::of_commit(&tool, dir.path(), 0).unwrap_err();
    assert!(matches!(err, ToolError::EmptyIdentity { .. }), "got {err}");
}

#[test]
fn commit_beyond_history_fails_with_diagnostics() {
    let dir = setup_repo();

    let tool = GitTool::new("git");
    let err = PatchId::of_commit(&tool, dir.path(), 42).unwrap_err();
    match err {
        ToolError::Failed { command, .. } => assert!(command.contains("HEAD~42^!")),
        other => panic!("expected Failed, got {other}"),
    }
}

#[test]
fn missing_patch_file_is_an_io_error() {
    let tool = GitTool::new("git");
    let err = PatchId::of_file(&tool, Path::new("/nonexistent/nope.patch")).unwrap_err();
    assert!(matches!(err, ToolError::Io { .. }), "got {err}");
}

#[test]
fn missing_git_executable_is_a_spawn_error() {
    let dir = setup_repo();
    let tool = GitTool::new("/nonexistent/git");
    let err = PatchId::of_commit(&tool, dir.path(), 0).unwrap_err();
    assert!(matches!(err, ToolError::Spawn { .. }), "got {err}");
}

// ---------------------------------------------------------------------------
// Tool wrappers
// ---------------------------------------------------------------------------

#[test]
fn rev_parse_head_returns_full_hash() {
    let dir = setup_repo();
    let tool = GitTool::new("git");
    let head = tool.rev_parse_head(dir.path()).unwrap();
    assert_eq!(head.len(), 40);
    assert!(head.bytes().all(|b| b.is_ascii_hexdigit()));
}

#[test]
fn version_probe_reports_git() {
    let tool = GitTool::new("git");
    let version = tool.version().unwrap();
    assert!(version.contains("git"), "unexpected version line: {version}");
}

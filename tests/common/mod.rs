//! Shared fixtures for the integration tests.
//!
//! Builds throwaway vendored layouts under tempdirs: a plain (non-repo)
//! source root for the diff-apply strategies, and a repository layout with
//! a nested vendored checkout for the mailbox strategy.

#![allow(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use seam::config::Project;
use seam::series::PatchSeries;

// ---------------------------------------------------------------------------
// Tree contents and patches
// ---------------------------------------------------------------------------

pub const ALPHA_BASE: &str = "alpha one\nalpha two\nalpha three\n";
pub const BETA_BASE: &str = "beta one\nbeta two\nbeta three\n";

pub const ALPHA_PATCHED: &str = "alpha one\nalpha 2\nalpha three\n";
pub const BETA_PATCHED: &str = "beta one\nbeta 2\nbeta three\n";

/// Rewrites `alpha two` -> `alpha 2`.
pub const ALPHA_PATCH: &str = "\
--- a/alpha.txt
+++ b/alpha.txt
@@ -1,3 +1,3 @@
 alpha one
-alpha two
+alpha 2
 alpha three
";

/// Rewrites `beta two` -> `beta 2`.
pub const BETA_PATCH: &str = "\
--- a/beta.txt
+++ b/beta.txt
@@ -1,3 +1,3 @@
 beta one
-beta two
+beta 2
 beta three
";

/// A patch whose context matches nothing in the fixture tree.
pub const BOGUS_PATCH: &str = "\
--- a/alpha.txt
+++ b/alpha.txt
@@ -1,3 +1,3 @@
 nothing like
-the actual
+file contents
 at all
";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a git command in the given directory. Panics on failure.
pub fn git(root: &Path, args: &[&str]) -> String {
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

/// True if `<name> --version` runs successfully.
pub fn have_tool(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub dir: TempDir,
    pub project: Project,
}

impl Fixture {
    pub fn source_root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tree(&self) -> PathBuf {
        self.dir.path().join(&self.project.tree)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.tree().join(name)).expect("read tree file")
    }

    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.tree().join(name), contents).expect("write tree file");
    }
}

/// A non-repository source root: `vendor/libdemo` with two files, plus two
/// hand-rolled unified diffs under `patches/`.
pub fn plain_fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();

    let tree = root.join("vendor/libdemo");
    fs::create_dir_all(&tree).expect("mkdir tree");
    fs::write(tree.join("alpha.txt"), ALPHA_BASE).expect("write alpha");
    fs::write(tree.join("beta.txt"), BETA_BASE).expect("write beta");

    let patches = root.join("patches");
    fs::create_dir_all(&patches).expect("mkdir patches");
    let alpha = patches.join("0001-alpha.patch");
    let beta = patches.join("0002-beta.patch");
    fs::write(&alpha, ALPHA_PATCH).expect("write alpha patch");
    fs::write(&beta, BETA_PATCH).expect("write beta patch");

    Fixture {
        dir,
        project: Project {
            name: "libdemo".to_owned(),
            tree: PathBuf::from("vendor/libdemo"),
            series: PatchSeries::new(vec![alpha, beta]),
        },
    }
}

/// A repository source root with a nested vendored repository and a
/// mailbox-format patch series generated by `git format-patch`.
///
/// Returns the fixture and the base commit hash of the vendored tree (the
/// "pinned" revision a submodule update would rewind to).
pub fn repo_fixture() -> (Fixture, String) {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();

    // The source root itself is a repository — this is what selects the
    // mailbox strategy.
    git(root, &["init", "--quiet"]);

    let tree = root.join("vendor/libdemo");
    fs::create_dir_all(&tree).expect("mkdir tree");
    git(&tree, &["init", "--quiet"]);
    git(&tree, &["config", "user.name", "Test"]);
    git(&tree, &["config", "user.email", "test@test.com"]);
    git(&tree, &["config", "commit.gpgsign", "false"]);

    fs::write(tree.join("alpha.txt"), ALPHA_BASE).expect("write alpha");
    fs::write(tree.join("beta.txt"), BETA_BASE).expect("write beta");
    git(&tree, &["add", "."]);
    git(&tree, &["commit", "-m", "import libdemo"]);

    // Produce the series from real commits, then rewind to the base so the
    // driver starts from the pinned state.
    fs::write(tree.join("alpha.txt"), ALPHA_PATCHED).expect("write alpha");
    git(&tree, &["commit", "-am", "alpha: spell out two"]);
    fs::write(tree.join("beta.txt"), BETA_PATCHED).expect("write beta");
    git(&tree, &["commit", "-am", "beta: spell out two"]);

    let patches_dir = root.join("patches");
    fs::create_dir_all(&patches_dir).expect("mkdir patches");
    let listing = git(
        &tree,
        &[
            "format-patch",
            "-2",
            "-o",
            patches_dir.to_str().expect("utf8 path"),
            "HEAD",
        ],
    );
    let series: Vec<PathBuf> = listing.lines().map(|l| PathBuf::from(l.trim())).collect();
    assert_eq!(series.len(), 2, "expected two generated patches");

    git(&tree, &["reset", "--hard", "HEAD~2"]);
    let base = git(&tree, &["rev-parse", "HEAD"]);

    (
        Fixture {
            dir,
            project: Project {
                name: "libdemo".to_owned(),
                tree: PathBuf::from("vendor/libdemo"),
                series: PatchSeries::new(series),
            },
        },
        base,
    )
}

//! Typed wrappers for the `git` and `patch(1)` executables.
//!
//! Both wrappers take the source root as an explicit working directory on
//! every call; nothing here mutates process-wide state. Vendored trees are
//! addressed relative to that root (`git -C <tree>`, `patch -d <tree>`),
//! patch files by the absolute paths the caller resolved.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ToolError;
use crate::invoke::{self, Diagnostics};

// ---------------------------------------------------------------------------
// GitTool
// ---------------------------------------------------------------------------

/// A `git` executable.
#[derive(Clone, Debug)]
pub struct GitTool {
    exe: PathBuf,
}

impl GitTool {
    /// Wrap a git executable path or name.
    #[must_use]
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// The wrapped executable path.
    #[must_use]
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// First line of `git --version`.
    pub fn version(&self) -> Result<String, ToolError> {
        version_of(&self.exe)
    }

    /// `git -C <tree> reset --hard` — drop all tracked modifications.
    pub fn reset_hard(&self, source_root: &Path, tree: &Path) -> Result<(), ToolError> {
        self.run_in_tree(source_root, tree, &["reset", "--hard"])
    }

    /// `git -C <tree> clean --force -d -x` — drop untracked and ignored files.
    pub fn clean_forced(&self, source_root: &Path, tree: &Path) -> Result<(), ToolError> {
        self.run_in_tree(source_root, tree, &["clean", "--force", "-d", "-x"])
    }

    /// Apply a whole series as commits with one atomic `git am` invocation.
    ///
    /// Runs with an ephemeral committer identity and `safe.directory=*` so
    /// the result does not depend on the builder's git configuration.
    pub fn mailbox_apply(
        &self,
        source_root: &Path,
        tree: &Path,
        patches: &[PathBuf],
    ) -> Result<(), ToolError> {
        let mut args: Vec<OsString> = [
            "-c",
            "safe.directory=*",
            "-c",
            "user.name=seam build helper",
            "-c",
            "user.email=seam@invalid.invalid",
            "-C",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        args.push(tree.into());
        args.push("am".into());
        for patch in patches {
            args.push(patch.into());
        }
        invoke::run_checked(&self.exe, &args, source_root, None, Diagnostics::Stderr)?;
        Ok(())
    }

    /// `git -C <tree> apply --check --verbose <patch>` (dry run).
    pub fn apply_check(&self, source_root: &Path, tree: &Path, patch: &Path) -> Result<(), ToolError> {
        self.apply_inner(source_root, tree, patch, &["apply", "--check", "--verbose"])
    }

    /// `git -C <tree> apply --verbose <patch>`.
    pub fn apply(&self, source_root: &Path, tree: &Path, patch: &Path) -> Result<(), ToolError> {
        self.apply_inner(source_root, tree, patch, &["apply", "--verbose"])
    }

    /// `git -C <tree> apply --reverse --check <patch>` (dry run).
    pub fn apply_reverse_check(
        &self,
        source_root: &Path,
        tree: &Path,
        patch: &Path,
    ) -> Result<(), ToolError> {
        self.apply_inner(source_root, tree, patch, &["apply", "--reverse", "--check"])
    }

    /// `git -C <tree> apply --reverse <patch>`.
    pub fn apply_reverse(
        &self,
        source_root: &Path,
        tree: &Path,
        patch: &Path,
    ) -> Result<(), ToolError> {
        self.apply_inner(source_root, tree, patch, &["apply", "--reverse"])
    }

    /// Commit hash of `HEAD` in the given repository.
    pub fn rev_parse_head(&self, repo_dir: &Path) -> Result<String, ToolError> {
        let args: Vec<OsString> = ["rev-parse", "--verify", "HEAD"]
            .iter()
            .map(OsString::from)
            .collect();
        let (_, output) =
            invoke::run_checked(&self.exe, &args, repo_dir, None, Diagnostics::Stderr)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    fn apply_inner(
        &self,
        source_root: &Path,
        tree: &Path,
        patch: &Path,
        subcommand: &[&str],
    ) -> Result<(), ToolError> {
        let mut args: Vec<OsString> = vec!["-C".into(), tree.into()];
        args.extend(subcommand.iter().map(OsString::from));
        args.push(patch.into());
        invoke::run_checked(&self.exe, &args, source_root, None, Diagnostics::Stderr)?;
        Ok(())
    }

    fn run_in_tree(
        &self,
        source_root: &Path,
        tree: &Path,
        subcommand: &[&str],
    ) -> Result<(), ToolError> {
        let mut args: Vec<OsString> = vec!["-C".into(), tree.into()];
        args.extend(subcommand.iter().map(OsString::from));
        invoke::run_checked(&self.exe, &args, source_root, None, Diagnostics::Stderr)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PatchTool
// ---------------------------------------------------------------------------

/// A standalone `patch(1)` executable.
///
/// Invocations stick to POSIX flags (`-d`, `-p`, `-R`) plus `--dry-run`,
/// which is not POSIX but is supported by GNU patch and the BSDs. The patch
/// file is fed on stdin.
#[derive(Clone, Debug)]
pub struct PatchTool {
    exe: PathBuf,
}

impl PatchTool {
    /// Wrap a patch executable path or name.
    #[must_use]
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// The wrapped executable path.
    #[must_use]
    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// First line of `patch --version`.
    pub fn version(&self) -> Result<String, ToolError> {
        version_of(&self.exe)
    }

    /// `patch -d <tree> -p 1 --dry-run < patch`.
    pub fn dry_run(&self, source_root: &Path, tree: &Path, patch: &Path) -> Result<(), ToolError> {
        self.run(source_root, tree, patch, false, true)
    }

    /// `patch -d <tree> -p 1 < patch`.
    pub fn apply(&self, source_root: &Path, tree: &Path, patch: &Path) -> Result<(), ToolError> {
        self.run(source_root, tree, patch, false, false)
    }

    /// `patch -d <tree> -p 1 -R --dry-run < patch`.
    pub fn reverse_dry_run(
        &self,
        source_root: &Path,
        tree: &Path,
        patch: &Path,
    ) -> Result<(), ToolError> {
        self.run(source_root, tree, patch, true, true)
    }

    /// `patch -d <tree> -p 1 -R < patch`.
    pub fn reverse(&self, source_root: &Path, tree: &Path, patch: &Path) -> Result<(), ToolError> {
        self.run(source_root, tree, patch, true, false)
    }

    fn run(
        &self,
        source_root: &Path,
        tree: &Path,
        patch: &Path,
        reverse: bool,
        dry_run: bool,
    ) -> Result<(), ToolError> {
        let mut args: Vec<OsString> = vec!["-d".into(), tree.into(), "-p".into(), "1".into()];
        if reverse {
            args.push("-R".into());
        }
        if dry_run {
            args.push("--dry-run".into());
        }
        invoke::run_checked(
            &self.exe,
            &args,
            source_root,
            Some(patch),
            Diagnostics::StdoutThenStderr,
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Toolchain
// ---------------------------------------------------------------------------

/// The set of patching tools available to a run, probed once at startup.
#[derive(Clone, Debug, Default)]
pub struct Toolchain {
    /// git, if available.
    pub git: Option<GitTool>,
    /// patch(1), if available.
    pub patch: Option<PatchTool>,
}

impl Toolchain {
    /// Build a toolchain from optional executable paths.
    ///
    /// An empty path means "tool not available" — callers passing through
    /// build-system probe results use empty strings for missing tools.
    #[must_use]
    pub fn from_paths(git: Option<PathBuf>, patch: Option<PathBuf>) -> Self {
        let non_empty = |p: PathBuf| {
            if p.as_os_str().is_empty() {
                None
            } else {
                Some(p)
            }
        };
        Self {
            git: git.and_then(non_empty).map(GitTool::new),
            patch: patch.and_then(non_empty).map(PatchTool::new),
        }
    }

    /// True if at least one patching tool is available.
    #[must_use]
    pub const fn has_any(&self) -> bool {
        self.git.is_some() || self.patch.is_some()
    }
}

fn version_of(exe: &Path) -> Result<String, ToolError> {
    let args: Vec<OsString> = vec!["--version".into()];
    let (_, output) = invoke::run_checked(exe, &args, Path::new("."), None, Diagnostics::Stderr)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or("unknown").trim().to_owned())
}

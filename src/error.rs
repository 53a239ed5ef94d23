//! Error types for seam operations.
//!
//! Defines [`SeamError`], the unified error type for convergence and
//! verification. Messages are designed to be actionable: each variant
//! describes what went wrong and, where a manual step can fix it, names the
//! exact command to run. Captured tool diagnostics are always attached —
//! nothing a failing external process said is swallowed.

use std::fmt;
use std::path::PathBuf;

use seam_tools::ToolError;

// ---------------------------------------------------------------------------
// SeamError
// ---------------------------------------------------------------------------

/// Unified error type for seam operations.
#[derive(Debug)]
pub enum SeamError {
    /// Neither git nor patch(1) is available; the driver refuses to run
    /// before touching anything.
    ToolUnavailable,

    /// Verification was requested without a git tool. The identity
    /// algorithm is `git patch-id`, so there is no fallback.
    GitRequired,

    /// The vendored tree directory does not exist.
    TreeMissing {
        /// Tree path relative to the source root.
        tree: PathBuf,
    },

    /// The named project is not in the manifest.
    ProjectNotFound {
        /// The requested project name.
        name: String,
        /// Path to the manifest that was searched.
        config: PathBuf,
        /// Names the manifest does declare.
        known: Vec<String>,
    },

    /// Resetting a vendored tree to its pre-patch state failed.
    CleanupFailed {
        /// Tree path relative to the source root.
        tree: PathBuf,
        /// Captured tool diagnostics.
        diagnostics: String,
    },

    /// A real revert failed after its dry-run check succeeded.
    RevertFailedAfterCheck {
        /// The patch being reverted.
        patch: PathBuf,
        /// Tree path relative to the source root.
        tree: PathBuf,
        /// Captured tool diagnostics.
        diagnostics: String,
    },

    /// During cleanup, a patch failed its revert check after earlier
    /// patches in the series had already been reverted. The tree is
    /// half-reverted; partial reversal cannot be told apart from
    /// corruption, so there is no self-heal.
    InconsistentRevertState {
        /// The patch that could not be reverted.
        patch: PathBuf,
        /// Tree path relative to the source root.
        tree: PathBuf,
        /// Captured tool diagnostics.
        diagnostics: String,
    },

    /// A patch could not be applied under any interpretation.
    ApplyFailed {
        /// The patch that failed.
        patch: PathBuf,
        /// Tree path relative to the source root.
        tree: PathBuf,
        /// Label of the strategy in use.
        strategy: &'static str,
        /// True if a dry-run check of this patch passed just before the
        /// real apply failed.
        after_successful_check: bool,
        /// Captured tool diagnostics.
        diagnostics: String,
    },

    /// The atomic mailbox apply (`git am`) of a whole series failed.
    MailboxFailed {
        /// Tree path relative to the source root.
        tree: PathBuf,
        /// A leftover `rebase-apply` directory from a previous failed
        /// mailbox apply was detected.
        leftover_mailbox: bool,
        /// The tree directory is empty (likely an uninitialized checkout).
        tree_empty: bool,
        /// Captured tool diagnostics.
        diagnostics: String,
    },

    /// A commit identity and the expected patch identity disagree.
    Mismatch {
        /// The repository being verified.
        repo: PathBuf,
        /// The patch file whose identity did not match.
        patch: PathBuf,
        /// Depth below HEAD of the mismatching commit (0 = HEAD).
        position: usize,
        /// Identity derived from the commit.
        commit_id: String,
        /// Identity derived from the patch file.
        file_id: String,
    },

    /// The manifest could not be loaded or is invalid.
    Config {
        /// Path to the manifest.
        path: PathBuf,
        /// Human-readable description of the problem.
        detail: String,
    },

    /// An external tool invocation failed outside the designed
    /// recoverable paths.
    Tool(ToolError),

    /// An I/O error outside any child process.
    Io(std::io::Error),
}

// ---------------------------------------------------------------------------
// Display — actionable error messages
// ---------------------------------------------------------------------------

impl fmt::Display for SeamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolUnavailable => {
                write!(
                    f,
                    "no patching tool is available: neither git nor patch(1) could be run.\n  To fix: install git (preferred) or patch, or point seam at one with --git / --patch-tool."
                )
            }
            Self::GitRequired => {
                write!(
                    f,
                    "patch verification requires git: the content identity algorithm is `git patch-id`.\n  To fix: install git, or pass its location with --git."
                )
            }
            Self::TreeMissing { tree } => {
                write!(
                    f,
                    "vendored tree '{}' does not exist.\n  To fix: fetch the vendored sources first. For submodule checkouts:\n    git submodule update --init",
                    tree.display()
                )
            }
            Self::ProjectNotFound {
                name,
                config,
                known,
            } => {
                write!(
                    f,
                    "project '{name}' is not declared in '{}'.",
                    config.display()
                )?;
                if known.is_empty() {
                    write!(f, "\n  The manifest declares no projects.")
                } else {
                    write!(f, "\n  Declared projects: {}", known.join(", "))
                }
            }
            Self::CleanupFailed { tree, diagnostics } => {
                write!(
                    f,
                    "could not clean up vendored tree '{}'.\n{diagnostics}",
                    tree.display()
                )
            }
            Self::RevertFailedAfterCheck {
                patch,
                tree,
                diagnostics,
            } => {
                write!(
                    f,
                    "a revert of patch '{}' of vendored tree '{}' was unsuccessful even though a previous dry-run check succeeded!\n{diagnostics}",
                    patch.display(),
                    tree.display()
                )
            }
            Self::InconsistentRevertState {
                patch,
                tree,
                diagnostics,
            } => {
                write!(
                    f,
                    "could not revert patch '{}' of vendored tree '{}' after earlier patches in the series were already reverted. The tree is half-reverted; this is not recoverable without manual intervention.\n  To fix: restore the tree to its original state (for example by re-extracting the release archive it came from) and re-run.\n{diagnostics}",
                    patch.display(),
                    tree.display()
                )
            }
            Self::ApplyFailed {
                patch,
                tree,
                strategy,
                after_successful_check,
                diagnostics,
            } => {
                write!(
                    f,
                    "could not apply patch '{}' to vendored tree '{}' ({strategy} strategy).",
                    patch.display(),
                    tree.display()
                )?;
                if *after_successful_check {
                    write!(f, " A previous dry-run check of this patch succeeded.")?;
                }
                write!(f, "\n{diagnostics}")
            }
            Self::MailboxFailed {
                tree,
                leftover_mailbox,
                tree_empty,
                diagnostics,
            } => {
                write!(
                    f,
                    "could not apply the patch series to vendored tree '{}'.",
                    tree.display()
                )?;
                if *leftover_mailbox {
                    write!(
                        f,
                        "\n  This is likely caused by a previous failed mailbox apply. To fix, run:\n    git -C {} am --abort\n  from the source root, then re-run.",
                        tree.display()
                    )?;
                } else if *tree_empty {
                    write!(
                        f,
                        "\n  The tree appears to be uninitialized. To fix, run:\n    git submodule update --init\n  from the source root, then re-run."
                    )?;
                }
                write!(f, "\n{diagnostics}")
            }
            Self::Mismatch {
                repo,
                patch,
                position,
                commit_id,
                file_id,
            } => {
                write!(
                    f,
                    "could not verify patch '{}' in repository '{}': commit identity '{commit_id}' != patch identity '{file_id}' (commit HEAD~{position}).",
                    patch.display(),
                    repo.display()
                )
            }
            Self::Config { path, detail } => {
                write!(
                    f,
                    "configuration error in '{}': {detail}\n  To fix: edit the manifest and correct the issue.",
                    path.display()
                )
            }
            Self::Tool(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error / From impls
// ---------------------------------------------------------------------------

impl std::error::Error for SeamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tool(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ToolError> for SeamError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

impl From<std::io::Error> for SeamError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

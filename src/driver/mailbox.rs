//! Mailbox strategy: native `git am` over a real repository checkout.
//!
//! The preferred strategy. Cleanup is a full wipe to pristine (hard reset
//! plus forced clean of untracked and ignored files); apply is a single
//! `git am` over the whole series, so either every patch lands as a commit
//! or none do. A failed `git am` leaves the repository in a recoverable
//! but abnormal state — the error names the exact `am --abort` command to
//! run.

use std::fs;
use std::path::Path;

use tracing::info;

use seam_tools::GitTool;

use super::{PatchApplyOutcome, PatchOutcome, Strategy, TreeContext};
use crate::error::SeamError;

pub(crate) struct Mailbox {
    git: GitTool,
}

impl Mailbox {
    pub(crate) const fn new(git: GitTool) -> Self {
        Self { git }
    }
}

impl Strategy for Mailbox {
    fn label(&self) -> &'static str {
        "git am"
    }

    fn cleanup(&self, ctx: &TreeContext<'_>) -> Result<(), SeamError> {
        info!(tree = %ctx.tree.display(), "resetting tree to pristine");
        self.git
            .reset_hard(ctx.source_root, ctx.tree)
            .and_then(|()| self.git.clean_forced(ctx.source_root, ctx.tree))
            .map_err(|err| SeamError::CleanupFailed {
                tree: ctx.tree.to_path_buf(),
                diagnostics: err.to_string(),
            })
    }

    fn apply(&self, ctx: &TreeContext<'_>) -> Result<Vec<PatchOutcome>, SeamError> {
        // Probe for leftovers of an earlier failed mailbox apply before
        // running: if the am below fails, this is the likeliest cause and
        // the error should say so.
        let leftover_mailbox = has_leftover_mailbox(ctx);

        info!(
            tree = %ctx.tree.display(),
            patches = ctx.series.len(),
            "applying series as one mailbox",
        );
        match self
            .git
            .mailbox_apply(ctx.source_root, ctx.tree, ctx.series.as_slice())
        {
            Ok(()) => Ok(ctx
                .series
                .iter()
                .map(|patch| PatchOutcome {
                    patch: patch.clone(),
                    outcome: PatchApplyOutcome::Applied,
                })
                .collect()),
            Err(err) => Err(SeamError::MailboxFailed {
                tree: ctx.tree.to_path_buf(),
                leftover_mailbox,
                tree_empty: dir_is_empty(&ctx.source_root.join(ctx.tree)),
                diagnostics: err.to_string(),
            }),
        }
    }
}

/// Does the tree's git dir contain an interrupted `git am`?
///
/// Submodule checkouts keep the module's git dir under
/// `.git/modules/<tree>`; a plain nested repository keeps it inside the
/// tree itself. Probe both.
fn has_leftover_mailbox(ctx: &TreeContext<'_>) -> bool {
    ctx.source_root
        .join(".git")
        .join("modules")
        .join(ctx.tree)
        .join("rebase-apply")
        .exists()
        || ctx
            .source_root
            .join(ctx.tree)
            .join(".git")
            .join("rebase-apply")
            .exists()
}

fn dir_is_empty(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::series::PatchSeries;

    #[test]
    fn leftover_probe_sees_submodule_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let series = PatchSeries::default();
        let ctx = TreeContext {
            source_root: dir.path(),
            tree: Path::new("vendor/libfoo"),
            series: &series,
        };
        assert!(!has_leftover_mailbox(&ctx));

        fs::create_dir_all(
            dir.path()
                .join(".git/modules/vendor/libfoo/rebase-apply"),
        )
        .expect("mkdir");
        assert!(has_leftover_mailbox(&ctx));
    }

    #[test]
    fn leftover_probe_sees_nested_repository_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let series = PatchSeries::default();
        let ctx = TreeContext {
            source_root: dir.path(),
            tree: Path::new("vendor/libbar"),
            series: &series,
        };
        fs::create_dir_all(dir.path().join("vendor/libbar/.git/rebase-apply"))
            .expect("mkdir");
        assert!(has_leftover_mailbox(&ctx));
    }

    #[test]
    fn empty_dir_probe() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(dir_is_empty(dir.path()));
        fs::write(dir.path().join("x"), "x").expect("write");
        assert!(!dir_is_empty(dir.path()));
        assert!(!dir_is_empty(&PathBuf::from("/nonexistent")));
    }
}

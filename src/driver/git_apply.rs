//! Two-phase backend over `git apply`.
//!
//! Used when git is available but the source root is not a repository
//! (release tarballs, exported trees). `git apply` does not need the tree
//! to be a checkout; it only needs the files to match the hunks.

use std::path::Path;

use seam_tools::{GitTool, ToolError};

use super::{PatchPrimitives, TreeContext};

pub(crate) struct GitApplyPrimitives {
    git: GitTool,
}

impl GitApplyPrimitives {
    pub(crate) const fn new(git: GitTool) -> Self {
        Self { git }
    }
}

impl PatchPrimitives for GitApplyPrimitives {
    fn label(&self) -> &'static str {
        "git apply"
    }

    fn check_revert(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.git
            .apply_reverse_check(ctx.source_root, ctx.tree, patch)
    }

    fn revert(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.git.apply_reverse(ctx.source_root, ctx.tree, patch)
    }

    fn check_apply(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.git.apply_check(ctx.source_root, ctx.tree, patch)
    }

    fn apply(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.git.apply(ctx.source_root, ctx.tree, patch)
    }
}

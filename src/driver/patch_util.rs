//! Two-phase backend over standalone `patch(1)`.
//!
//! The last resort for hosts without git. Patches are fed on stdin with a
//! strip level of 1, matching the `a/` and `b/` path prefixes of unified
//! diffs.

use std::path::Path;

use seam_tools::{PatchTool, ToolError};

use super::{PatchPrimitives, TreeContext};

pub(crate) struct PatchUtilPrimitives {
    patch: PatchTool,
}

impl PatchUtilPrimitives {
    pub(crate) const fn new(patch: PatchTool) -> Self {
        Self { patch }
    }
}

impl PatchPrimitives for PatchUtilPrimitives {
    fn label(&self) -> &'static str {
        "patch"
    }

    fn check_revert(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.patch.reverse_dry_run(ctx.source_root, ctx.tree, patch)
    }

    fn revert(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.patch.reverse(ctx.source_root, ctx.tree, patch)
    }

    fn check_apply(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.patch.dry_run(ctx.source_root, ctx.tree, patch)
    }

    fn apply(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError> {
        self.patch.apply(ctx.source_root, ctx.tree, patch)
    }
}

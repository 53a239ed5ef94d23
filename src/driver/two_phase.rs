//! The shared revert-then-apply protocol.
//!
//! Both the `git apply` and `patch(1)` strategies converge the same way;
//! only the per-patch tool invocations differ. [`TwoPhase`] owns the
//! protocol, a [`PatchPrimitives`] implementation owns the invocations.
//!
//! Cleanup walks the series in reverse, newest patch first. A failed
//! revert check means "this patch was never applied" and is tolerated —
//! until the first successful revert. From then on every remaining patch
//! must also revert: a failure after that point leaves the tree
//! half-reverted, which cannot be told apart from corruption, so it is
//! fatal. That rule is the [`CleanupState`] transition guard.
//!
//! Apply walks the series forward. Every patch is dry-run checked before
//! the real apply; a check failure is re-tried as a reverse check to
//! distinguish "already applied" (tolerated, logged) from a genuine
//! failure (fatal, with the original check diagnostics attached).

use std::path::Path;

use tracing::info;

use seam_tools::ToolError;

use super::{PatchApplyOutcome, PatchOutcome, Strategy, TreeContext};
use crate::error::SeamError;

// ---------------------------------------------------------------------------
// PatchPrimitives
// ---------------------------------------------------------------------------

/// The per-patch tool invocations a two-phase backend provides.
///
/// Dry-run methods report "would not apply/revert" as
/// [`ToolError::Failed`]; any other error (the tool could not run at all)
/// is never interpreted and always aborts the run.
pub(crate) trait PatchPrimitives {
    /// Short human-readable name, used in logs and errors.
    fn label(&self) -> &'static str;

    /// Dry-run: would this patch revert cleanly?
    fn check_revert(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError>;

    /// Revert the patch for real.
    fn revert(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError>;

    /// Dry-run: would this patch apply cleanly?
    fn check_apply(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError>;

    /// Apply the patch for real.
    fn apply(&self, ctx: &TreeContext<'_>, patch: &Path) -> Result<(), ToolError>;
}

/// True for "the tool ran and said no" — the only error class the
/// protocol is allowed to interpret.
fn is_check_failure(err: &ToolError) -> bool {
    matches!(err, ToolError::Failed { .. })
}

// ---------------------------------------------------------------------------
// Cleanup transition guard
// ---------------------------------------------------------------------------

/// Cleanup-phase state. The transition `NothingReverted -> Reverting`
/// happens on the first successful revert and is one-way: after it, a
/// revert-check failure is no longer "never applied" but a half-reverted
/// tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CleanupState {
    NothingReverted,
    Reverting,
}

// ---------------------------------------------------------------------------
// TwoPhase
// ---------------------------------------------------------------------------

/// The revert-then-apply strategy over some [`PatchPrimitives`].
pub(crate) struct TwoPhase<P> {
    primitives: P,
}

impl<P> TwoPhase<P> {
    pub(crate) const fn new(primitives: P) -> Self {
        Self { primitives }
    }
}

impl<P: PatchPrimitives> Strategy for TwoPhase<P> {
    fn label(&self) -> &'static str {
        self.primitives.label()
    }

    fn cleanup(&self, ctx: &TreeContext<'_>) -> Result<(), SeamError> {
        let mut state = CleanupState::NothingReverted;
        for patch in ctx.series.iter().rev() {
            match self.primitives.check_revert(ctx, patch) {
                Ok(()) => {
                    if let Err(err) = self.primitives.revert(ctx, patch) {
                        return Err(if is_check_failure(&err) {
                            SeamError::RevertFailedAfterCheck {
                                patch: patch.clone(),
                                tree: ctx.tree.to_path_buf(),
                                diagnostics: err.to_string(),
                            }
                        } else {
                            err.into()
                        });
                    }
                    info!(patch = %patch.display(), "reverted");
                    state = CleanupState::Reverting;
                }
                Err(err) if is_check_failure(&err) => match state {
                    CleanupState::Reverting => {
                        return Err(SeamError::InconsistentRevertState {
                            patch: patch.clone(),
                            tree: ctx.tree.to_path_buf(),
                            diagnostics: err.to_string(),
                        });
                    }
                    CleanupState::NothingReverted => {
                        info!(
                            patch = %patch.display(),
                            "revert check failed; patch was likely never applied",
                        );
                    }
                },
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn apply(&self, ctx: &TreeContext<'_>) -> Result<Vec<PatchOutcome>, SeamError> {
        let mut outcomes = Vec::with_capacity(ctx.series.len());
        for patch in ctx.series.iter() {
            match self.primitives.check_apply(ctx, patch) {
                Ok(()) => {
                    if let Err(err) = self.primitives.apply(ctx, patch) {
                        return Err(if is_check_failure(&err) {
                            SeamError::ApplyFailed {
                                patch: patch.clone(),
                                tree: ctx.tree.to_path_buf(),
                                strategy: self.primitives.label(),
                                after_successful_check: true,
                                diagnostics: err.to_string(),
                            }
                        } else {
                            err.into()
                        });
                    }
                    info!(patch = %patch.display(), "applied");
                    outcomes.push(PatchOutcome {
                        patch: patch.clone(),
                        outcome: PatchApplyOutcome::Applied,
                    });
                }
                Err(check_err) if is_check_failure(&check_err) => {
                    // The apply check said no. If the reverse check says
                    // yes, the patch is simply already in the tree.
                    match self.primitives.check_revert(ctx, patch) {
                        Ok(()) => {
                            info!(patch = %patch.display(), "already applied, doing nothing");
                            outcomes.push(PatchOutcome {
                                patch: patch.clone(),
                                outcome: PatchApplyOutcome::AlreadyApplied,
                            });
                        }
                        Err(err) if is_check_failure(&err) => {
                            return Err(SeamError::ApplyFailed {
                                patch: patch.clone(),
                                tree: ctx.tree.to_path_buf(),
                                strategy: self.primitives.label(),
                                after_successful_check: false,
                                diagnostics: check_err.to_string(),
                            });
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(outcomes)
    }
}

// ---------------------------------------------------------------------------
// Tests — the protocol against a scriptable mock backend
// ---------------------------------------------------------------------------

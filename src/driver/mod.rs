//! The patch driver — converge a vendored tree to "fully patched".
//!
//! The driver is stateless: it never records patch progress anywhere.
//! Every run first undoes whatever previous runs may have applied, then
//! applies the full series again, so a tree in any starting state
//! (unpatched, patched, or half-patched by an interrupted build) ends in
//! the same place.
//!
//! Three interchangeable [`Strategy`] implementations cover the tooling
//! situations a build host can be in:
//!
//! - [`mailbox`] — `git am` over a real repository checkout; cleanup is a
//!   hard reset, apply is one atomic mailbox invocation.
//! - [`git_apply`] — `git apply` without trusting repository state, via
//!   the shared two-phase protocol.
//! - [`patch_util`] — standalone `patch(1)`, same two-phase protocol.
//!
//! Selection happens once, up front, from probed tool availability and
//! whether the source root is a repository. Callers must not run two
//! drivers against the same tree concurrently; nothing here locks.

mod git_apply;
mod mailbox;
mod patch_util;
mod two_phase;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use seam_tools::Toolchain;

use crate::config::Project;
use crate::error::SeamError;
use crate::series::PatchSeries;

pub(crate) use two_phase::PatchPrimitives;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Per-patch result of a converge run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchApplyOutcome {
    /// The patch was applied by this run.
    Applied,
    /// The patch was already present and was left alone.
    AlreadyApplied,
}

/// A patch paired with what happened to it.
#[derive(Clone, Debug)]
pub struct PatchOutcome {
    /// The patch file.
    pub patch: PathBuf,
    /// What the driver did with it.
    pub outcome: PatchApplyOutcome,
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// Everything a strategy needs to know about the tree it is converging.
#[derive(Clone, Copy, Debug)]
pub struct TreeContext<'a> {
    /// Absolute directory all tool invocations run from.
    pub source_root: &'a Path,
    /// Vendored tree path relative to the source root.
    pub tree: &'a Path,
    /// The ordered patch series, absolute paths.
    pub series: &'a PatchSeries,
}

/// A patching capability: wipe the tree back to pristine, then bring the
/// whole series on.
///
/// Implementations differ only in which external tool does the work; the
/// contract is identical: after `cleanup` + `apply` succeed, the tree is
/// bit-for-bit pristine-plus-series.
pub trait Strategy {
    /// Short human-readable name, used in logs and errors.
    fn label(&self) -> &'static str;

    /// Bring the tree back to its unpatched state (or prove it already is).
    fn cleanup(&self, ctx: &TreeContext<'_>) -> Result<(), SeamError>;

    /// Apply the full series in order.
    fn apply(&self, ctx: &TreeContext<'_>) -> Result<Vec<PatchOutcome>, SeamError>;
}

// ---------------------------------------------------------------------------
// Convergence phases
// ---------------------------------------------------------------------------

/// Progress of a converge run. Purely sequential; `Failed` is represented
/// by the error return, not a variant, so the type cannot express an
/// impossible "failed then kept going" history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Reverting,
    Applying,
    Converged,
}

impl Phase {
    /// The only legal successor of each phase.
    const fn next(self) -> Self {
        match self {
            Self::NotStarted => Self::Reverting,
            Self::Reverting => Self::Applying,
            Self::Applying | Self::Converged => Self::Converged,
        }
    }
}

fn advance(phase: &mut Phase) {
    let next = phase.next();
    debug!(from = ?phase, to = ?next, "phase transition");
    *phase = next;
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Pick the best strategy for the probed toolchain and source root.
///
/// A configured tool that fails its `--version` probe is treated as
/// unavailable (with a warning) rather than failing later mid-run.
pub fn select_strategy(
    source_root: &Path,
    tools: &Toolchain,
) -> Result<Box<dyn Strategy>, SeamError> {
    let in_repo = source_root.join(".git").exists();

    let git = tools.git.as_ref().filter(|git| match git.version() {
        Ok(version) => {
            debug!(%version, "probed git");
            true
        }
        Err(err) => {
            warn!(exe = %git.exe().display(), %err, "configured git is unusable");
            false
        }
    });
    let patch = tools.patch.as_ref().filter(|patch| match patch.version() {
        Ok(version) => {
            debug!(%version, "probed patch");
            true
        }
        Err(err) => {
            warn!(exe = %patch.exe().display(), %err, "configured patch is unusable");
            false
        }
    });

    if let Some(git) = git {
        if in_repo {
            info!("using 'git am' patch strategy: the source root is a git repository");
            return Ok(Box::new(mailbox::Mailbox::new(git.clone())));
        }
        info!("using 'git apply' patch strategy: the source root is not a git repository");
        return Ok(Box::new(two_phase::TwoPhase::new(
            git_apply::GitApplyPrimitives::new(git.clone()),
        )));
    }

    if let Some(patch) = patch {
        if in_repo {
            warn!(
                "the source root looks like a git repository but no usable git was found; \
                 'git am' patching is more reliable and easier to recover than 'patch'"
            );
        } else {
            warn!("not in a git repository; using the less reliable 'patch' strategy");
        }
        return Ok(Box::new(two_phase::TwoPhase::new(
            patch_util::PatchUtilPrimitives::new(patch.clone()),
        )));
    }

    Err(SeamError::ToolUnavailable)
}

// ---------------------------------------------------------------------------
// Converge
// ---------------------------------------------------------------------------

/// Bring one vendored project to its fully patched state.
///
/// Idempotent: running this twice in a row leaves the tree in the same
/// final state as running it once.
pub fn converge(
    source_root: &Path,
    project: &Project,
    tools: &Toolchain,
) -> Result<Vec<PatchOutcome>, SeamError> {
    if !source_root.join(&project.tree).is_dir() {
        return Err(SeamError::TreeMissing {
            tree: project.tree.clone(),
        });
    }
    if project.series.is_empty() {
        info!(project = %project.name, "no patches declared; nothing to do");
        return Ok(Vec::new());
    }

    let strategy = select_strategy(source_root, tools)?;
    let ctx = TreeContext {
        source_root,
        tree: &project.tree,
        series: &project.series,
    };

    let mut phase = Phase::NotStarted;
    info!(
        project = %project.name,
        tree = %project.tree.display(),
        patches = project.series.len(),
        strategy = strategy.label(),
        "converging",
    );

    advance(&mut phase); // Reverting
    strategy.cleanup(&ctx)?;

    advance(&mut phase); // Applying
    let outcomes = strategy.apply(&ctx)?;

    advance(&mut phase); // Converged
    debug_assert_eq!(phase, Phase::Converged);
    info!(project = %project.name, "converged");
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

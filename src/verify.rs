//! Patch identity verification and provenance.
//!
//! The verifier proves that a repository's newest commits are exactly the
//! expected patch series — by content identity, not by commit hash, so the
//! proof holds no matter whether the patches landed via `git am`, a rebase,
//! or a by-hand replay with different authors and dates.
//!
//! Alignment is reverse-chronological: the *last* series element is the
//! most recently applied patch and therefore corresponds to `HEAD`; the
//! first element sits deepest in history. Verification walks the series in
//! that reverse order and stops at the first mismatch.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use seam_tools::{GitTool, PatchId};

use crate::config::Project;
use crate::error::SeamError;
use crate::series::PatchSeries;

// ---------------------------------------------------------------------------
// Verification gate
// ---------------------------------------------------------------------------

/// Verify that `repo`'s newest commits carry exactly `series`, in order.
///
/// Read-only: nothing on disk is touched. The first identity mismatch
/// fails immediately with both identities attached; remaining patches are
/// not checked.
pub fn verify(git: &GitTool, repo: &Path, series: &PatchSeries) -> Result<(), SeamError> {
    for (depth, patch) in series.iter().rev().enumerate() {
        debug!(depth, patch = %patch.display(), "checking patch identity");
        let commit_id = PatchId::of_commit(git, repo, depth)?;
        let file_id = PatchId::of_file(git, patch)?;
        if commit_id != file_id {
            return Err(SeamError::Mismatch {
                repo: repo.to_path_buf(),
                patch: patch.clone(),
                position: depth,
                commit_id: commit_id.to_string(),
                file_id: file_id.to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Provenance record
// ---------------------------------------------------------------------------

/// The verified provenance of one vendored tree.
///
/// This is the record a downstream manifest or SBOM builder consumes after
/// the verification gate passed: it may assert that the tree's history
/// corresponds 1:1 to the named patch files.
#[derive(Clone, Debug, Serialize)]
pub struct Provenance {
    /// Project name from the manifest.
    pub project: String,
    /// Tree path relative to the source root.
    pub tree: String,
    /// Commit hash of the tree's `HEAD`.
    pub head: String,
    /// Per-patch provenance, in application order.
    pub patches: Vec<PatchProvenance>,
}

/// Identity and digest of one verified patch file.
#[derive(Clone, Debug, Serialize)]
pub struct PatchProvenance {
    /// Patch file path.
    pub file: String,
    /// Content identity (`git patch-id --stable`).
    pub patch_id: String,
    /// SHA-256 of the patch file bytes.
    pub sha256: String,
}

/// Run the verification gate, then build the [`Provenance`] record.
pub fn provenance(
    git: &GitTool,
    source_root: &Path,
    project: &Project,
) -> Result<Provenance, SeamError> {
    let repo = source_root.join(&project.tree);
    verify(git, &repo, &project.series)?;

    let head = git.rev_parse_head(&repo)?;
    let patches = project
        .series
        .iter()
        .map(|patch| {
            let bytes = fs::read(patch).map_err(|err| {
                SeamError::Io(io::Error::new(
                    err.kind(),
                    format!("{}: {err}", patch.display()),
                ))
            })?;
            let digest = Sha256::digest(&bytes);
            Ok(PatchProvenance {
                file: patch.display().to_string(),
                patch_id: PatchId::of_file(git, patch)?.to_string(),
                sha256: format!("{digest:x}"),
            })
        })
        .collect::<Result<Vec<_>, SeamError>>()?;

    Ok(Provenance {
        project: project.name.clone(),
        tree: project.tree.display().to_string(),
        head,
        patches,
    })
}

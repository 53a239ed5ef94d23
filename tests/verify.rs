//! End-to-end verification tests: patch identities against real history.

#![allow(clippy::all, clippy::pedantic, clippy::nursery)]

mod common;

use std::fs;
use std::path::PathBuf;

use seam::driver;
use seam::error::SeamError;
use seam::series::PatchSeries;
use seam::verify;
use seam_tools::{GitTool, Toolchain};

use common::{Fixture, git, repo_fixture};

/// Converge the repo fixture so its newest commits are the series.
fn converged_fixture() -> Fixture {
    let (fixture, _base) = repo_fixture();
    let tools = Toolchain::from_paths(Some(PathBuf::from("git")), None);
    driver::converge(fixture.source_root(), &fixture.project, &tools).expect("converge");
    fixture
}

#[test]
fn matching_history_verifies() {
    let fixture = converged_fixture();
    let tool = GitTool::new("git");
    verify::verify(&tool, &fixture.tree(), &fixture.project.series).expect("verify");
}

/// Swapping the series must fail at position 0 even though both patches
/// exist as commits — order is part of the claim being verified.
#[test]
fn swapped_series_fails_at_position_zero() {
    let fixture = converged_fixture();
    let tool = GitTool::new("git");

    let mut swapped: Vec<PathBuf> = fixture.project.series.iter().cloned().collect();
    swapped.reverse();
    let err = verify::verify(&tool, &fixture.tree(), &PatchSeries::new(swapped)).unwrap_err();
    match err {
        SeamError::Mismatch {
            position,
            commit_id,
            file_id,
            ..
        } => {
            assert_eq!(position, 0);
            assert_ne!(commit_id, file_id);
        }
        other => panic!("expected Mismatch, got {other}"),
    }
}

#[test]
fn edited_hunk_content_fails_verification() {
    let fixture = converged_fixture();
    let tool = GitTool::new("git");

    // Rewrite the *content* of the newest patch; its identity changes.
    let last = fixture.project.series.as_slice()[1].clone();
    let edited = fs::read_to_string(&last)
        .expect("read patch")
        .replace("beta 2", "beta II");
    fs::write(&last, edited).expect("write patch");

    let err = verify::verify(&tool, &fixture.tree(), &fixture.project.series).unwrap_err();
    match err {
        SeamError::Mismatch { position, patch, .. } => {
            assert_eq!(position, 0);
            assert!(patch.ends_with(last.file_name().expect("file name")));
        }
        other => panic!("expected Mismatch, got {other}"),
    }
}

#[test]
fn edited_metadata_still_verifies() {
    let fixture = converged_fixture();
    let tool = GitTool::new("git");

    // Rewrite author and date headers only; hunks are untouched, so the
    // content identity is unchanged.
    let last = fixture.project.series.as_slice()[1].clone();
    let edited: String = fs::read_to_string(&last)
        .expect("read patch")
        .lines()
        .map(|line| {
            if line.starts_with("From: ") {
                "From: Somebody Else <else@example.com>".to_owned()
            } else if line.starts_with("Date: ") {
                "Date: Thu, 1 Jan 2015 00:00:00 +0000".to_owned()
            } else {
                line.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&last, edited + "\n").expect("write patch");

    verify::verify(&tool, &fixture.tree(), &fixture.project.series).expect("verify");
}

#[test]
fn unrelated_top_commit_fails_verification() {
    let fixture = converged_fixture();
    let tool = GitTool::new("git");

    // A stray commit on top of the series breaks the alignment.
    let tree = fixture.tree();
    fs::write(tree.join("stray.txt"), "not from any patch\n").expect("write");
    git(&tree, &["add", "stray.txt"]);
    git(&tree, &["commit", "-m", "stray"]);

    let err = verify::verify(&tool, &tree, &fixture.project.series).unwrap_err();
    assert!(matches!(err, SeamError::Mismatch { position: 0, .. }));
}

// ---------------------------------------------------------------------------
// Provenance record
// ---------------------------------------------------------------------------

#[test]
fn provenance_records_head_and_digests() {
    let fixture = converged_fixture();
    let tool = GitTool::new("git");

    let record =
        verify::provenance(&tool, fixture.source_root(), &fixture.project).expect("provenance");
    assert_eq!(record.project, "libdemo");
    assert_eq!(record.tree, "vendor/libdemo");
    assert_eq!(record.head, git(&fixture.tree(), &["rev-parse", "HEAD"]));
    assert_eq!(record.patches.len(), 2);
    for patch in &record.patches {
        assert_eq!(patch.patch_id.len(), 40);
        assert_eq!(patch.sha256.len(), 64);
    }

    let json = serde_json::to_string(&record).expect("serialize");
    assert!(json.contains("\"patch_id\""));
    assert!(json.contains("\"sha256\""));
}

#[test]
fn provenance_refuses_unverified_history() {
    let (fixture, _base) = repo_fixture();
    // Never converged: the tree's history does not contain the series.
    let tool = GitTool::new("git");
    let err = verify::provenance(&tool, fixture.source_root(), &fixture.project).unwrap_err();
    assert!(
        matches!(err, SeamError::Mismatch { .. } | SeamError::Tool(_)),
        "got {err}"
    );
}

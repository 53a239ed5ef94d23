//! External tool layer for seam.
//!
//! This crate owns every subprocess interaction with the `git` and
//! `patch(1)` executables. No other seam crate spawns processes directly;
//! instead they depend on `seam-tools` and program against [`GitTool`],
//! [`PatchTool`], and [`PatchId`].
//!
//! # Crate layout
//!
//! - [`tools`] — the [`GitTool`] / [`PatchTool`] wrappers and the probed
//!   [`Toolchain`].
//! - [`patch_id`] — the [`PatchId`] content identity and its two sources
//!   (patch files and commits).
//! - [`error`] — the [`ToolError`] enum returned by everything here.

#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod patch_id;
pub mod tools;

mod invoke;

// Re-export the working vocabulary at the crate root for ergonomic
// imports: `use seam_tools::{GitTool, PatchId, ToolError};`
pub use error::ToolError;
pub use patch_id::PatchId;
pub use tools::{GitTool, PatchTool, Toolchain};

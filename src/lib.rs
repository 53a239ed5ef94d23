//! seam library crate — re-exports for integration tests and embedders.
//!
//! The primary interface is the `seam` binary. This lib.rs exposes the
//! internal modules so that integration tests (and build orchestration
//! that wants to skip the CLI) can drive the converge engine and the
//! verifier directly.

#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod doctor;
pub mod driver;
pub mod error;
pub mod format;
pub mod series;
pub mod telemetry;
pub mod verify;

//! Patch content identities.
//!
//! A [`PatchId`] is the stable fingerprint `git patch-id --stable` computes
//! over a diff's hunks: two semantically equal diffs map to the same
//! identity no matter who authored them, when, or with what commit message.
//! The identity is the full 40-hex-character hash the algorithm emits — the
//! same SHA-1-over-normalized-hunks that git uses internally, so file-side
//! and commit-side identities are directly comparable.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::ToolError;
use crate::invoke::{self, Diagnostics};
use crate::tools::GitTool;

/// A stable, metadata-independent content identity of a patch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PatchId(String);

impl PatchId {
    /// Length of a rendered identity (hex characters).
    pub const LEN: usize = 40;

    /// Identity of an on-disk patch file.
    ///
    /// Feeds the patch text into `git patch-id --stable` on stdin.
    pub fn of_file(git: &GitTool, patch: &Path) -> Result<Self, ToolError> {
        let args: Vec<OsString> = vec!["patch-id".into(), "--stable".into()];
        let (command, output) = invoke::run_checked(
            git.exe(),
            &args,
            Path::new("."),
            Some(patch),
            Diagnostics::Stderr,
        )?;
        Self::parse(&command, &String::from_utf8_lossy(&output.stdout))
    }

    /// Identity of the commit at depth `n` below `HEAD` (`HEAD~n`).
    ///
    /// Spawns `git diff HEAD~n^!` and streams its stdout straight into a
    /// second `git patch-id --stable` process over an OS pipe — the diff is
    /// never materialized in this process. The consumer's output is drained
    /// completely before either exit status is inspected, and both statuses
    /// are checked.
    pub fn of_commit(git: &GitTool, repo_dir: &Path, n: usize) -> Result<Self, ToolError> {
        let diff_args: Vec<OsString> = vec!["diff".into(), format!("HEAD~{n}^!").into()];
        let diff_command = invoke::render(git.exe(), &diff_args);
        let id_args: Vec<OsString> = vec!["patch-id".into(), "--stable".into()];
        let id_command = invoke::render(git.exe(), &id_args);
        debug!(producer = %diff_command, consumer = %id_command, repo = %repo_dir.display(), "piping");

        let mut diff_child = Command::new(git.exe())
            .args(&diff_args)
            .current_dir(repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                command: diff_command.clone(),
                source,
            })?;

        // Hand the producer's stdout to the consumer as stdin. This process
        // keeps no copy of the write end, so the consumer sees EOF as soon
        // as the diff finishes.
        let diff_stdout = diff_child.stdout.take().ok_or_else(|| ToolError::Spawn {
            command: diff_command.clone(),
            source: std::io::Error::other("child stdout was not captured"),
        })?;

        let id_spawn = Command::new(git.exe())
            .args(&id_args)
            .current_dir(repo_dir)
            .stdin(Stdio::from(diff_stdout))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let id_child = match id_spawn {
            Ok(child) => child,
            Err(source) => {
                let _ = diff_child.kill();
                let _ = diff_child.wait();
                return Err(ToolError::Spawn {
                    command: id_command,
                    source,
                });
            }
        };

        // Drain the consumer completely (both streams) before looking at
        // exit codes, otherwise a full pipe buffer could deadlock the pair.
        let id_output = id_child
            .wait_with_output()
            .map_err(|source| ToolError::Spawn {
                command: id_command.clone(),
                source,
            })?;

        // Producer stderr is drained best-effort for diagnostics.
        let mut diff_stderr = Vec::new();
        if let Some(mut stderr) = diff_child.stderr.take() {
            let _ = stderr.read_to_end(&mut diff_stderr);
        }
        let diff_status = diff_child.wait().map_err(|source| ToolError::Spawn {
            command: diff_command.clone(),
            source,
        })?;

        if !diff_status.success() {
            return Err(ToolError::Failed {
                command: diff_command,
                code: diff_status.code(),
                output: String::from_utf8_lossy(&diff_stderr).trim_end().to_owned(),
            });
        }
        if !id_output.status.success() {
            return Err(ToolError::Failed {
                command: id_command,
                code: id_output.status.code(),
                output: invoke::diagnostics_of(&id_output, Diagnostics::Stderr),
            });
        }

        Self::parse(&id_command, &String::from_utf8_lossy(&id_output.stdout))
    }

    /// The identity as a hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the first line of `git patch-id` stdout.
    ///
    /// The line is `<patch-id> <commit-id>`; only the first token is the
    /// identity. Empty output means the input diff was empty — refused,
    /// because an empty identity would compare equal to every other.
    fn parse(command: &str, stdout: &str) -> Result<Self, ToolError> {
        let line = stdout.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            return Err(ToolError::EmptyIdentity {
                command: command.to_owned(),
            });
        }
        let token = line.split_whitespace().next().unwrap_or("");
        if token.len() != Self::LEN || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ToolError::MalformedIdentity {
                command: command.to_owned(),
                line: line.to_owned(),
            });
        }
        Ok(Self(token.to_ascii_lowercase()))
    }
}

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

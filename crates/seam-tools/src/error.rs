//! Error types for external tool invocations.
//!
//! [`ToolError`] is the single error type returned by everything in this
//! crate. Every variant that involves a process carries the rendered
//! command line, so callers can surface exactly what was run without
//! reconstructing it.

use std::io;

use thiserror::Error;

/// Errors from spawning or running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool process could not be started at all (missing executable,
    /// permission problem, ...).
    #[error("could not start `{command}`: {source}")]
    Spawn {
        /// The rendered command line that failed to start.
        command: String,
        /// The underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The tool ran but exited with a non-zero status.
    ///
    /// `output` is the tool's captured diagnostic output. For `git` this is
    /// stderr; for `patch(1)` it is stdout followed by stderr, because GNU
    /// patch reports `--dry-run` failures on stdout.
    #[error("`{command}` exited with {}:\n{output}", code.map_or_else(|| "an unknown status".to_owned(), |c| format!("code {c}")))]
    Failed {
        /// The rendered command line.
        command: String,
        /// The exit code, if the process exited normally.
        code: Option<i32>,
        /// Captured diagnostic output, trimmed.
        output: String,
    },

    /// An identity computation produced no output.
    ///
    /// `git patch-id` prints nothing for an empty diff; an empty identity
    /// would compare equal to every other empty identity, so it is refused.
    #[error("`{command}` produced no identity (empty diff?)")]
    EmptyIdentity {
        /// The rendered command line.
        command: String,
    },

    /// An identity line could not be parsed.
    #[error("`{command}` produced an unparsable identity line: {line:?}")]
    MalformedIdentity {
        /// The rendered command line.
        command: String,
        /// The first line of the tool's stdout.
        line: String,
    },

    /// An I/O error outside a child process (e.g. opening a patch file).
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The path being accessed.
        path: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

//! Subprocess plumbing shared by the tool wrappers.
//!
//! Everything runs to completion, blocking, with captured output. Commands
//! are rendered shell-quoted once and carried through to errors, so a
//! failing invocation is always reported exactly as it was run, including
//! the `< patch` stdin redirection where one is used.

use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use crate::error::ToolError;

/// Which streams a tool reports diagnostics on.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Diagnostics {
    /// git convention: errors go to stderr.
    Stderr,
    /// GNU patch reports `--dry-run` failures on stdout, so stdout is the
    /// primary diagnostic stream and stderr is appended after it.
    StdoutThenStderr,
}

/// Render a command line for logs and error messages.
pub(crate) fn render(program: &Path, args: &[OsString]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(shell_escape::escape(program.to_string_lossy()).into_owned());
    for arg in args {
        parts.push(shell_escape::escape(arg.to_string_lossy()).into_owned());
    }
    parts.join(" ")
}

/// [`render`], plus the stdin redirection if the child is fed from a file.
pub(crate) fn render_with_stdin(
    program: &Path,
    args: &[OsString],
    stdin_path: Option<&Path>,
) -> String {
    let mut rendered = render(program, args);
    if let Some(path) = stdin_path {
        rendered.push_str(" < ");
        rendered.push_str(&shell_escape::escape(path.to_string_lossy()));
    }
    rendered
}

/// Collect a child's diagnostic output per the tool's convention.
pub(crate) fn diagnostics_of(output: &Output, diag: Diagnostics) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = match diag {
        Diagnostics::Stderr => stderr.into_owned(),
        Diagnostics::StdoutThenStderr => {
            let mut text = stdout.into_owned();
            if !stderr.trim().is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&stderr);
            }
            text
        }
    };
    text.trim_end().to_owned()
}

/// Run a tool to completion with captured output, failing on non-zero exit.
///
/// `cwd` is always explicit — this crate never relies on the process-wide
/// working directory. `stdin_path` feeds the child from a file (patch
/// input); `None` closes stdin. Returns the rendered command line alongside
/// the output so callers can attach it to their own errors.
pub(crate) fn run_checked(
    program: &Path,
    args: &[OsString],
    cwd: &Path,
    stdin_path: Option<&Path>,
    diag: Diagnostics,
) -> Result<(String, Output), ToolError> {
    let command = render_with_stdin(program, args, stdin_path);
    debug!(command = %command, cwd = %cwd.display(), "running");

    let stdin = match stdin_path {
        Some(path) => Stdio::from(open_file(path)?),
        None => Stdio::null(),
    };

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ToolError::Spawn {
            command: command.clone(),
            source,
        })?;

    if output.status.success() {
        Ok((command, output))
    } else {
        Err(ToolError::Failed {
            code: output.status.code(),
            output: diagnostics_of(&output, diag),
            command,
        })
    }
}

fn open_file(path: &Path) -> Result<File, ToolError> {
    File::open(path).map_err(|source| ToolError::Io {
        path: path.display().to_string(),
        source,
    })
}

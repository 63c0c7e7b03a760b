//! External command plumbing shared by the camera and OCR collaborators.
//!
//! Commands are configured as argv templates. A placeholder such as
//! `{image}` is replaced with a path before spawning.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no command configured")]
    Empty,
    #[error("'{program}' not found on PATH: {source}")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Substitute `placeholder` in every argument of `template` with `value`.
pub fn render_argv(template: &[String], placeholder: &str, value: &Path) -> Vec<String> {
    let value = value.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace(placeholder, &value))
        .collect()
}

/// Resolve the program named by `argv[0]`.
pub fn resolve_program(argv: &[String]) -> Result<PathBuf, ProcessError> {
    let program = argv.first().ok_or(ProcessError::Empty)?;
    which::which(program).map_err(|source| ProcessError::NotFound {
        program: program.clone(),
        source,
    })
}

/// Run `argv` to completion, capturing stdout and stderr.
///
/// The child is killed if the returned future is dropped before it exits.
pub async fn run(argv: &[String]) -> Result<Output, ProcessError> {
    let binary = resolve_program(argv)?;
    log::debug!("[PROCESS] Spawning {}", argv.join(" "));

    tokio::process::Command::new(&binary)
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ProcessError::Spawn {
            program: argv[0].clone(),
            source,
        })
}

/// First line of stderr, trimmed, for error messages.
pub fn stderr_summary(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

//! Thin wrapper around invoking the external `ffmpeg` binary.
//!
//! Both the frame extractor and the video assembler go through [`run`], so
//! "binary missing" and "non-zero exit" are reported the same way and the
//! stage can wrap them into its own error.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

/// Why an external process invocation failed
#[derive(Error, Debug)]
pub enum ProcessFailure {
    /// The binary could not be located
    #[error("'{program}' not found; install ffmpeg or set binaries.ffmpeg")]
    NotFound { program: String },

    /// The binary exists but could not be started
    #[error("could not start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("exit status {code}: {}", .stderr.trim())]
    Exit { code: i32, stderr: String },

    /// The process was killed before it could exit
    #[error("terminated by signal: {}", .stderr.trim())]
    Terminated { stderr: String },
}

/// Run `program` with `args`, capturing output, and wait for it to finish.
pub fn run(program: &Path, args: &[OsString]) -> Result<(), ProcessFailure> {
    let program_name = program.display().to_string();
    debug!("Running: {} {}", program_name, render_args(args));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProcessFailure::NotFound { program: program_name.clone() },
            _ => ProcessFailure::Spawn { program: program_name.clone(), source: e },
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(match output.status.code() {
            Some(code) => ProcessFailure::Exit { code, stderr },
            None => ProcessFailure::Terminated { stderr },
        });
    }

    Ok(())
}

/// Check that `program -version` runs successfully
pub fn is_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

//! Error types for kernel-builder

use thiserror::Error;

/// Errors raised while driving the external toolchain.
///
/// Everything else (filesystem, settings) travels as `anyhow::Error` with
/// context attached; these variants stay typed so callers can tell a failed
/// child process apart from unexpected toolchain output.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A child process ran and exited unsuccessfully.
    #[error("command failed: `{}` ({})", .argv.join(" "), describe_exit(.code))]
    CommandExecution {
        argv: Vec<String>,
        /// `None` when the child was terminated by a signal.
        code: Option<i32>,
        stderr: String,
    },

    /// The child process could not be started at all.
    #[error("failed to execute `{}`: {source}", .argv.join(" "))]
    Spawn {
        argv: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    /// Toolchain output did not contain the expected text.
    #[error("failed to match `{pattern}` in toolchain output:\n{output}")]
    PatternMatch { pattern: String, output: String },
}

impl BuildError {
    /// Exit code of a failed child, if this is a command failure that carries one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::CommandExecution { code, .. } => *code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

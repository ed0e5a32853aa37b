//! Toolchain probe.
//!
//! Confirms the bundled clang runs and pulls a human-readable version out of
//! `clang -v`. Version extraction is a pure function over text so it can be
//! tested without a toolchain on disk.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::BuildError;
use crate::process::{Cmd, CommandRunner};

/// Matches from the start of a line up to the dotted clang version.
pub const CLANG_VERSION_PATTERN: &str = r"(?m)^(.*?clang version \d+(?:\.\d+)*)";

fn clang_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CLANG_VERSION_PATTERN).expect("CLANG_VERSION_PATTERN is valid"))
}

/// Extract `... clang version X.Y.Z` from toolchain output.
///
/// Returns the line prefix ending at the version number, e.g.
/// `"clang version 17.0.6"` for `"clang version 17.0.6 (https://...)"`.
pub fn parse_clang_version(output: &str) -> Option<String> {
    clang_version_regex()
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Like [`parse_clang_version`], failing with [`BuildError::PatternMatch`].
pub fn extract_clang_version(output: &str) -> Result<String, BuildError> {
    parse_clang_version(output).ok_or_else(|| BuildError::PatternMatch {
        pattern: CLANG_VERSION_PATTERN.to_string(),
        output: output.to_string(),
    })
}

/// Location of the compiler toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    bin_dir: PathBuf,
    compiler: PathBuf,
}

impl Toolchain {
    /// `bin_dir` should already be absolute; `compiler` is a file name inside it.
    pub fn new(bin_dir: impl Into<PathBuf>, compiler: &str) -> Self {
        let bin_dir = bin_dir.into();
        let compiler = bin_dir.join(compiler);
        Self { bin_dir, compiler }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    fn version_query(&self) -> Cmd {
        Cmd::new(self.compiler.as_os_str()).arg("-v")
    }

    /// Run `<compiler> -v` and fail loudly if it does not run cleanly.
    pub fn test_executable(&self, runner: &impl CommandRunner) -> Result<(), BuildError> {
        runner.run(&self.version_query()).map(|_| ()).map_err(|e| {
            println!("Failed to execute clang. Ensure the toolchain is configured correctly.");
            e
        })
    }

    /// Query the compiler and return its version line.
    pub fn get_version(&self, runner: &impl CommandRunner) -> Result<String, BuildError> {
        let output = runner.run(&self.version_query())?;
        extract_clang_version(&output.combined())
    }

    /// Probe the toolchain and describe it.
    pub fn probe(&self, runner: &impl CommandRunner) -> Result<ToolchainInfo, BuildError> {
        self.test_executable(runner)?;
        let version = self.get_version(runner)?;
        Ok(ToolchainInfo {
            bin_dir: self.bin_dir.clone(),
            version,
        })
    }
}

/// What preflight learned about the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    pub bin_dir: PathBuf,
    pub version: String,
}

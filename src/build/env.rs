//! Child process environment.
//!
//! The toolchain's `bin` directory must win the executable lookup for every
//! child (so `make LLVM=1` finds the bundled `clang`, `ld.lld`, `llvm-ar`...).
//! Rather than mutating this process's environment, the prepared `PATH` is
//! carried in a [`BuildEnv`] and applied to each [`Cmd`].

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::process::Cmd;

/// Name of the executable search path variable.
pub const PATH_VAR: &str = "PATH";

/// Prepend `dir` to a search path unless it is already an entry.
///
/// Returns the (possibly unchanged) value. Applying it twice never
/// duplicates `dir`.
pub fn prepend_search_path(existing: Option<&OsStr>, dir: &Path) -> Result<OsString> {
    let entries: Vec<PathBuf> = existing
        .map(|value| env::split_paths(value).collect())
        .unwrap_or_default();

    if entries.iter().any(|entry| entry == dir) {
        return Ok(existing.map(OsStr::to_os_string).unwrap_or_default());
    }

    let mut paths = Vec::with_capacity(entries.len() + 1);
    paths.push(dir.to_path_buf());
    paths.extend(entries);
    env::join_paths(paths)
        .with_context(|| format!("adding '{}' to {}", dir.display(), PATH_VAR))
}

/// Environment handed to every child process of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    search_path: OsString,
}

impl BuildEnv {
    /// Prepare from an explicit base `PATH` value.
    pub fn from_search_path(base: Option<&OsStr>, toolchain_bin: &Path) -> Result<Self> {
        Ok(Self {
            search_path: prepend_search_path(base, toolchain_bin)?,
        })
    }

    pub fn search_path(&self) -> &OsStr {
        &self.search_path
    }

    pub fn apply(&self, cmd: Cmd) -> Cmd {
        cmd.env(PATH_VAR, &self.search_path)
    }
}

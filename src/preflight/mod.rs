//! Preflight checks for build validation.
//!
//! Validates that the host has what the build needs before anything is
//! spawned or deleted. This prevents cryptic errors halfway through a
//! kernel build.
//!
//! Tool lookups use the search path the build's children will see, not
//! this process's `PATH`.
//!
//! # Example
//!
//! ```rust
//! use std::ffi::OsStr;
//! use std::path::Path;
//! use kernel_builder::preflight::{command_exists, check_required_tools};
//!
//! let search_path = OsStr::new("/opt/toolchain/bin:/usr/bin:/bin");
//! if !command_exists("make", search_path, Path::new("/")) {
//!     println!("make not installed");
//! }
//!
//! let tools = &[("make", "make"), ("bc", "bc")];
//! if let Err(e) = check_required_tools(tools, search_path, Path::new("/")) {
//!     eprintln!("{}", e);
//! }
//! ```

use std::ffi::OsStr;
use std::path::Path;

use anyhow::{bail, Result};

/// Check if a command resolves on `search_path`.
///
/// Relative entries and relative `cmd` values resolve against `cwd`.
pub fn command_exists(cmd: &str, search_path: &OsStr, cwd: &Path) -> bool {
    which::which_in(cmd, Some(search_path), cwd).is_ok()
}

/// Print and return whether `path` exists.
pub fn check_file(path: &Path) -> bool {
    print!("Checking file if exists: {}... ", path.display());
    let exists = path.exists();
    println!("{}", if exists { "Found" } else { "Not found" });
    exists
}

/// Check that specific tools resolve on `search_path`.
///
/// Each tuple is (command, package).
pub fn check_required_tools(tools: &[(&str, &str)], search_path: &OsStr, cwd: &Path) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .copied()
        .filter(|(tool, _)| !command_exists(tool, search_path, cwd))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let msg = missing
        .iter()
        .map(|(t, p)| format!("  {} (install: {})", t, p))
        .collect::<Vec<_>>()
        .join("\n");
    bail!("Missing required host tools:\n{}", msg);
}

//! Build settings.
//!
//! Defaults match the checkout layout the builder expects (`toolchain/bin/clang`,
//! `out/`). An optional `kernel-builder.toml` at the build root can move
//! those around; CLI flags override both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// File name looked up at the build root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "kernel-builder.toml";

pub const DEFAULT_TOOLCHAIN_DIR: &str = "toolchain/bin";
pub const DEFAULT_COMPILER: &str = "clang";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_MAKE: &str = "make";

/// Effective settings for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Toolchain `bin` directory, relative to the root or absolute.
    pub toolchain_dir: PathBuf,
    /// Compiler file name inside `toolchain_dir`.
    pub compiler: String,
    /// Out-of-tree build directory, relative to the root or absolute.
    pub out_dir: PathBuf,
    /// Program used for both make steps.
    pub make: String,
    /// Parallel jobs; `None` means one per available processing unit.
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            toolchain_dir: PathBuf::from(DEFAULT_TOOLCHAIN_DIR),
            compiler: DEFAULT_COMPILER.to_string(),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            make: DEFAULT_MAKE.to_string(),
            jobs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    #[serde(default)]
    toolchain: ToolchainToml,
    #[serde(default)]
    build: BuildToml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolchainToml {
    dir: Option<PathBuf>,
    compiler: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildToml {
    out_dir: Option<PathBuf>,
    make: Option<String>,
    jobs: Option<usize>,
}

impl Settings {
    /// Parse settings from TOML text on top of the defaults.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let parsed: SettingsToml = toml::from_str(text)
            .with_context(|| format!("parsing settings '{}'", origin.display()))?;

        let defaults = Settings::default();
        let settings = Settings {
            toolchain_dir: parsed.toolchain.dir.unwrap_or(defaults.toolchain_dir),
            compiler: parsed.toolchain.compiler.unwrap_or(defaults.compiler),
            out_dir: parsed.build.out_dir.unwrap_or(defaults.out_dir),
            make: parsed.build.make.unwrap_or(defaults.make),
            jobs: parsed.build.jobs,
        };
        settings
            .validate()
            .with_context(|| format!("invalid settings '{}'", origin.display()))?;
        Ok(settings)
    }

    /// Load settings for a build rooted at `root`.
    ///
    /// An explicit path must exist. Without one, `<root>/kernel-builder.toml`
    /// is used when present and the defaults otherwise.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                let path = resolve(root, path);
                if !path.is_file() {
                    bail!("settings file not found: {}", path.display());
                }
                path
            }
            None => {
                let path = root.join(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Settings::default());
                }
                path
            }
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading settings '{}'", path.display()))?;
        let settings = Self::from_toml_str(&text, &path)?;
        tracing::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply a `--jobs` override.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Result<Self> {
        if jobs.is_some() {
            self.jobs = jobs;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.compiler.trim().is_empty() {
            bail!("toolchain.compiler must not be empty");
        }
        if self.compiler.contains('/') {
            bail!(
                "toolchain.compiler must be a file name inside toolchain.dir, got '{}'",
                self.compiler
            );
        }
        if self.make.trim().is_empty() {
            bail!("build.make must not be empty");
        }
        if self.out_dir.as_os_str().is_empty() {
            bail!("build.out_dir must not be empty");
        }
        if self.jobs == Some(0) {
            bail!("jobs must be at least 1");
        }
        Ok(())
    }

    /// Absolute toolchain `bin` directory.
    pub fn toolchain_dir_in(&self, root: &Path) -> PathBuf {
        resolve(root, &self.toolchain_dir)
    }

    /// Absolute output directory.
    pub fn out_dir_in(&self, root: &Path) -> PathBuf {
        resolve(root, &self.out_dir)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

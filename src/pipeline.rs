//! Build orchestration.
//!
//! One forward path with early exits:
//!
//! ```text
//! target check -> toolchain check -> probe -> version -> env -> clean
//!     -> defconfig -> build -> verify image
//! ```
//!
//! Target and toolchain problems are *rejections*: guidance is printed and
//! the build stops before touching the filesystem or spawning anything. A
//! missing image after a successful compile is reported the same soft way.
//! Probe, version and make failures are errors and abort the run.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::build::context::BuildContext;
use crate::build::env::{BuildEnv, PATH_VAR};
use crate::build::kernel::{self, CleanOutcome};
use crate::config::Settings;
use crate::preflight;
use crate::process::CommandRunner;
use crate::target::Target;
use crate::toolchain::ToolchainInfo;

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub target: String,
    pub allow_dirty: bool,
}

impl BuildRequest {
    pub fn new(target: impl Into<String>, allow_dirty: bool) -> Self {
        Self {
            target: target.into(),
            allow_dirty,
        }
    }
}

/// Why a build was refused before it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnsupportedTarget { requested: String },
    ToolchainMissing { root: PathBuf, compiler: PathBuf },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnsupportedTarget { .. } => write!(
                f,
                "Please specify a valid target: {}",
                Target::supported_names()
            ),
            Rejection::ToolchainMissing { root, .. } => write!(
                f,
                "Toolchain not found in {}. Ensure the toolchain is correctly set up.",
                root.display()
            ),
        }
    }
}

/// A finished kernel build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub target: Target,
    pub toolchain: ToolchainInfo,
    /// Absolute path of the produced image.
    pub image: PathBuf,
    pub clean: CleanOutcome,
    pub jobs: usize,
    /// Configure + compile wall-clock time.
    pub elapsed: Duration,
}

/// How a run ended, short of an error.
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    Rejected(Rejection),
    /// make reported success but the image is not there.
    ArtifactMissing { expected: PathBuf },
    Built(BuildSummary),
}

/// Drives one kernel build through a [`CommandRunner`].
pub struct KernelBuilder<R> {
    runner: R,
    root: PathBuf,
    settings: Settings,
    base_search_path: Option<OsString>,
}

impl<R: CommandRunner> KernelBuilder<R> {
    /// `root` is the kernel source tree and should be absolute.
    pub fn new(runner: R, root: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            runner,
            root: root.into(),
            settings,
            base_search_path: std::env::var_os(PATH_VAR),
        }
    }

    /// Use `path` instead of this process's `PATH` as the base search path.
    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.base_search_path = path;
        self
    }

    pub fn run(&self, request: &BuildRequest) -> Result<BuildOutcome> {
        let Some(target) = Target::parse(&request.target) else {
            return Ok(self.reject(Rejection::UnsupportedTarget {
                requested: request.target.clone(),
            }));
        };
        tracing::debug!("target {} ({})", target, target.arch());

        let ctx = BuildContext::new(&self.root, target, &self.settings);
        if !preflight::check_file(ctx.toolchain.compiler()) {
            return Ok(self.reject(Rejection::ToolchainMissing {
                root: self.root.clone(),
                compiler: ctx.toolchain.compiler().to_path_buf(),
            }));
        }

        let toolchain = ctx.toolchain.probe(&self.runner)?;
        println!("Using toolchain: {}", toolchain.version);

        let env = BuildEnv::from_search_path(
            self.base_search_path.as_deref(),
            ctx.toolchain.bin_dir(),
        )?;
        preflight::check_required_tools(&[(ctx.make.as_str(), "make")], env.search_path(), &ctx.root)
            .context("checking host tools for the kernel build")?;

        let clean = kernel::clean_output_dir(&ctx.out_path, request.allow_dirty)?;
        tracing::debug!("clean step: {:?}", clean);

        let started = Instant::now();
        kernel::configure(&self.runner, &ctx, &env)?;
        kernel::compile(&self.runner, &ctx, &env)?;
        let elapsed = started.elapsed();

        let image = ctx.image_path();
        if !preflight::check_file(&image) {
            println!("Kernel build failed. Check logs for details.");
            return Ok(BuildOutcome::ArtifactMissing { expected: image });
        }

        println!(
            "Kernel build completed in {} seconds.",
            elapsed.as_secs_f64()
        );
        println!("Image file generated: {}", ctx.image_display_path().display());

        Ok(BuildOutcome::Built(BuildSummary {
            target,
            toolchain,
            image,
            clean,
            jobs: ctx.jobs,
            elapsed,
        }))
    }

    fn reject(&self, rejection: Rejection) -> BuildOutcome {
        println!("{}", rejection);
        BuildOutcome::Rejected(rejection)
    }
}

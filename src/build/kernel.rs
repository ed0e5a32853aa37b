//! Kernel configure/compile steps.
//!
//! Both steps drive the kernel's own build system out of tree with the
//! LLVM toolchain:
//!
//! ```text
//! make O=out ARCH=arm64 LLVM=1 -j<N> evergo_defconfig
//! make O=out ARCH=arm64 LLVM=1 -j<N>
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use kernel_builder::build::kernel::{clean_output_dir, configure, compile};
//!
//! clean_output_dir(&ctx.out_path, allow_dirty)?;
//! configure(&runner, &ctx, &env)?;
//! compile(&runner, &ctx, &env)?;
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::context::BuildContext;
use super::env::BuildEnv;
use crate::error::BuildError;
use crate::process::{Cmd, CommandRunner};

/// What the clean step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
    /// The output directory existed and was deleted.
    Removed,
    /// The output directory exists and was kept (`--allow-dirty`).
    Kept,
    /// Nothing to clean.
    Absent,
}

/// Overrides shared by every make invocation.
pub fn make_overrides(ctx: &BuildContext) -> Vec<String> {
    vec![
        format!("O={}", ctx.out_dir.display()),
        format!("ARCH={}", ctx.target.arch()),
        "LLVM=1".to_string(),
        format!("-j{}", ctx.jobs),
    ]
}

fn make(ctx: &BuildContext, env: &BuildEnv) -> Cmd {
    env.apply(Cmd::new(&ctx.make))
        .args(make_overrides(ctx))
        .current_dir(&ctx.root)
}

/// `make ... <target>_defconfig`
pub fn defconfig_command(ctx: &BuildContext, env: &BuildEnv) -> Cmd {
    make(ctx, env).arg(ctx.target.defconfig())
}

/// `make ...` (full kernel build)
pub fn build_command(ctx: &BuildContext, env: &BuildEnv) -> Cmd {
    make(ctx, env)
}

/// Delete the output directory unless dirty builds are allowed.
pub fn clean_output_dir(out_dir: &Path, allow_dirty: bool) -> Result<CleanOutcome> {
    if !out_dir.exists() {
        return Ok(CleanOutcome::Absent);
    }
    if allow_dirty {
        return Ok(CleanOutcome::Kept);
    }

    println!("Cleaning output directory...");
    fs::remove_dir_all(out_dir)
        .with_context(|| format!("removing output directory '{}'", out_dir.display()))?;
    Ok(CleanOutcome::Removed)
}

/// Generate `.config` from the target's defconfig.
pub fn configure(
    runner: &impl CommandRunner,
    ctx: &BuildContext,
    env: &BuildEnv,
) -> Result<(), BuildError> {
    println!("Running defconfig...");
    runner.run(&defconfig_command(ctx, env)).map(|_| ())
}

/// Build the kernel image.
pub fn compile(
    runner: &impl CommandRunner,
    ctx: &BuildContext,
    env: &BuildEnv,
) -> Result<(), BuildError> {
    println!("Building kernel...");
    runner.run(&build_command(ctx, env)).map(|_| ())
}

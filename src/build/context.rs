//! Build context.
//!
//! Everything the make steps need, resolved once from the build root, the
//! chosen target and the effective [`Settings`].

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::target::Target;
use crate::toolchain::Toolchain;

/// Fallback when the processor count cannot be detected.
pub const FALLBACK_JOBS: usize = 4;

/// Resolved inputs for one kernel build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Directory the make steps run in (the kernel source tree).
    pub root: PathBuf,
    pub target: Target,
    pub toolchain: Toolchain,
    /// Output directory as passed to `make O=...`.
    pub out_dir: PathBuf,
    /// `out_dir` resolved against `root`.
    pub out_path: PathBuf,
    /// Make program.
    pub make: String,
    /// Parallel jobs for `make -j`.
    pub jobs: usize,
}

impl BuildContext {
    pub fn new(root: &Path, target: Target, settings: &Settings) -> Self {
        Self {
            root: root.to_path_buf(),
            target,
            toolchain: Toolchain::new(settings.toolchain_dir_in(root), &settings.compiler),
            out_dir: settings.out_dir.clone(),
            out_path: settings.out_dir_in(root),
            make: settings.make.clone(),
            jobs: settings.jobs.unwrap_or_else(available_jobs),
        }
    }

    /// Expected kernel image, as shown to the operator (relative when `out_dir` is).
    pub fn image_display_path(&self) -> PathBuf {
        self.out_dir.join(self.target.image_relpath())
    }

    /// Expected kernel image, absolute.
    pub fn image_path(&self) -> PathBuf {
        self.out_path.join(self.target.image_relpath())
    }
}

/// One job per available processing unit.
pub fn available_jobs() -> usize {
    match std::thread::available_parallelism() {
        Ok(n) => n.get(),
        Err(e) => {
            eprintln!(
                "  [WARN] Could not detect CPU count ({}), using {} jobs",
                e, FALLBACK_JOBS
            );
            FALLBACK_JOBS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_under_root() {
        let settings = Settings {
            jobs: Some(8),
            ..Settings::default()
        };
        let ctx = BuildContext::new(Path::new("/src/kernel"), Target::Evergo, &settings);

        assert_eq!(ctx.toolchain.compiler(), Path::new("/src/kernel/toolchain/bin/clang"));
        assert_eq!(ctx.out_path, PathBuf::from("/src/kernel/out"));
        assert_eq!(ctx.image_display_path(), PathBuf::from("out/arch/arm64/boot/Image"));
        assert_eq!(
            ctx.image_path(),
            PathBuf::from("/src/kernel/out/arch/arm64/boot/Image")
        );
        assert_eq!(ctx.jobs, 8);
    }

    #[test]
    fn absolute_out_dir_is_kept() {
        let settings = Settings {
            out_dir: PathBuf::from("/tmp/kout"),
            ..Settings::default()
        };
        let ctx = BuildContext::new(Path::new("/src/kernel"), Target::Evergo, &settings);
        assert_eq!(ctx.out_path, PathBuf::from("/tmp/kout"));
        assert_eq!(
            ctx.image_path(),
            PathBuf::from("/tmp/kout/arch/arm64/boot/Image")
        );
    }

    #[test]
    fn jobs_default_to_processor_count() {
        let ctx = BuildContext::new(Path::new("/k"), Target::Evergo, &Settings::default());
        assert!(ctx.jobs >= 1);
    }
}

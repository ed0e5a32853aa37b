use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use kernel_builder::report::BuildReport;
use kernel_builder::{BuildOutcome, BuildRequest, KernelBuilder, Settings, SystemRunner};
use tracing_subscriber::EnvFilter;

/// Build Kernel for Xiaomi Evergo
#[derive(Parser)]
#[command(name = "kernel-builder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Target device (e.g., evergo)
    #[arg(long)]
    target: String,

    /// Allow dirty build (skip cleaning)
    #[arg(long)]
    allow_dirty: bool,

    /// Kernel source tree to build in (default: current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Settings file, relative to DIR (default: <DIR>/kernel-builder.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Parallel make jobs (default: number of processing units)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Write a JSON build report after a successful build, relative to DIR
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Echo every command and its result
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = resolve_root(cli.directory.as_deref())?;
    let settings = Settings::load(&root, cli.config.as_deref())?
        .with_jobs(cli.jobs)
        .context("applying command-line overrides")?;

    let report_path = cli.report.as_deref().map(|path| root.join(path));

    let builder = KernelBuilder::new(SystemRunner, root, settings);
    let outcome = builder.run(&BuildRequest::new(cli.target, cli.allow_dirty))?;

    match outcome {
        BuildOutcome::Built(summary) => {
            if let Some(path) = &report_path {
                let report = BuildReport::new(
                    summary.target.name(),
                    &summary.toolchain.version,
                    &summary.image,
                    summary.elapsed,
                    summary.jobs,
                )?;
                report.write(path)?;
                tracing::debug!("wrote build report to {}", path.display());
            }
        }
        // Guidance was already printed; these are not process failures.
        BuildOutcome::Rejected(_) | BuildOutcome::ArtifactMissing { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn resolve_root(directory: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("resolving current directory")?;
    let root = match directory {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    if !root.is_dir() {
        anyhow::bail!("build directory not found: {}", root.display());
    }
    Ok(root)
}

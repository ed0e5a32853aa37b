//! Machine-readable summary of a finished build.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Written by `--report <file>` after a successful build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub target: String,
    pub toolchain_version: String,
    pub artifact: PathBuf,
    pub artifact_sha256: String,
    pub artifact_size_bytes: u64,
    /// Wall-clock seconds for configure + compile.
    pub elapsed_secs: f64,
    pub jobs: usize,
    pub finished_at_unix: u64,
}

impl BuildReport {
    /// Describe `artifact`, hashing it from disk.
    pub fn new(
        target: &str,
        toolchain_version: &str,
        artifact: &Path,
        elapsed: Duration,
        jobs: usize,
    ) -> Result<Self> {
        let (artifact_sha256, artifact_size_bytes) = sha256_file(artifact)?;
        Ok(Self {
            target: target.to_string(),
            toolchain_version: toolchain_version.to_string(),
            artifact: artifact.to_path_buf(),
            artifact_sha256,
            artifact_size_bytes,
            elapsed_secs: elapsed.as_secs_f64(),
            jobs,
            finished_at_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        })
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("writing build report '{}'", path.display()))
    }
}

/// SHA-256 (lowercase hex) and size of a file.
pub fn sha256_file(path: &Path) -> Result<(String, u64)> {
    let f = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut size = 0u64;
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size += n as u64;
    }
    Ok((format!("{:x}", hasher.finalize()), size))
}

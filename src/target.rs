//! Supported build targets.

use std::fmt;
use std::path::PathBuf;

/// A device the kernel tree has a defconfig for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Xiaomi Evergo (arm64).
    Evergo,
}

impl Target {
    pub const ALL: &'static [Target] = &[Target::Evergo];

    /// Exact, case-sensitive lookup.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|target| target.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Target::Evergo => "evergo",
        }
    }

    /// Kernel `ARCH=` value.
    pub fn arch(self) -> &'static str {
        match self {
            Target::Evergo => "arm64",
        }
    }

    /// Make target that generates `.config`.
    pub fn defconfig(self) -> String {
        format!("{}_defconfig", self.name())
    }

    /// Kernel image path relative to the output directory.
    pub fn image_relpath(self) -> PathBuf {
        PathBuf::from("arch").join(self.arch()).join("boot").join("Image")
    }

    /// Comma-separated list for guidance messages.
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|target| target.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Out-of-tree Linux kernel builds driven through a bundled LLVM toolchain.
//!
//! The crate does not compile anything itself. It checks that the checked-in
//! clang toolchain runs, points child processes at it, and drives the kernel's
//! own `make` through `defconfig` and the full build, then confirms the boot
//! image landed where it should.
//!
//! - **Preflight** - toolchain presence, host tools ([`preflight`])
//! - **Toolchain probe** - `clang -v` and version extraction ([`toolchain`])
//! - **Build steps** - environment, clean, configure, compile ([`build`])
//! - **Orchestration** - the whole run as one state machine ([`pipeline`])
//!
//! # Architecture
//!
//! ```text
//! kernel-builder (bin)
//!     │
//!     ├── clap CLI, tracing setup, Settings::load
//!     └── KernelBuilder<SystemRunner>::run
//!             │
//!             ├── toolchain::Toolchain      (clang -v)
//!             ├── build::env::BuildEnv      (PATH for children)
//!             ├── build::kernel             (make defconfig / make)
//!             └── process::CommandRunner    (SystemRunner | fakes::ScriptedRunner)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kernel_builder::{BuildRequest, KernelBuilder, Settings, SystemRunner};
//!
//! let root = std::env::current_dir()?;
//! let settings = Settings::load(&root, None)?;
//! let outcome = KernelBuilder::new(SystemRunner, root, settings)
//!     .run(&BuildRequest::new("evergo", false))?;
//! ```

pub mod build;
pub mod config;
pub mod error;
pub mod fakes;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod report;
pub mod target;
pub mod toolchain;

pub use config::Settings;
pub use error::BuildError;
pub use pipeline::{BuildOutcome, BuildRequest, BuildSummary, KernelBuilder, Rejection};
pub use process::{Cmd, CommandOutput, CommandRunner, SystemRunner};
pub use target::Target;

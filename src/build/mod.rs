//! Kernel build steps.
//!
//! This module provides:
//! - [`context`] - Resolved paths, target and job count for one build
//! - [`env`] - `PATH` handed to child processes
//! - [`kernel`] - Clean, defconfig and compile steps

pub mod context;
pub mod env;
pub mod kernel;

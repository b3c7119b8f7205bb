//! Build orchestration for the libbossac native library.
//!
//! This crate drives the full pipeline that turns upstream BOSSA sources
//! into per-architecture shared libraries inside consumer projects:
//!
//! - **Fetch** - download vendored sources and the Android NDK, skipping
//!   anything already on disk
//! - **Extract** - unpack tar.gz/tar.bz2/zip archives, preserving the
//!   permission bits toolchain binaries need
//! - **Patch** - marker-guarded textual edits to the vendored tree, safe to
//!   re-run at any point
//! - **Build** - a fail-fast cmake/make matrix over the declared target
//!   architectures, one artifact per target
//! - **Install** - wipe-and-repopulate copies into consumer project trees
//!
//! State lives entirely in the filesystem: a stage is "done" exactly when
//! its output path exists. There is no dependency graph and no parallelism;
//! tasks are declared sequences of stages and the first fatal error aborts
//! the process.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod fsutil;
pub mod install;
pub mod manifest;
pub mod matrix;
pub mod patch;
pub mod platform;
pub mod preflight;
pub mod sources;
pub mod task;

pub use config::BuilderConfig;
pub use task::Task;

//! Build matrix driver.
//!
//! Every run starts from wiped platform build and dist directories; there
//! is no incremental reuse. Targets build strictly in declared order and the
//! first configure or compile failure aborts the whole matrix; a partial
//! artifact set is treated as worse than none.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

use crate::config::BuilderConfig;
use crate::fsutil;
use crate::manifest::{self, BuildManifest};
use crate::platform::{Platform, CMAKE_SOURCE_DIR};

/// One architecture slot in a platform's matrix.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    pub arch: String,
    pub build_dir: PathBuf,
    pub dist_dir: PathBuf,
    /// Filename the compile step must leave in `build_dir`.
    pub artifact: String,
    pub configure_args: Vec<String>,
}

/// Narrow seam to the external toolchain: configure then compile, both run
/// from within the target's build directory.
pub trait Toolchain {
    fn configure(&self, target: &BuildTarget) -> Result<()>;
    fn compile(&self, target: &BuildTarget) -> Result<()>;
}

/// cmake + make against the repo-root CMake project.
pub struct CmakeToolchain;

impl Toolchain for CmakeToolchain {
    fn configure(&self, target: &BuildTarget) -> Result<()> {
        let mut command = Command::new("cmake");
        command
            .arg(CMAKE_SOURCE_DIR)
            .args(&target.configure_args)
            .current_dir(&target.build_dir);
        run_checked(command, "cmake", &target.arch)
    }

    fn compile(&self, target: &BuildTarget) -> Result<()> {
        let mut command = Command::new("make");
        command.current_dir(&target.build_dir);
        run_checked(command, "make", &target.arch)
    }
}

fn run_checked(mut command: Command, tool: &str, arch: &str) -> Result<()> {
    let status = command
        .status()
        .with_context(|| format!("running {tool} for target '{arch}'"))?;
    if !status.success() {
        bail!("{} failed for target '{}' with {}", tool, arch, status);
    }
    Ok(())
}

/// Targets of a platform's matrix, in declared order.
pub fn matrix_targets(platform: &Platform, config: &BuilderConfig) -> Vec<BuildTarget> {
    platform
        .archs
        .iter()
        .map(|arch| BuildTarget {
            arch: arch.to_string(),
            build_dir: platform.build_dir(config).join(arch),
            dist_dir: platform.dist_dir(config).join(arch),
            artifact: platform.artifact.to_string(),
            configure_args: platform.configure_args(config, arch),
        })
        .collect()
}

/// Run the full matrix: fresh-start both platform directories, then
/// configure, compile and distribute each target in order. Returns the
/// distributed artifact path per target.
pub fn build_matrix(
    platform: &Platform,
    config: &BuilderConfig,
    toolchain: &dyn Toolchain,
) -> Result<Vec<PathBuf>> {
    let build_dir = platform.build_dir(config);
    let dist_dir = platform.dist_dir(config);
    fsutil::recreate_dir(&build_dir)?;
    fsutil::recreate_dir(&dist_dir)?;

    let targets = matrix_targets(platform, config);
    let mut artifacts = Vec::with_capacity(targets.len());

    for target in &targets {
        println!("[build:{}] {}", platform.name, target.arch);
        fsutil::create_dir(&target.build_dir)?;
        toolchain.configure(target)?;
        toolchain.compile(target)?;
        artifacts.push(distribute(target)?);
    }

    manifest::write(
        &dist_dir,
        &BuildManifest::new(platform.name, &targets, &artifacts)?,
    )?;
    Ok(artifacts)
}

fn distribute(target: &BuildTarget) -> Result<PathBuf> {
    let built = target.build_dir.join(&target.artifact);
    if !built.is_file() {
        bail!(
            "compile succeeded but artifact '{}' is missing for target '{}'",
            built.display(),
            target.arch
        );
    }

    fsutil::recreate_dir(&target.dist_dir)?;
    let dest = target.dist_dir.join(&target.artifact);
    fsutil::copy_file(&built, &dest)?;
    println!("[build]   -> {}", dest.display());
    Ok(dest)
}

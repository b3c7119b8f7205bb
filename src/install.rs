//! Consumer-facing stages: destructive install, artifact probing, and
//! launching the consumer project.
//!
//! Install owns the destination tree completely: it is wiped before any
//! copy, so stale per-target content from a previous matrix never survives.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::BuilderConfig;
use crate::fsutil;
use crate::manifest;
use crate::platform::Platform;

/// One artifact's path from the dist tree into a consumer project.
#[derive(Debug, Clone)]
pub struct InstallMapping {
    pub arch: String,
    pub source: PathBuf,
    pub dest: PathBuf,
}

/// Mappings for a platform, keyed by arch, in matrix order.
pub fn install_mappings(platform: &Platform, config: &BuilderConfig) -> Vec<InstallMapping> {
    let install_root = platform.install_root(config);
    platform
        .archs
        .iter()
        .map(|arch| InstallMapping {
            arch: arch.to_string(),
            source: platform.dist_dir(config).join(arch).join(platform.artifact),
            dest: install_root.join(arch).join(platform.artifact),
        })
        .collect()
}

/// Wipe the consumer tree, then copy every artifact into its per-arch slot.
///
/// Destructive: anything previously under `install_root` is gone afterwards,
/// related to the matrix or not.
pub fn install_all(install_root: &Path, mappings: &[InstallMapping]) -> Result<()> {
    fsutil::remove_dir(install_root)?;

    for mapping in mappings {
        if !mapping.source.is_file() {
            bail!(
                "no distributed artifact for target '{}' at '{}' (run the build task first)",
                mapping.arch,
                mapping.source.display()
            );
        }
        let parent = mapping
            .dest
            .parent()
            .with_context(|| format!("resolving parent of '{}'", mapping.dest.display()))?;
        fsutil::create_dir(parent)?;
        fsutil::copy_file(&mapping.source, &mapping.dest)?;
        println!("[install] {} -> {}", mapping.arch, mapping.dest.display());
    }

    Ok(())
}

/// Probe each distributed artifact with `file(1)`, in matrix order.
///
/// When a build manifest is present it is cross-checked first: an artifact
/// the manifest lists but the dist tree lost is an error.
pub fn test_artifacts(platform: &Platform, config: &BuilderConfig) -> Result<()> {
    let dist_dir = platform.dist_dir(config);

    if let Some(manifest) = manifest::load(&dist_dir)? {
        for entry in &manifest.targets {
            let path = dist_dir.join(&entry.arch).join(&entry.artifact);
            if !path.is_file() {
                bail!(
                    "build manifest lists '{}' for target '{}' but the file is gone",
                    entry.artifact,
                    entry.arch
                );
            }
        }
    }

    for arch in platform.archs {
        let arch_dir = dist_dir.join(arch);
        println!("[test:{}] {}", platform.name, arch);
        let status = Command::new("file")
            .arg(platform.artifact)
            .current_dir(&arch_dir)
            .status()
            .with_context(|| {
                format!(
                    "running file on '{}'",
                    arch_dir.join(platform.artifact).display()
                )
            })?;
        if !status.success() {
            bail!("file probe failed for target '{}'", arch);
        }
    }

    Ok(())
}

/// Run the Dart CLI consumer project against the installed library.
pub fn run_cli_project(config: &BuilderConfig) -> Result<()> {
    let project_dir = config.projects_root.join("cli");
    run_in(&project_dir, "pub", &["get"])?;
    run_in(&project_dir, "dart", &["cli.dart"])
}

fn run_in(dir: &Path, program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .status()
        .with_context(|| format!("running {} in '{}'", program, dir.display()))?;
    if !status.success() {
        bail!("{} failed in '{}' with {}", program, dir.display(), status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(root: &std::path::Path) -> BuilderConfig {
        BuilderConfig::load_from(root).unwrap()
    }

    fn seed_dist(platform: &Platform, config: &BuilderConfig) {
        for arch in platform.archs {
            let dir = platform.dist_dir(config).join(arch);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(platform.artifact), format!("lib for {arch}")).unwrap();
        }
    }

    #[test]
    fn install_populates_one_subdirectory_per_target() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let android = platform::android();
        seed_dist(&android, &config);

        let root = android.install_root(&config);
        let mappings = install_mappings(&android, &config);
        install_all(&root, &mappings).unwrap();

        let mut entries: Vec<_> = fs::read_dir(&root)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["arm64-v8a", "armeabi-v7a", "x86", "x86_64"]);

        for arch in android.archs {
            assert_eq!(
                fs::read_to_string(root.join(arch).join("libbossac.so")).unwrap(),
                format!("lib for {arch}")
            );
        }
    }

    #[test]
    fn install_clears_unrelated_preexisting_content() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let macos = platform::macos();
        seed_dist(&macos, &config);

        let root = macos.install_root(&config);
        fs::create_dir_all(root.join("old-arch")).unwrap();
        fs::write(root.join("old-arch/libbossac.dylib"), "stale").unwrap();
        fs::write(root.join("README.txt"), "unrelated").unwrap();

        install_all(&root, &install_mappings(&macos, &config)).unwrap();

        assert!(!root.join("old-arch").exists());
        assert!(!root.join("README.txt").exists());
        assert!(root.join("x86_64/libbossac.dylib").is_file());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 1);
    }

    #[test]
    fn missing_distributed_artifact_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let android = platform::android();
        // No dist tree seeded.

        let root = android.install_root(&config);
        let err = install_all(&root, &install_mappings(&android, &config)).unwrap_err();
        assert!(err.to_string().contains("run the build task first"));
    }

    #[test]
    fn manifest_cross_check_catches_lost_artifacts() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path());
        let macos = platform::macos();

        let dist_dir = macos.dist_dir(&config);
        fs::create_dir_all(&dist_dir).unwrap();
        manifest::write(
            &dist_dir,
            &manifest::BuildManifest {
                platform: "macos".to_string(),
                created_at_unix: 0,
                targets: vec![manifest::TargetArtifact {
                    arch: "x86_64".to_string(),
                    artifact: "libbossac.dylib".to_string(),
                    size_bytes: 7,
                }],
            },
        )
        .unwrap();

        let err = test_artifacts(&macos, &config).unwrap_err();
        assert!(err.to_string().contains("the file is gone"));
    }
}

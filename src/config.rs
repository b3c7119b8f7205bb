//! Builder configuration.
//!
//! All paths are resolved against the repo root (the directory the tool is
//! invoked from). An optional `builder.toml` at the root overrides the
//! defaults; a missing file means defaults throughout.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "builder.toml";

const DEFAULT_BUILD_ROOT: &str = "build";
const DEFAULT_DIST_ROOT: &str = "dist";
const DEFAULT_PROJECTS_ROOT: &str = "projects";
const DEFAULT_PATCHES_DIR: &str = "patches";
const DEFAULT_NDK_RELEASE: &str = "r21d";

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Repository root; every other path hangs off this.
    pub repo_root: PathBuf,
    /// Downloads and extracted/working trees.
    pub build_root: PathBuf,
    /// Per-target compiled artifacts.
    pub dist_root: PathBuf,
    /// Consumer projects receiving installed artifacts.
    pub projects_root: PathBuf,
    /// Patch template files appended by patch rules.
    pub patches_dir: PathBuf,
    /// Android NDK release tag, e.g. `r21d`.
    pub ndk_release: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuilderToml {
    paths: Option<PathsToml>,
    android: Option<AndroidToml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathsToml {
    build_root: Option<String>,
    dist_root: Option<String>,
    projects_root: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AndroidToml {
    ndk_release: Option<String>,
}

impl BuilderConfig {
    /// Load the configuration for the repo rooted at the current directory.
    pub fn load() -> Result<Self> {
        let repo_root = std::env::current_dir().context("resolving current directory")?;
        Self::load_from(&repo_root)
    }

    /// Load the configuration for an explicit repo root.
    pub fn load_from(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join(CONFIG_FILENAME);
        let parsed: BuilderToml = if config_path.is_file() {
            let raw = fs::read_to_string(&config_path)
                .with_context(|| format!("reading config '{}'", config_path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("parsing config '{}'", config_path.display()))?
        } else {
            BuilderToml::default()
        };

        let paths = parsed.paths.unwrap_or_default();
        let android = parsed.android.unwrap_or_default();

        Ok(Self {
            build_root: repo_root.join(paths.build_root.as_deref().unwrap_or(DEFAULT_BUILD_ROOT)),
            dist_root: repo_root.join(paths.dist_root.as_deref().unwrap_or(DEFAULT_DIST_ROOT)),
            projects_root: repo_root
                .join(paths.projects_root.as_deref().unwrap_or(DEFAULT_PROJECTS_ROOT)),
            patches_dir: repo_root.join(DEFAULT_PATCHES_DIR),
            ndk_release: android
                .ndk_release
                .unwrap_or_else(|| DEFAULT_NDK_RELEASE.to_string()),
            repo_root: repo_root.to_path_buf(),
        })
    }
}

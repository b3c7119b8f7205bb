//! Per-platform build manifest.
//!
//! Written into the platform's dist directory after a successful matrix so
//! later stages (and humans) can see what the matrix produced. The manifest
//! is informational; stage completion itself is always decided by file
//! presence, never by this file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::matrix::BuildTarget;

pub const MANIFEST_FILENAME: &str = "build-manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    pub platform: String,
    pub created_at_unix: u64,
    pub targets: Vec<TargetArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetArtifact {
    pub arch: String,
    pub artifact: String,
    pub size_bytes: u64,
}

impl BuildManifest {
    /// Describe a finished matrix: one entry per target, sizes taken from
    /// the distributed artifacts.
    pub fn new(platform: &str, targets: &[BuildTarget], artifacts: &[PathBuf]) -> Result<Self> {
        let mut entries = Vec::with_capacity(targets.len());
        for (target, artifact) in targets.iter().zip(artifacts) {
            let meta = fs::metadata(artifact)
                .with_context(|| format!("reading metadata of '{}'", artifact.display()))?;
            entries.push(TargetArtifact {
                arch: target.arch.clone(),
                artifact: target.artifact.clone(),
                size_bytes: meta.len(),
            });
        }
        Ok(Self {
            platform: platform.to_string(),
            created_at_unix: now_unix(),
            targets: entries,
        })
    }
}

pub fn write(dist_dir: &Path, manifest: &BuildManifest) -> Result<()> {
    let path = dist_dir.join(MANIFEST_FILENAME);
    let bytes = serde_json::to_vec_pretty(manifest).context("serializing build manifest")?;
    fs::write(&path, bytes)
        .with_context(|| format!("writing build manifest '{}'", path.display()))
}

/// Load the manifest if one exists; `None` when the platform never built.
pub fn load(dist_dir: &Path) -> Result<Option<BuildManifest>> {
    let path = dist_dir.join(MANIFEST_FILENAME);
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path)
        .with_context(|| format!("reading build manifest '{}'", path.display()))?;
    let parsed = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing build manifest '{}'", path.display()))?;
    Ok(Some(parsed))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

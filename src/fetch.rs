//! Archive download stage.
//!
//! A file already present at the resolved destination is trusted as-is and
//! the network is never contacted for it. Freshly downloaded archives are
//! verified against a pinned sha256 when the catalog carries one; a mismatch
//! deletes the bad file so the next run starts clean.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fsutil;
use crate::sources::RemoteSource;

const USER_AGENT: &str = concat!("bossac-builder/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT: Duration = Duration::from_secs(900);
const CHUNK_SIZE: usize = 8192;

/// Resolve the on-disk destination for a download.
///
/// Deterministic for a given (url, dest_dir, filename): an explicit filename
/// wins, otherwise the basename of the URL path, otherwise a fixed fallback.
pub fn resolved_path(url: &str, dest_dir: &Path, filename: Option<&str>) -> PathBuf {
    let name = match filename {
        Some(name) => name.to_string(),
        None => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            match path.rsplit('/').next() {
                Some(base) if !base.is_empty() => base.to_string(),
                _ => "downloaded.file".to_string(),
            }
        }
    };
    dest_dir.join(name)
}

/// Fetch `url` into `dest_dir`, skipping when the destination already exists.
///
/// The skip is a pure presence check; content is never re-validated here.
pub fn fetch(url: &str, dest_dir: &Path, filename: Option<&str>) -> Result<PathBuf> {
    let dest = resolved_path(url, dest_dir, filename);
    if dest.is_file() {
        println!("[fetch] {} already present", dest.display());
        return Ok(dest);
    }

    fsutil::create_dir(dest_dir)?;
    download_file(url, &dest)?;
    Ok(dest)
}

/// Fetch a cataloged source archive into the build root.
///
/// Verifies the pinned checksum only after a fresh download; an archive that
/// was already on disk is trusted as-is.
pub fn ensure_archive(source: &RemoteSource, build_root: &Path) -> Result<PathBuf> {
    let dest = resolved_path(&source.url, build_root, Some(&source.archive));
    if dest.is_file() {
        println!("[fetch] {}: archive already downloaded", source.name);
        return Ok(dest);
    }

    println!("[fetch] {}: downloading {}", source.name, source.url);
    let dest = fetch(&source.url, build_root, Some(&source.archive))?;

    if let Some(expected) = source.sha256 {
        if let Err(err) = verify_sha256(&dest, expected) {
            fsutil::remove_path_best_effort(&dest);
            return Err(err);
        }
        println!("[fetch]   checksum verified");
    }

    Ok(dest)
}

fn download_file(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("creating HTTP client")?;

    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("requesting '{url}'"))?;

    if !response.status().is_success() {
        bail!("download of '{}' failed with status {}", url, response.status());
    }

    let mut out =
        File::create(dest).with_context(|| format!("creating '{}'", dest.display()))?;

    let mut progress = Progress::new(response.content_length());
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = response
            .read(&mut buf)
            .with_context(|| format!("reading response body from '{url}'"))?;
        if read == 0 {
            break;
        }
        out.write_all(&buf[..read])
            .with_context(|| format!("writing '{}'", dest.display()))?;
        progress.advance(read as u64);
    }
    progress.finish();

    Ok(())
}

/// Coarse byte progress, printed in 10% steps when the server advertised a
/// content length, as a single total otherwise.
struct Progress {
    total: Option<u64>,
    downloaded: u64,
    last_decile: u64,
}

impl Progress {
    fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|total| *total > 0),
            downloaded: 0,
            last_decile: 0,
        }
    }

    fn advance(&mut self, bytes: u64) {
        self.downloaded += bytes;
        let Some(total) = self.total else {
            return;
        };
        let decile = self.downloaded * 10 / total;
        if decile > self.last_decile {
            self.last_decile = decile;
            println!(
                "[fetch]   {}% ({} / {} bytes)",
                decile * 10,
                self.downloaded,
                total
            );
        }
    }

    fn finish(&self) {
        if self.total.is_none() {
            println!("[fetch]   {} bytes", self.downloaded);
        }
    }
}

/// Streaming sha256 of a file, hex-encoded.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("opening '{}' for hashing", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let read = reader
            .read(&mut buf)
            .with_context(|| format!("hashing '{}'", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        bail!(
            "checksum mismatch for '{}': expected {}, got {}",
            path.display(),
            expected,
            actual
        );
    }
    Ok(())
}

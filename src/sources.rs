//! Catalog of the third-party sources the build vendors.
//!
//! Each source pins a URL, the archive filename it lands under in the build
//! root, and the directory name its extraction produces. The pair of names
//! is what makes fetch and extract re-entrant: both stages probe for exactly
//! these paths before doing any work.

use anyhow::{bail, Result};

use crate::extract::ArchiveKind;

const WX_VERSION: &str = "3.1.4";

/// A remote archive plus everything needed to fetch and unpack it.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub name: &'static str,
    pub url: String,
    /// Filename the archive is stored under in the build root.
    pub archive: String,
    pub kind: ArchiveKind,
    /// Directory name the archive extracts to, relative to the build root.
    pub extracted_dir: String,
    /// Pinned digest, verified only for freshly downloaded files.
    pub sha256: Option<&'static str>,
}

/// wxWidgets release tarball (GUI dependency of the BOSSA build).
pub fn wxwidgets() -> RemoteSource {
    RemoteSource {
        name: "wxWidgets",
        url: format!(
            "https://github.com/wxWidgets/wxWidgets/releases/download/v{WX_VERSION}/wxWidgets-{WX_VERSION}.tar.bz2"
        ),
        archive: format!("wxWidgets-{WX_VERSION}.tar.bz2"),
        kind: ArchiveKind::TarBz2,
        extracted_dir: format!("wxWidgets-{WX_VERSION}"),
        sha256: None,
    }
}

/// BOSSA upstream sources, tracked at master.
pub fn bossa() -> RemoteSource {
    RemoteSource {
        name: "BOSSA",
        url: "https://github.com/shumatech/BOSSA/archive/master.tar.gz".to_string(),
        archive: "BOSSA-master.tar.gz".to_string(),
        kind: ArchiveKind::TarGz,
        extracted_dir: "BOSSA-master".to_string(),
        sha256: None,
    }
}

/// Android NDK for the given release tag.
///
/// The NDK ships per host OS; only macOS and Linux hosts are supported. The
/// zip packaging matters: toolchain binaries must come out executable, which
/// the extract stage handles via unix mode bits.
pub fn ndk(release: &str) -> Result<RemoteSource> {
    let host = match std::env::consts::OS {
        "macos" => "darwin",
        "linux" => "linux",
        other => bail!(
            "unsupported host platform '{}' for the Android NDK (expected macos or linux)",
            other
        ),
    };

    let archive = format!("android-ndk-{release}-{host}-x86_64.zip");
    Ok(RemoteSource {
        name: "NDK",
        url: format!("https://dl.google.com/android/repository/{archive}"),
        archive,
        kind: ArchiveKind::Zip,
        extracted_dir: format!("android-ndk-{release}"),
        sha256: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bossa_catalog_entry_is_pinned() {
        let source = bossa();
        assert_eq!(source.archive, "BOSSA-master.tar.gz");
        assert_eq!(source.extracted_dir, "BOSSA-master");
        assert_eq!(source.kind, ArchiveKind::TarGz);
    }

    #[test]
    fn wxwidgets_names_derive_from_version() {
        let source = wxwidgets();
        assert_eq!(source.archive, "wxWidgets-3.1.4.tar.bz2");
        assert_eq!(source.extracted_dir, "wxWidgets-3.1.4");
        assert_eq!(source.kind, ArchiveKind::TarBz2);
    }

    #[test]
    fn ndk_release_shapes_archive_and_directory() {
        // Test hosts are always linux or macos in CI; both are supported.
        let source = ndk("r21d").unwrap();
        assert!(source.archive.starts_with("android-ndk-r21d-"));
        assert!(source.archive.ends_with("-x86_64.zip"));
        assert_eq!(source.extracted_dir, "android-ndk-r21d");
        assert_eq!(source.kind, ArchiveKind::Zip);
    }
}

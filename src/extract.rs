//! Archive extraction stage.
//!
//! Extraction is skipped entirely when the expected directory already exists
//! under the destination: the directory's presence is the completion flag.
//! Permission bits are preserved for all formats; the NDK's zip packaging
//! carries the executable bits its toolchain binaries need.

use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::fsutil;

/// Supported archive formats, fixed per cataloged source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarBz2,
    Zip,
}

/// Unpack `archive` under `dest_dir` unless `expected_dir` is already there.
///
/// Returns `true` when extraction ran, `false` on the idempotent skip.
pub fn extract(
    archive: &Path,
    dest_dir: &Path,
    expected_dir: &str,
    kind: ArchiveKind,
) -> Result<bool> {
    let target = dest_dir.join(expected_dir);
    if target.is_dir() {
        println!("[extract] {} already extracted", target.display());
        return Ok(false);
    }

    fsutil::create_dir(dest_dir)?;
    println!("[extract] unpacking {}", archive.display());
    match kind {
        ArchiveKind::TarGz => unpack_tar(GzDecoder::new(open(archive)?), dest_dir, archive)?,
        ArchiveKind::TarBz2 => unpack_tar(BzDecoder::new(open(archive)?), dest_dir, archive)?,
        ArchiveKind::Zip => unpack_zip(archive, dest_dir)?,
    }
    println!(
        "[extract]   {} ({} bytes)",
        target.display(),
        fsutil::dir_size(&target)
    );

    Ok(true)
}

fn open(archive: &Path) -> Result<File> {
    File::open(archive).with_context(|| format!("opening archive '{}'", archive.display()))
}

fn unpack_tar<R: io::Read>(reader: R, dest_dir: &Path, archive: &Path) -> Result<()> {
    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);
    tar.unpack(dest_dir)
        .with_context(|| format!("unpacking '{}'", archive.display()))
}

fn unpack_zip(archive: &Path, dest_dir: &Path) -> Result<()> {
    let mut zip = zip::ZipArchive::new(open(archive)?)
        .with_context(|| format!("reading zip archive '{}'", archive.display()))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .with_context(|| format!("reading entry {} of '{}'", index, archive.display()))?;
        let Some(rel_path) = entry.enclosed_name() else {
            bail!(
                "zip entry '{}' in '{}' escapes the destination directory",
                entry.name(),
                archive.display()
            );
        };
        let out_path = dest_dir.join(rel_path);

        if entry.is_dir() {
            fsutil::create_dir(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fsutil::create_dir(parent)?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("creating '{}'", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("writing '{}'", out_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("setting permissions on '{}'", out_path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_tar_gz(archive: &Path, dir_name: &str, file_name: &str, content: &str) {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join(dir_name);
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join(file_name), content).unwrap();

        let gz = flate2::write::GzEncoder::new(
            File::create(archive).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        builder.append_dir_all(dir_name, &tree).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_tar_bz2(archive: &Path, dir_name: &str, file_name: &str, content: &str) {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join(dir_name);
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join(file_name), content).unwrap();

        let bz = bzip2::write::BzEncoder::new(
            File::create(archive).unwrap(),
            bzip2::Compression::best(),
        );
        let mut builder = tar::Builder::new(bz);
        builder.append_dir_all(dir_name, &tree).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn tar_gz_extracts_expected_tree() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("src.tar.gz");
        write_tar_gz(&archive, "BOSSA-master", "main.cpp", "int main() {}\n");

        let ran = extract(&archive, temp.path(), "BOSSA-master", ArchiveKind::TarGz).unwrap();

        assert!(ran);
        assert_eq!(
            fs::read_to_string(temp.path().join("BOSSA-master/main.cpp")).unwrap(),
            "int main() {}\n"
        );
    }

    #[test]
    fn second_extract_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("src.tar.gz");
        write_tar_gz(&archive, "BOSSA-master", "main.cpp", "int main() {}\n");

        assert!(extract(&archive, temp.path(), "BOSSA-master", ArchiveKind::TarGz).unwrap());

        // A sentinel written into the extracted tree must survive the rerun.
        fs::write(temp.path().join("BOSSA-master/sentinel"), "kept").unwrap();
        let ran = extract(&archive, temp.path(), "BOSSA-master", ArchiveKind::TarGz).unwrap();

        assert!(!ran);
        assert_eq!(
            fs::read_to_string(temp.path().join("BOSSA-master/sentinel")).unwrap(),
            "kept"
        );
    }

    #[test]
    fn tar_bz2_extracts_expected_tree() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("wx.tar.bz2");
        write_tar_bz2(&archive, "wxWidgets-3.1.4", "configure", "#!/bin/sh\n");

        let ran = extract(&archive, temp.path(), "wxWidgets-3.1.4", ArchiveKind::TarBz2).unwrap();

        assert!(ran);
        assert!(temp.path().join("wxWidgets-3.1.4/configure").is_file());
    }

    #[test]
    fn zip_extraction_restores_executable_bits() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("ndk.zip");

        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        let executable =
            zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        writer
            .start_file("android-ndk-r21d/toolchains/bin/clang", executable)
            .unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        let plain = zip::write::SimpleFileOptions::default().unix_permissions(0o644);
        writer.start_file("android-ndk-r21d/NOTICE", plain).unwrap();
        writer.write_all(b"notice\n").unwrap();
        writer.finish().unwrap();

        let ran = extract(&archive, temp.path(), "android-ndk-r21d", ArchiveKind::Zip).unwrap();
        assert!(ran);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let tool = temp.path().join("android-ndk-r21d/toolchains/bin/clang");
            let mode = fs::metadata(&tool).unwrap().permissions().mode();
            assert_ne!(mode & 0o111, 0, "toolchain binary must stay executable");

            let notice = temp.path().join("android-ndk-r21d/NOTICE");
            let mode = fs::metadata(&notice).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0, "plain file must not gain exec bits");
        }
    }

    #[test]
    fn zip_entries_escaping_the_destination_are_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");

        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("../escaped.txt", options).unwrap();
        writer.write_all(b"nope").unwrap();
        writer.finish().unwrap();

        let result = extract(&archive, temp.path(), "never-created", ArchiveKind::Zip);
        assert!(result.is_err());
        assert!(!temp.path().parent().unwrap().join("escaped.txt").exists());
    }
}

//! Target platform catalog.
//!
//! Declares, per platform, the architecture matrix, the toolchain configure
//! flags, the consumer install mapping and the patch rules the vendored
//! BOSSA tree needs before that platform can build. Everything is declared
//! in matrix order; the drivers never reorder.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::config::BuilderConfig;
use crate::patch::{Edit, PatchRule};

/// Android ABIs built for the sample app, in matrix order.
pub const ANDROID_ABIS: &[&str] = &["arm64-v8a", "armeabi-v7a", "x86", "x86_64"];
/// macOS architectures built for the CLI project.
pub const MACOS_ARCHS: &[&str] = &["x86_64"];

/// CMake source directory as seen from `<build_root>/<platform>/<arch>`.
pub const CMAKE_SOURCE_DIR: &str = "../../../";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    Android,
    Macos,
}

/// One build platform and its declared matrix.
#[derive(Debug, Clone)]
pub struct Platform {
    pub kind: PlatformKind,
    pub name: &'static str,
    pub archs: &'static [&'static str],
    /// Shared library filename the toolchain produces per target.
    pub artifact: &'static str,
}

pub fn android() -> Platform {
    Platform {
        kind: PlatformKind::Android,
        name: "android",
        archs: ANDROID_ABIS,
        artifact: "libbossac.so",
    }
}

pub fn macos() -> Platform {
    Platform {
        kind: PlatformKind::Macos,
        name: "macos",
        archs: MACOS_ARCHS,
        artifact: "libbossac.dylib",
    }
}

impl Platform {
    /// Root of this platform's per-arch build directories.
    pub fn build_dir(&self, config: &BuilderConfig) -> PathBuf {
        config.build_root.join(self.name)
    }

    /// Root of this platform's per-arch distribution directories.
    pub fn dist_dir(&self, config: &BuilderConfig) -> PathBuf {
        config.dist_root.join(self.name)
    }

    /// Configure flags for one arch of this platform's matrix.
    pub fn configure_args(&self, config: &BuilderConfig, arch: &str) -> Vec<String> {
        match self.kind {
            PlatformKind::Android => {
                let ndk_dir = config
                    .build_root
                    .join(format!("android-ndk-{}", config.ndk_release));
                vec![
                    "-DCMAKE_SYSTEM_NAME=Android".to_string(),
                    format!("-DCMAKE_ANDROID_ARCH_ABI={arch}"),
                    format!("-DCMAKE_ANDROID_NDK={}", ndk_dir.display()),
                    "-DCMAKE_ANDROID_STL_TYPE=c++_static".to_string(),
                    "-DTARGET_SYSTEM=android".to_string(),
                ]
            }
            PlatformKind::Macos => vec!["-DTARGET_SYSTEM=macos".to_string()],
        }
    }

    /// Consumer project directory receiving this platform's artifacts.
    pub fn install_root(&self, config: &BuilderConfig) -> PathBuf {
        match self.kind {
            PlatformKind::Android => config
                .projects_root
                .join("sample/android/app/src/main/jniLibs"),
            PlatformKind::Macos => config.projects_root.join("cli/lib"),
        }
    }

    /// Patch rules this platform applies to the vendored BOSSA tree.
    pub fn patch_rules(&self, config: &BuilderConfig) -> Result<Vec<PatchRule>> {
        let target = bossac_source_file(config);
        match self.kind {
            PlatformKind::Android => Ok(vec![
                PatchRule {
                    label: "android log redirection",
                    file: target.clone(),
                    marker: "#include <android/log.h>".to_string(),
                    edits: vec![
                        Edit::Replace {
                            old: "fprintf(stdout,".to_string(),
                            new: "__android_log_print(ANDROID_LOG_DEBUG, \"BOSSA\","
                                .to_string(),
                        },
                        Edit::Replace {
                            old: "fprintf(stderr,".to_string(),
                            new: "__android_log_print(ANDROID_LOG_ERROR, \"BOSSA\","
                                .to_string(),
                        },
                        Edit::InsertHead("#include <android/log.h>".to_string()),
                    ],
                },
                PatchRule {
                    label: "android ffi exports",
                    file: target,
                    marker: "extern \"C\"".to_string(),
                    edits: vec![Edit::InsertTail(template(config, "bossac_android.cpp")?)],
                },
            ]),
            PlatformKind::Macos => Ok(vec![PatchRule {
                label: "macos ffi exports",
                file: target,
                marker: "extern \"C\"".to_string(),
                edits: vec![Edit::InsertTail(template(config, "bossac_macos.cpp")?)],
            }]),
        }
    }
}

/// The one vendored file every patch rule targets.
pub fn bossac_source_file(config: &BuilderConfig) -> PathBuf {
    config.build_root.join("BOSSA-master/src/bossac.cpp")
}

/// Version pin applied to the vendored tree independent of platform.
pub fn bossa_version_rule(config: &BuilderConfig) -> PatchRule {
    PatchRule {
        label: "bossac version pin",
        file: bossac_source_file(config),
        marker: "(BOSSA) 1.9.1".to_string(),
        edits: vec![Edit::Replace {
            old: "Version \" VERSION \"".to_string(),
            new: "1.9.1".to_string(),
        }],
    }
}

fn template(config: &BuilderConfig, name: &str) -> Result<String> {
    let path = config.patches_dir.join(name);
    fs::read_to_string(&path)
        .with_context(|| format!("reading patch template '{}'", path.display()))
}

//! Task registry and dispatch.
//!
//! Each task is a fixed, declared sequence of stage invocations; there is
//! no dependency graph and nothing is inferred. Unknown task names fail
//! before any filesystem access.

use anyhow::{bail, Result};

use crate::config::BuilderConfig;
use crate::extract;
use crate::fetch;
use crate::fsutil;
use crate::install;
use crate::matrix::{self, CmakeToolchain};
use crate::patch;
use crate::platform::{self, Platform};
use crate::preflight;
use crate::sources::{self, RemoteSource};

/// Every operation the CLI can run, closed and exhaustively matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Clear,
    GetWx,
    GetBossa,
    GetNdk,
    PatchBossa,
    RemoveBossa,
    PatchAndroid,
    BuildAndroid,
    TestAndroid,
    InstallAndroid,
    PatchMacos,
    BuildMacos,
    TestMacos,
    InstallMacos,
    RunMacos,
}

impl Task {
    /// Registered tasks in help order.
    pub const ALL: &'static [(&'static str, Task)] = &[
        ("clear", Task::Clear),
        ("get-wx", Task::GetWx),
        ("get-bossa", Task::GetBossa),
        ("get-ndk", Task::GetNdk),
        ("patch-bossa", Task::PatchBossa),
        ("remove-bossa", Task::RemoveBossa),
        ("patch-android", Task::PatchAndroid),
        ("build-android", Task::BuildAndroid),
        ("test-android", Task::TestAndroid),
        ("install-android", Task::InstallAndroid),
        ("patch-macos", Task::PatchMacos),
        ("build-macos", Task::BuildMacos),
        ("test-macos", Task::TestMacos),
        ("install-macos", Task::InstallMacos),
        ("run-macos", Task::RunMacos),
    ];

    pub fn from_name(name: &str) -> Option<Task> {
        Self::ALL
            .iter()
            .find(|(task_name, _)| *task_name == name)
            .map(|(_, task)| *task)
    }

    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, task)| *task == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

/// All registered task names, in help order.
pub fn task_names() -> Vec<&'static str> {
    Task::ALL.iter().map(|(name, _)| *name).collect()
}

/// Resolve a task name and run it.
pub fn dispatch(config: &BuilderConfig, name: &str) -> Result<()> {
    let Some(task) = Task::from_name(name) else {
        bail!(
            "invalid task name '{}'; expected one of: {}",
            name,
            task_names().join(", ")
        );
    };
    run(config, task)
}

/// Run one resolved task.
pub fn run(config: &BuilderConfig, task: Task) -> Result<()> {
    match task {
        Task::Clear => clear(config),
        Task::GetWx => get_source(config, &sources::wxwidgets()),
        Task::GetBossa => get_source(config, &sources::bossa()),
        Task::GetNdk => get_source(config, &sources::ndk(&config.ndk_release)?),
        Task::PatchBossa => patch_bossa(config),
        Task::RemoveBossa => remove_bossa(config),
        Task::PatchAndroid => patch_platform(config, &platform::android()),
        Task::BuildAndroid => build_platform(config, &platform::android()),
        Task::TestAndroid => test_platform(config, &platform::android()),
        Task::InstallAndroid => install_platform(config, &platform::android()),
        Task::PatchMacos => patch_platform(config, &platform::macos()),
        Task::BuildMacos => build_platform(config, &platform::macos()),
        Task::TestMacos => test_platform(config, &platform::macos()),
        Task::InstallMacos => install_platform(config, &platform::macos()),
        Task::RunMacos => run_macos(config),
    }
}

/// Best-effort cleanup of build outputs and editor droppings.
fn clear(config: &BuilderConfig) -> Result<()> {
    println!("[clear] removing build outputs");
    fsutil::remove_path_best_effort(&config.build_root);
    fsutil::remove_path_best_effort(&config.repo_root.join(".DS_Store"));
    fsutil::remove_path_best_effort(&config.repo_root.join("Thumbs.db"));
    Ok(())
}

/// Fetch then extract one cataloged source; both steps skip when satisfied.
fn get_source(config: &BuilderConfig, source: &RemoteSource) -> Result<()> {
    let archive = fetch::ensure_archive(source, &config.build_root)?;
    extract::extract(
        &archive,
        &config.build_root,
        &source.extracted_dir,
        source.kind,
    )?;
    Ok(())
}

fn patch_bossa(config: &BuilderConfig) -> Result<()> {
    println!("[patch] BOSSA version pin");
    patch::apply_rules(&[platform::bossa_version_rule(config)])?;
    Ok(())
}

/// Drop the extracted BOSSA tree; fetch/extract will recreate it on demand.
fn remove_bossa(config: &BuilderConfig) -> Result<()> {
    let source_dir = config.build_root.join(sources::bossa().extracted_dir);
    println!("[clear] removing '{}'", source_dir.display());
    fsutil::remove_dir(&source_dir)
}

fn patch_platform(config: &BuilderConfig, platform: &Platform) -> Result<()> {
    println!("[patch] BOSSA for {}", platform.name);
    let rules = platform.patch_rules(config)?;
    let applied = patch::apply_rules(&rules)?;
    println!("[patch] {} rule(s) applied", applied);
    Ok(())
}

fn build_platform(config: &BuilderConfig, platform: &Platform) -> Result<()> {
    preflight::check_required_tools(preflight::BUILD_TOOLS)?;
    println!(
        "[build:{}] {} target(s)",
        platform.name,
        platform.archs.len()
    );
    let artifacts = matrix::build_matrix(platform, config, &CmakeToolchain)?;
    println!(
        "[build:{}] {} artifact(s) distributed",
        platform.name,
        artifacts.len()
    );
    Ok(())
}

fn test_platform(config: &BuilderConfig, platform: &Platform) -> Result<()> {
    preflight::check_required_tools(preflight::TEST_TOOLS)?;
    install::test_artifacts(platform, config)
}

fn install_platform(config: &BuilderConfig, platform: &Platform) -> Result<()> {
    let mappings = install::install_mappings(platform, config);
    install::install_all(&platform.install_root(config), &mappings)
}

fn run_macos(config: &BuilderConfig) -> Result<()> {
    preflight::check_required_tools(preflight::RUN_TOOLS)?;
    install::run_cli_project(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn every_registered_name_resolves_back_to_its_task() {
        for (name, task) in Task::ALL {
            assert_eq!(Task::from_name(name), Some(*task));
            assert_eq!(task.name(), *name);
        }
    }

    #[test]
    fn unknown_task_fails_without_touching_the_filesystem() {
        let temp = TempDir::new().unwrap();
        let config = BuilderConfig::load_from(temp.path()).unwrap();

        let err = dispatch(&config, "build-windows").unwrap_err();

        assert!(err.to_string().contains("invalid task name 'build-windows'"));
        assert!(err.to_string().contains("build-android"));
        assert!(!config.build_root.exists());
        assert!(!config.dist_root.exists());
    }

    #[test]
    fn clear_removes_the_build_root() {
        let temp = TempDir::new().unwrap();
        let config = BuilderConfig::load_from(temp.path()).unwrap();
        fs::create_dir_all(config.build_root.join("android")).unwrap();
        fs::write(config.repo_root.join(".DS_Store"), "junk").unwrap();

        dispatch(&config, "clear").unwrap();

        assert!(!config.build_root.exists());
        assert!(!config.repo_root.join(".DS_Store").exists());
    }

    #[test]
    fn remove_bossa_drops_only_the_vendored_tree() {
        let temp = TempDir::new().unwrap();
        let config = BuilderConfig::load_from(temp.path()).unwrap();
        fs::create_dir_all(config.build_root.join("BOSSA-master/src")).unwrap();
        fs::write(config.build_root.join("BOSSA-master.tar.gz"), "archive").unwrap();

        dispatch(&config, "remove-bossa").unwrap();

        assert!(!config.build_root.join("BOSSA-master").exists());
        assert!(config.build_root.join("BOSSA-master.tar.gz").is_file());
    }

    #[test]
    fn patch_tasks_compose_rules_in_declared_order() {
        let temp = TempDir::new().unwrap();
        let config = BuilderConfig::load_from(temp.path()).unwrap();

        fs::create_dir_all(config.build_root.join("BOSSA-master/src")).unwrap();
        fs::write(
            platform::bossac_source_file(&config),
            "fprintf(stdout, \"Version \" VERSION \"\");\n",
        )
        .unwrap();
        fs::create_dir_all(&config.patches_dir).unwrap();
        fs::write(
            config.patches_dir.join("bossac_android.cpp"),
            "extern \"C\" { int bossa_main(int argc, char *args); }\n",
        )
        .unwrap();

        dispatch(&config, "patch-bossa").unwrap();
        dispatch(&config, "patch-android").unwrap();

        let content = fs::read_to_string(platform::bossac_source_file(&config)).unwrap();
        assert!(content.starts_with("#include <android/log.h>"));
        assert!(content.contains("__android_log_print(ANDROID_LOG_DEBUG, \"BOSSA\","));
        assert!(content.contains("1.9.1"));
        assert!(content.contains("extern \"C\""));

        // Re-dispatching both patch tasks must change nothing.
        dispatch(&config, "patch-bossa").unwrap();
        dispatch(&config, "patch-android").unwrap();
        assert_eq!(
            fs::read_to_string(platform::bossac_source_file(&config)).unwrap(),
            content
        );
    }
}

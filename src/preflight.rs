//! Host tool validation.
//!
//! Build, test and run tasks shell out to external tooling; probing up
//! front turns a mid-matrix spawn failure into a readable message naming
//! what to install.

use anyhow::{bail, Result};

/// Tools the matrix driver invokes, as (command, package) pairs.
pub const BUILD_TOOLS: &[(&str, &str)] = &[("cmake", "cmake"), ("make", "make")];

/// Tools the test stage invokes.
pub const TEST_TOOLS: &[(&str, &str)] = &[("file", "file")];

/// Tools the consumer run stage invokes.
pub const RUN_TOOLS: &[(&str, &str)] = &[("pub", "dart-sdk"), ("dart", "dart-sdk")];

/// Check if a command can be resolved on PATH.
pub fn command_exists(command: &str) -> bool {
    which::which(command).is_ok()
}

/// Check that specific tools are available, reporting all missing ones.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let listing = missing
            .iter()
            .map(|(tool, package)| format!("  {tool} (install: {package})"))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("missing required host tools:\n{}", listing);
    }

    Ok(())
}

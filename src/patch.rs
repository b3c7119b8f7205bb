//! Marker-guarded source patching.
//!
//! Patches are direct edits to vendored files rather than diff files: the
//! vendored tree can always be re-fetched and re-extracted from scratch, so
//! each rule guards itself with a marker substring instead of tracking state
//! elsewhere. Re-running over a partially patched tree only applies the
//! rules whose markers are still absent.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// A single textual transformation inside a [`PatchRule`].
#[derive(Debug, Clone)]
pub enum Edit {
    /// Replace every occurrence of `old` with `new`. A file without any
    /// occurrence leaves the edit skipped with a warning (tolerated
    /// upstream drift).
    Replace { old: String, new: String },
    /// Insert a block before the current content.
    InsertHead(String),
    /// Insert a block after the current content.
    InsertTail(String),
}

/// An idempotent patch against one vendored file.
///
/// The marker's presence in the target means "already applied"; applying a
/// rule twice yields the same content as applying it once.
#[derive(Debug, Clone)]
pub struct PatchRule {
    pub label: &'static str,
    pub file: PathBuf,
    pub marker: String,
    pub edits: Vec<Edit>,
}

/// Apply one rule. Returns `false` when the marker is already present.
pub fn apply_rule(rule: &PatchRule) -> Result<bool> {
    let mut content = fs::read_to_string(&rule.file)
        .with_context(|| format!("reading patch target '{}'", rule.file.display()))?;

    if content.contains(&rule.marker) {
        println!("[patch] {}: already applied", rule.label);
        return Ok(false);
    }

    for edit in &rule.edits {
        match edit {
            Edit::Replace { old, new } => {
                if content.contains(old.as_str()) {
                    content = content.replace(old.as_str(), new);
                } else {
                    println!(
                        "[patch] warning: {}: no occurrence of {:?} in '{}', replacement skipped",
                        rule.label,
                        old,
                        rule.file.display()
                    );
                }
            }
            Edit::InsertHead(block) => content = format!("{block}\n{content}"),
            Edit::InsertTail(block) => content = format!("{content}\n{block}"),
        }
    }

    fs::write(&rule.file, &content)
        .with_context(|| format!("writing patch target '{}'", rule.file.display()))?;
    println!("[patch] {}: applied", rule.label);
    Ok(true)
}

/// Apply rules in declared order; returns how many actually fired.
pub fn apply_rules(rules: &[PatchRule]) -> Result<usize> {
    let mut applied = 0;
    for rule in rules {
        if apply_rule(rule)? {
            applied += 1;
        }
    }
    Ok(applied)
}

//! Frozen requirements regeneration

use crate::{Error, Result};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// The default regeneration entrypoint.
pub const DEFAULT_REGEN_COMMAND: &[&str] = &["make", "update-deps"];

/// An update to a frozen requirements group.
///
/// No declaration is edited directly; the external regeneration tool
/// rewrites the lockfiles from their input constraints. The tool's exit
/// status decides success, and its output is captured for diagnostics.
#[derive(Debug, Clone)]
pub struct FrozenUpdate {
    /// Directory containing the frozen requirements
    pub path: PathBuf,
    /// Regeneration command, argv style
    pub command: Vec<String>,
    /// Whether the regeneration already ran during analysis.
    ///
    /// Freshness of frozen requirements can only be determined by running
    /// the tool, so an update-mode analysis leaves its result in place and
    /// marks the update applied rather than regenerating twice.
    pub applied: bool,
}

impl FrozenUpdate {
    /// Short description of this update.
    pub fn description(&self) -> String {
        "Update frozen dependencies".to_string()
    }

    /// Run the regeneration command in the tree root.
    ///
    /// The regeneration tool is deterministic given unchanged upstreams,
    /// so rerunning it is a no-op on an already-regenerated tree.
    pub fn apply(&self) -> Result<()> {
        if self.applied {
            return Ok(());
        }
        run_regen_command(&self.command, self.tree_root())
    }

    fn tree_root(&self) -> PathBuf {
        self.path.parent().map(PathBuf::from).unwrap_or_else(|| self.path.clone())
    }
}

/// Invoke the external regeneration command and surface its failure output.
pub(crate) fn run_regen_command(command: &[String], cwd: PathBuf) -> Result<()> {
    let rendered = command.join(" ");
    debug!(command = %rendered, cwd = %cwd.display(), "Running regeneration command");

    let (program, args) = command.split_first().ok_or_else(|| Error::Regeneration {
        command: rendered.clone(),
        message: "empty command".to_string(),
    })?;
    let output = Command::new(program)
        .args(args)
        .current_dir(&cwd)
        .output()
        .map_err(|e| Error::Regeneration {
            command: rendered.clone(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::Regeneration {
            command: rendered,
            message: format!(
                "exit status {}: {}{}",
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
            ),
        });
    }
    Ok(())
}

//! CI workflow templates
//!
//! Renders the GitHub Actions workflow that builds the Flutter project and
//! uploads the artifacts to a release, and materializes it on disk.
//! Installation is replace-all: after [`install_workflow`] the workflow
//! directory contains exactly one definition file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

mod flutter;

pub use flutter::FlutterWorkflowTemplate;

/// File name of the installed workflow definition
pub const WORKFLOW_FILE_NAME: &str = "build.yml";

/// Workflow directory relative to the project root
pub const WORKFLOW_DIR: &str = ".github/workflows";

/// Write `content` as the single workflow definition for the project.
///
/// Every existing regular file in the workflow directory is removed first,
/// so repeated installation never accumulates stale definitions. Returns the
/// path of the written file.
pub fn install_workflow(project_path: &Path, content: &str) -> Result<PathBuf> {
    let workflow_dir = project_path.join(WORKFLOW_DIR);

    if workflow_dir.exists() {
        for entry in std::fs::read_dir(&workflow_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                debug!(path = %path.display(), "removing old workflow file");
                std::fs::remove_file(&path)?;
            }
        }
    } else {
        std::fs::create_dir_all(&workflow_dir)?;
    }

    let workflow_path = workflow_dir.join(WORKFLOW_FILE_NAME);
    std::fs::write(&workflow_path, content)?;
    info!(path = %workflow_path.display(), "installed workflow definition");
    Ok(workflow_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_install_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let path = install_workflow(temp.path(), "name: Build\n").unwrap();

        assert!(path.ends_with(".github/workflows/build.yml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "name: Build\n");
    }

    #[test]
    fn test_install_replaces_all_existing_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(WORKFLOW_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("old_one.yml"), "stale").unwrap();
        std::fs::write(dir.join("old_two.yaml"), "stale").unwrap();

        install_workflow(temp.path(), "name: Build\n").unwrap();

        let entries: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], WORKFLOW_FILE_NAME);
    }

    #[test]
    fn test_install_is_idempotent() {
        let temp = TempDir::new().unwrap();
        install_workflow(temp.path(), "one").unwrap();
        let path = install_workflow(temp.path(), "two").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        let dir = temp.path().join(WORKFLOW_DIR);
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }
}

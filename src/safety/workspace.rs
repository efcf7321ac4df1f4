//! Build workspace management
//! The workspace source root holds one protected vendor tree plus at most
//! one staged submission. Everything else is pruned before each staging.
use crate::config::settings::WorkspaceConfig;
use crate::config::types::{GradeError, Result};
use crate::judge::submission::Submission;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of a [`WorkspaceManager::clean`] pass
#[derive(Debug, Default, Clone, Serialize)]
pub struct CleanReport {
    pub removed: Vec<String>,
    pub preserved: Vec<String>,
}

/// Workspace manager for the persistent build workspace
pub struct WorkspaceManager {
    /// Workspace root, the build tool's working directory
    root: PathBuf,
    /// Package directory scanned by the build tool
    source_root: PathBuf,
    /// Entries whose name contains this marker survive cleaning
    protected_marker: String,
}

impl WorkspaceManager {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            root: config.root.clone(),
            source_root: config.source_root(),
            protected_marker: config.protected_marker.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn is_protected(&self, name: &str) -> bool {
        name.contains(&self.protected_marker)
    }

    /// Top-level entry names under the source root, sorted
    pub fn entries(&self) -> Result<Vec<String>> {
        if !self.source_root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.source_root)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Delete every top-level entry except protected ones. Not reversible.
    /// A missing source root is a no-op.
    pub fn clean(&self) -> Result<CleanReport> {
        let mut report = CleanReport::default();
        if !self.source_root.exists() {
            log::debug!(
                "Workspace source root {} does not exist, nothing to clean",
                self.source_root.display()
            );
            return Ok(report);
        }

        for name in self.entries()? {
            if self.is_protected(&name) {
                report.preserved.push(name);
                continue;
            }
            let path = self.source_root.join(&name);
            remove_entry(&path)?;
            log::info!("Removed stale workspace entry {}", path.display());
            report.removed.push(name);
        }

        Ok(report)
    }

    /// Copy the submission into the source root under its package name,
    /// replacing any earlier copy. Returns the staged path.
    pub fn stage(&self, submission: &Submission) -> Result<PathBuf> {
        let name = submission.package_name();
        if self.is_protected(name) {
            return Err(GradeError::Submission(format!(
                "Package name {} collides with the protected workspace marker {}",
                name, self.protected_marker
            )));
        }

        fs::create_dir_all(&self.source_root).map_err(|e| {
            GradeError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create workspace source root {}: {}",
                    self.source_root.display(),
                    e
                ),
            ))
        })?;

        let dest = self.source_root.join(name);
        if fs::symlink_metadata(&dest).is_ok() {
            remove_entry(&dest)?;
        }

        copy_tree(submission.root(), &dest)?;
        log::info!(
            "Staged {} into {}",
            submission.root().display(),
            dest.display()
        );
        Ok(dest)
    }
}

/// Remove a file, symlink or directory tree without following symlinks
fn remove_entry(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| {
        GradeError::Filesystem(format!("Failed to remove {}: {}", path.display(), e))
    })
}

/// Deep copy `src` to `dest`. Symlinks are recreated, not followed.
fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            GradeError::Filesystem(format!("Failed to walk {}: {}", src.display(), e))
        })?;
        let relative = entry.path().strip_prefix(src).map_err(|e| {
            GradeError::Filesystem(format!(
                "Entry {} escaped {}: {}",
                entry.path().display(),
                src.display(),
                e
            ))
        })?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        let copied = if file_type.is_dir() {
            fs::create_dir_all(&target)
        } else if file_type.is_symlink() {
            fs::read_link(entry.path())
                .and_then(|link| std::os::unix::fs::symlink(link, &target))
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };

        copied.map_err(|e| {
            GradeError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to copy {} to {}: {}",
                    entry.path().display(),
                    target.display(),
                    e
                ),
            ))
        })?;
    }
    Ok(())
}

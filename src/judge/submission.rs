use crate::config::types::{GradeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Identifies one uploaded submission across checking and simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A submitted package tree. Read-only for robograde: it is inspected in
/// place and copied, never moved, into the build workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    id: SubmissionId,
    root: PathBuf,
    package_name: String,
}

impl Submission {
    /// Treat `dir` itself as the package root
    pub fn from_package_dir(dir: &Path) -> Result<Self> {
        let root = dir.canonicalize().map_err(|e| {
            GradeError::Submission(format!("Cannot resolve {}: {}", dir.display(), e))
        })?;
        if !root.is_dir() {
            return Err(GradeError::Submission(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let package_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                GradeError::Submission(format!(
                    "Cannot infer package name from {}",
                    root.display()
                ))
            })?;

        Ok(Self {
            id: SubmissionId::new(),
            root,
            package_name,
        })
    }

    /// Find the first directory, depth-first in name order, that holds
    /// `manifest`. Uploads often wrap the package in extra folders.
    pub fn locate(upload_root: &Path, manifest: &str) -> Result<Option<Self>> {
        for entry in WalkDir::new(upload_root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                GradeError::Filesystem(format!(
                    "Failed to walk {}: {}",
                    upload_root.display(),
                    e
                ))
            })?;
            if entry.file_type().is_dir() && entry.path().join(manifest).is_file() {
                log::debug!("Found {} in {}", manifest, entry.path().display());
                return Self::from_package_dir(entry.path()).map(Some);
            }
        }
        Ok(None)
    }

    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Package name, inferred from the root directory's basename
    pub fn package_name(&self) -> &str {
        &self.package_name
    }
}

use crate::config::settings::CheckerConfig;
use crate::config::types::{Category, Finding, GradeError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const MISSING_MANIFEST_PENALTY: u32 = 50;
pub const MISSING_BUILD_DESCRIPTOR_PENALTY: u32 = 30;

/// Checks the package root for the manifest and a build descriptor
pub struct StructureValidator<'a> {
    manifest_file: &'a str,
    build_descriptors: &'a [String],
}

impl<'a> StructureValidator<'a> {
    pub fn new(config: &'a CheckerConfig) -> Self {
        Self {
            manifest_file: &config.manifest_file,
            build_descriptors: &config.build_descriptors,
        }
    }

    /// Both checks always run; a package can collect both penalties.
    pub fn check(&self, root: &Path) -> Result<Vec<Finding>> {
        let entries = fs::read_dir(root).map_err(|e| {
            GradeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to list package root {}: {}", root.display(), e),
            ))
        })?;

        let mut names = HashSet::new();
        for entry in entries {
            let entry = entry?;
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }

        let mut findings = Vec::new();
        if !names.contains(self.manifest_file) {
            findings.push(Finding::new(
                Category::Structure,
                format!(
                    "Critical: Missing '{}'. This is not a valid ROS package.",
                    self.manifest_file
                ),
                MISSING_MANIFEST_PENALTY,
            ));
        }

        if !self.build_descriptors.iter().any(|d| names.contains(d)) {
            findings.push(Finding::new(
                Category::Structure,
                format!(
                    "Critical: Missing build file ({}).",
                    self.build_descriptors.join(" or ")
                ),
                MISSING_BUILD_DESCRIPTOR_PENALTY,
            ));
        }

        Ok(findings)
    }
}

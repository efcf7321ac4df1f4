//! Static grading of submitted packages.
//!
//! [`CodeChecker`] runs the structure, safety and lint stages over a package
//! root and folds their findings into one [`Report`]. [`GradingContext`]
//! carries a submission and its report to the simulation stage.

pub mod lint;
pub mod safety;
pub mod structure;
pub mod submission;

use crate::config::settings::CheckerConfig;
use crate::config::types::{GradeError, Report, Result};
use crate::judge::lint::ExternalLintAdapter;
use crate::judge::safety::SafetyHeuristicScanner;
use crate::judge::structure::StructureValidator;
use crate::judge::submission::{Submission, SubmissionId};
use crate::syntax::normalizer::is_source_file;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every gradeable source file under `root`, in a stable order.
/// Unreadable directories are skipped, not fatal.
pub fn collect_source_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable path under {}: {}", root.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files
}

pub struct CodeChecker {
    root: PathBuf,
    config: CheckerConfig,
}

impl CodeChecker {
    pub fn new(root: impl Into<PathBuf>, config: CheckerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Structure, then safety, then lint. The stages are independent, so
    /// the order only fixes the order of messages within the report.
    pub fn generate_report(&self) -> Result<Report> {
        let mut report = Report::new();

        let structure = StructureValidator::new(&self.config).check(&self.root)?;
        report.record_all(structure);

        let sources = collect_source_files(&self.root);
        log::info!(
            "Checking {} source file(s) under {}",
            sources.len(),
            self.root.display()
        );

        report.record_all(SafetyHeuristicScanner::new(&self.config.sleep_calls).scan(&sources));
        report.record_all(ExternalLintAdapter::from_config(&self.config).lint(&sources));

        let report = report.finalize();
        log::info!(
            "Report for {}: score {} ({} finding(s))",
            self.root.display(),
            report.score,
            report.total_findings()
        );
        Ok(report)
    }
}

/// A checked submission, handed explicitly from the checker to the
/// simulation stage instead of being kept in process-wide state.
#[derive(Debug, Clone)]
pub struct GradingContext {
    pub submission: Submission,
    pub report: Report,
}

impl GradingContext {
    pub fn check(submission: Submission, config: &CheckerConfig) -> Result<Self> {
        let report = CodeChecker::new(submission.root(), config.clone()).generate_report()?;
        Ok(Self { submission, report })
    }

    pub fn id(&self) -> SubmissionId {
        self.submission.id()
    }

    /// A package without a manifest has no identity to build or run.
    pub fn ensure_simulatable(&self, config: &CheckerConfig) -> Result<()> {
        let manifest = self.submission.root().join(&config.manifest_file);
        if manifest.is_file() {
            Ok(())
        } else {
            Err(GradeError::Submission(format!(
                "{} has no {}; refusing to simulate",
                self.submission.root().display(),
                config.manifest_file
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn quiet_config() -> CheckerConfig {
        CheckerConfig {
            lint_program: "true".to_string(),
            ..CheckerConfig::default()
        }
    }

    #[test]
    fn test_collect_sources_sorted_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg").join("nodes")).unwrap();
        fs::write(dir.path().join("setup.py"), "").unwrap();
        fs::write(dir.path().join("pkg").join("nodes").join("b.py"), "").unwrap();
        fs::write(dir.path().join("pkg").join("a.py"), "").unwrap();
        fs::write(dir.path().join("pkg").join("notes.txt"), "").unwrap();

        let files = collect_source_files(dir.path());
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("pkg/a.py"),
                PathBuf::from("pkg/nodes/b.py"),
                PathBuf::from("setup.py"),
            ]
        );
    }

    #[test]
    fn test_unreadable_paths_are_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("node.py"), "").unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.py"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let files = collect_source_files(dir.path());
        let report = CodeChecker::new(dir.path(), quiet_config()).generate_report();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Root can still read the locked directory; either way the walk goes on.
        assert!(files.contains(&dir.path().join("node.py")));
        assert!(collect_source_files(&dir.path().join("missing")).is_empty());
        assert!(report.is_ok());
    }

    #[test]
    fn test_empty_dir_scores_twenty() {
        let dir = tempfile::tempdir().unwrap();
        let report = CodeChecker::new(dir.path(), quiet_config())
            .generate_report()
            .unwrap();
        assert_eq!(report.score, 20);
        assert_eq!(report.structure_errors.len(), 2);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let checker = CodeChecker::new(dir.path().join("gone"), quiet_config());
        assert!(checker.generate_report().is_err());
    }

    #[test]
    fn test_context_requires_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("setup.py"), "").unwrap();
        let config = quiet_config();

        let submission = Submission::from_package_dir(dir.path()).unwrap();
        let context = GradingContext::check(submission, &config).unwrap();
        assert!(context.ensure_simulatable(&config).is_err());

        fs::write(dir.path().join("package.xml"), "<package/>").unwrap();
        assert!(context.ensure_simulatable(&config).is_ok());
    }
}

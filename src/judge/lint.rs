use crate::config::settings::CheckerConfig;
use crate::config::types::{Category, Finding};
use std::path::Path;
use std::process::Command;

pub const LINT_PENALTY: u32 = 10;

/// Runs the external linter with a fixed rule filter, one file at a time
pub struct ExternalLintAdapter {
    program: String,
    rules: Vec<String>,
}

impl ExternalLintAdapter {
    pub fn new(program: impl Into<String>, rules: Vec<String>) -> Self {
        Self {
            program: program.into(),
            rules,
        }
    }

    pub fn from_config(config: &CheckerConfig) -> Self {
        Self::new(config.lint_program.clone(), config.lint_rules.clone())
    }

    fn command_for(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(path);
        if !self.rules.is_empty() {
            cmd.arg(format!("--select={}", self.rules.join(",")));
        }
        cmd
    }

    /// Any stdout from the linter is one penalized finding carrying the
    /// output verbatim. A linter that cannot run yields a zero-penalty note.
    pub fn lint_file(&self, path: &Path) -> Option<Finding> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::debug!("Running {} on {}", self.program, path.display());
        let output = match self.command_for(path).output() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Lint tool {} failed to start: {}", self.program, e);
                return Some(Finding::advisory(
                    Category::Syntax,
                    format!("Could not analyze {}: {}", file_name, e),
                ));
            }
        };

        if output.status.code().is_none() {
            log::warn!(
                "Lint tool {} terminated abnormally on {}: {}",
                self.program,
                path.display(),
                output.status
            );
            return Some(Finding::advisory(
                Category::Syntax,
                format!(
                    "Could not analyze {}: lint tool terminated abnormally ({})",
                    file_name, output.status
                ),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return None;
        }

        Some(Finding::new(
            Category::Syntax,
            format!("Syntax Error in {}: {}", file_name, stdout),
            LINT_PENALTY,
        ))
    }

    pub fn lint(&self, sources: &[impl AsRef<Path>]) -> Vec<Finding> {
        sources
            .iter()
            .filter_map(|path| self.lint_file(path.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn source_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("node.py");
        fs::write(&path, "print(undefined_name)\n").unwrap();
        path
    }

    #[test]
    fn test_output_becomes_penalized_finding() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        // echo repeats its arguments, standing in for a linter that reports.
        let adapter = ExternalLintAdapter::new("echo", vec!["E9".to_string(), "F82".to_string()]);

        let finding = adapter.lint_file(&path).expect("echo output is a finding");
        assert_eq!(finding.penalty, LINT_PENALTY);
        assert_eq!(finding.category, Category::Syntax);
        assert!(finding.message.starts_with("Syntax Error in node.py: "));
        assert!(finding.message.ends_with("--select=E9,F82"));
    }

    #[test]
    fn test_silent_linter_no_finding() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let adapter = ExternalLintAdapter::new("true", vec!["E9".to_string()]);
        assert!(adapter.lint_file(&path).is_none());
    }

    #[test]
    fn test_missing_tool_is_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let path = source_file(&dir);
        let adapter = ExternalLintAdapter::new("/nonexistent/robograde-lint", Vec::new());

        let finding = adapter.lint_file(&path).expect("advisory expected");
        assert_eq!(finding.penalty, 0);
        assert!(finding.message.starts_with("Could not analyze node.py"));
    }

    #[test]
    fn test_default_rule_filter() {
        let adapter = ExternalLintAdapter::from_config(&CheckerConfig::default());
        let cmd = adapter.command_for(Path::new("/pkg/node.py"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.get_program(), "flake8");
        assert_eq!(args, vec!["/pkg/node.py", "--select=E9,F63,F7,F82"]);
    }
}

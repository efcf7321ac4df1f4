use crate::config::settings::GraderConfig;
use crate::config::types::Result;
use crate::exec::shell::{CommandOutput, ShellCommand};
use serde::Serialize;
use std::path::Path;

/// Outcome of one build attempt
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    /// Kept verbatim for diagnostics when the build fails
    pub stderr: String,
}

impl From<CommandOutput> for BuildOutcome {
    fn from(output: CommandOutput) -> Self {
        Self {
            success: output.success,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs the external build tool over the workspace. One attempt, no retry.
pub struct BuildRunner {
    command: ShellCommand,
}

impl BuildRunner {
    pub fn new(command: ShellCommand) -> Self {
        Self { command }
    }

    pub fn from_config(config: &GraderConfig) -> Self {
        Self::new(
            ShellCommand::new(&config.simulation.shell, config.build.command.clone())
                .with_setup_scripts(&config.simulation.setup_scripts)
                .current_dir(&config.workspace.root),
        )
    }

    /// Use `workspace_root` as the working directory instead of the configured one
    pub fn in_workspace(mut self, workspace_root: &Path) -> Self {
        self.command = self.command.current_dir(workspace_root);
        self
    }

    /// Blocks until the tool exits. `Err` only when the tool cannot be
    /// started; a failing build is `Ok` with `success == false`.
    pub fn build(&self) -> Result<BuildOutcome> {
        log::info!("Building workspace: {}", self.command.script());
        let outcome = BuildOutcome::from(self.command.output()?);
        if outcome.success {
            log::info!("Build succeeded");
        } else {
            log::error!(
                "Build failed (exit {:?}):\n{}",
                outcome.exit_code,
                outcome.stderr.trim_end()
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_classification() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(ShellCommand::new("/bin/bash", "echo built"))
            .in_workspace(dir.path());
        let outcome = runner.build().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(outcome.stdout.trim(), "built");
    }

    #[test]
    fn test_failure_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(ShellCommand::new(
            "/bin/bash",
            "echo 'CMake Error: missing dependency' >&2; exit 2",
        ))
        .in_workspace(dir.path());
        let outcome = runner.build().unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(2));
        assert_eq!(outcome.stderr.trim(), "CMake Error: missing dependency");
    }

    #[test]
    fn test_runs_in_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BuildRunner::new(ShellCommand::new("/bin/bash", "touch built.marker"))
            .in_workspace(dir.path());
        assert!(runner.build().unwrap().success);
        assert!(dir.path().join("built.marker").is_file());
    }
}

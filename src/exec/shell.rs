use crate::config::types::{GradeError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Quote `value` for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+=:,@%".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// A script line run as `<shell> -c`, after sourcing any setup scripts.
///
/// Simulation tooling expects the environment its setup scripts export, so
/// every external command goes through here.
#[derive(Debug, Clone)]
pub struct ShellCommand {
    shell: PathBuf,
    setup_scripts: Vec<PathBuf>,
    script: String,
    workdir: Option<PathBuf>,
}

impl ShellCommand {
    pub fn new(shell: impl Into<PathBuf>, script: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            setup_scripts: Vec::new(),
            script: script.into(),
            workdir: None,
        }
    }

    pub fn with_setup_scripts(mut self, scripts: &[PathBuf]) -> Self {
        self.setup_scripts.extend(scripts.iter().cloned());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.workdir = Some(dir.to_path_buf());
        self
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Full line passed to `-c`
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self
            .setup_scripts
            .iter()
            .map(|s| format!("source {}", shell_quote(&s.to_string_lossy())))
            .collect();
        parts.push(self.script.clone());
        parts.join(" && ")
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(self.command_line());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run to completion, capturing stdout and stderr
    pub fn output(&self) -> Result<CommandOutput> {
        log::debug!("Running: {}", self.command_line());
        let output = self
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                GradeError::Process(format!("Failed to run {}: {}", self.script, e))
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Result of a blocking external command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the command was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

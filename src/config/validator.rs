// Config Validation
// Startup validation: unusable settings are errors, suspicious ones are warnings

use crate::config::settings::GraderConfig;
use crate::config::types::{GradeError, Result};

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate config at startup; any error makes the whole config unusable
pub fn validate_config(config: &GraderConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_checker(config, &mut result);
    validate_workspace(config, &mut result);
    validate_simulation(config, &mut result);

    if !result.is_valid() {
        return Err(GradeError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_checker(config: &GraderConfig, result: &mut ValidationResult) {
    let checker = &config.checker;
    if checker.manifest_file.trim().is_empty() {
        result.add_error("checker.manifest_file cannot be empty".to_string());
    }
    if checker.build_descriptors.is_empty() {
        result.add_warning(
            "checker.build_descriptors is empty; every package will lose the build descriptor penalty"
                .to_string(),
        );
    }
    if checker.lint_program.trim().is_empty() {
        result.add_error("checker.lint_program cannot be empty".to_string());
    }
    if checker.lint_rules.is_empty() {
        result.add_warning(
            "checker.lint_rules is empty; the linter will run with its full rule set".to_string(),
        );
    }
    if checker.sleep_calls.is_empty() {
        result.add_warning(
            "checker.sleep_calls is empty; every while loop will be flagged".to_string(),
        );
    }
}

fn validate_workspace(config: &GraderConfig, result: &mut ValidationResult) {
    let workspace = &config.workspace;
    if workspace.root.as_os_str().is_empty() {
        result.add_error("workspace.root cannot be empty".to_string());
    } else if !workspace.root.is_absolute() {
        result.add_warning(format!(
            "workspace.root {} is relative; it will resolve against the current directory",
            workspace.root.display()
        ));
    }
    if workspace.protected_marker.is_empty() {
        // An empty marker is a substring of every name and would protect everything.
        result.add_error("workspace.protected_marker cannot be empty".to_string());
    }
    if config.build.command.trim().is_empty() {
        result.add_error("build.command cannot be empty".to_string());
    }
}

fn validate_simulation(config: &GraderConfig, result: &mut ValidationResult) {
    let sim = &config.simulation;
    if sim.launch_command.trim().is_empty() {
        result.add_error("simulation.launch_command cannot be empty".to_string());
    }
    if sim.node_name.trim().is_empty() {
        result.add_error("simulation.node_name cannot be empty".to_string());
    }
    if sim.duration_secs <= sim.stabilization_secs {
        result.add_warning(format!(
            "simulation.duration_secs ({}) does not exceed stabilization_secs ({}); monitoring time will be zero",
            sim.duration_secs, sim.stabilization_secs
        ));
    }
    if sim.controllers.is_empty() {
        result.add_warning("simulation.controllers is empty; no controller will be activated".to_string());
    }
    let trajectory = &sim.trajectory;
    if trajectory.joint_names.len() != trajectory.positions.len() {
        result.add_error(format!(
            "simulation.trajectory has {} joint names but {} positions",
            trajectory.joint_names.len(),
            trajectory.positions.len()
        ));
    }
}

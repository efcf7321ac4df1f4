/// Configuration loading from robograde.json
use crate::config::types::{GradeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the current directory by [`GraderConfig::load_default`]
pub const DEFAULT_CONFIG_FILE: &str = "robograde.json";

/// Full robograde.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    pub checker: CheckerConfig,
    pub workspace: WorkspaceConfig,
    pub build: BuildConfig,
    pub simulation: SimulationConfig,
}

/// Static checker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Package manifest that marks a directory as a package
    pub manifest_file: String,
    /// Build descriptors, any one of which satisfies the structure check
    pub build_descriptors: Vec<String>,
    /// External lint executable
    pub lint_program: String,
    /// Rule codes passed to the linter; only cannot-compile/cannot-run classes
    pub lint_rules: Vec<String>,
    /// Member names treated as a yield to the scheduler
    pub sleep_calls: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            manifest_file: "package.xml".to_string(),
            build_descriptors: vec!["CMakeLists.txt".to_string(), "setup.py".to_string()],
            lint_program: "flake8".to_string(),
            lint_rules: ["E9", "F63", "F7", "F82"].iter().map(|s| s.to_string()).collect(),
            sleep_calls: vec!["sleep".to_string()],
        }
    }
}

/// Persistent build workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
    /// Top-level entries whose name contains this marker are never deleted
    pub protected_marker: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        Self {
            root: home.join("ros_evaluator_tool").join("sim_ws"),
            protected_marker: "Universal_Robots".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Directory holding the packages the build tool picks up
    pub fn source_root(&self) -> PathBuf {
        self.root.join("src")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub command: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: "colcon build".to_string(),
        }
    }
}

/// Scripted trajectory published during the injection phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub topic: String,
    pub message_type: String,
    pub joint_names: Vec<String>,
    pub positions: Vec<f64>,
    pub time_from_start_secs: u32,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            topic: "/joint_trajectory_controller/joint_trajectory".to_string(),
            message_type: "trajectory_msgs/msg/JointTrajectory".to_string(),
            joint_names: [
                "shoulder_pan_joint",
                "shoulder_lift_joint",
                "elbow_joint",
                "wrist_1_joint",
                "wrist_2_joint",
                "wrist_3_joint",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            positions: vec![0.0, -1.57, 1.57, 0.0, 0.0, 0.0],
            time_from_start_secs: 2,
        }
    }
}

/// Simulator, controller and timing settings for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Shell used for every simulation-side command
    pub shell: PathBuf,
    /// Setup scripts sourced before each command
    pub setup_scripts: Vec<PathBuf>,
    /// Also source `<workspace>/install/setup.bash` after a successful build
    pub source_workspace_overlay: bool,
    pub launch_command: String,
    pub unpause_service: String,
    /// Controllers activated in order after stabilization
    pub controllers: Vec<String>,
    pub trajectory: TrajectoryConfig,
    /// Entry node run from the submitted package
    pub node_name: String,
    pub stabilization_secs: u64,
    /// Total session time; stabilization is counted against it
    pub duration_secs: u64,
    /// Cap on captured user-node output
    pub output_limit_bytes: usize,
    /// Wait between SIGTERM and SIGKILL during teardown
    pub termination_grace_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/bash"),
            setup_scripts: vec![PathBuf::from("/opt/ros/humble/setup.bash")],
            source_workspace_overlay: true,
            launch_command: "ros2 launch ur_simulation_gazebo ur_sim_control.launch.py"
                .to_string(),
            unpause_service: "/unpause_physics".to_string(),
            controllers: vec![
                "joint_trajectory_controller".to_string(),
                "scaled_joint_trajectory_controller".to_string(),
            ],
            trajectory: TrajectoryConfig::default(),
            node_name: "mover_node".to_string(),
            stabilization_secs: 20,
            duration_secs: 25,
            output_limit_bytes: 1024 * 1024,
            termination_grace_ms: 500,
        }
    }
}

impl SimulationConfig {
    pub fn stabilization(&self) -> Duration {
        Duration::from_secs(self.stabilization_secs)
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn termination_grace(&self) -> Duration {
        Duration::from_millis(self.termination_grace_ms)
    }
}

impl GraderConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GradeError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: GraderConfig = serde_json::from_str(&content)
            .map_err(|e| GradeError::Config(format!("Failed to parse config JSON: {}", e)))?;

        Ok(config)
    }

    /// Load ./robograde.json if present, otherwise built-in defaults
    pub fn load_default() -> Result<Self> {
        let config_path = std::env::current_dir()
            .map_err(|e| GradeError::Config(format!("Failed to get current directory: {}", e)))?
            .join(DEFAULT_CONFIG_FILE);

        if !config_path.exists() {
            log::debug!("{} not found, using built-in defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        Self::load_from_file(config_path)
    }
}

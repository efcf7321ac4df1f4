//! Shell commands issued by a simulation session.
//!
//! Every ROS interaction is a plain shell line run through
//! [`ShellCommand`], so tests can swap in ordinary `bash` snippets.

use crate::config::settings::{GraderConfig, TrajectoryConfig};
use crate::exec::shell::{shell_quote, ShellCommand};
use std::path::{Path, PathBuf};

/// The fixed set of commands one session runs, in phase order
#[derive(Debug, Clone)]
pub struct SimulationCommands {
    pub launch: ShellCommand,
    pub unpause: ShellCommand,
    /// One activation per controller, run in this order
    pub activate_controllers: Vec<ShellCommand>,
    pub inject: ShellCommand,
    pub user_node: ShellCommand,
}

impl SimulationCommands {
    /// Build the ROS command set for running `node` from `package`
    pub fn ros(config: &GraderConfig, workspace_root: &Path, package: &str, node: &str) -> Self {
        let sim = &config.simulation;
        let mut prelude: Vec<PathBuf> = sim.setup_scripts.clone();
        if sim.source_workspace_overlay {
            prelude.push(workspace_root.join("install").join("setup.bash"));
        }
        let command = |script: String| {
            ShellCommand::new(&sim.shell, script)
                .with_setup_scripts(&prelude)
                .current_dir(workspace_root)
        };

        Self {
            launch: command(sim.launch_command.clone()),
            unpause: command(format!(
                "ros2 service call {} std_srvs/srv/Empty {{}}",
                shell_quote(&sim.unpause_service)
            )),
            activate_controllers: sim
                .controllers
                .iter()
                .map(|c| {
                    command(format!(
                        "ros2 control set_controller_state {} active",
                        shell_quote(c)
                    ))
                })
                .collect(),
            inject: command(format!(
                "ros2 topic pub --once {} {} {}",
                shell_quote(&sim.trajectory.topic),
                shell_quote(&sim.trajectory.message_type),
                shell_quote(&trajectory_payload(&sim.trajectory))
            )),
            user_node: command(format!(
                "ros2 run {} {} --ros-args -p use_sim_time:=true",
                shell_quote(package),
                shell_quote(node)
            )),
        }
    }
}

/// YAML flow mapping accepted by `ros2 topic pub` for a single-point trajectory
pub fn trajectory_payload(trajectory: &TrajectoryConfig) -> String {
    let joints = trajectory
        .joint_names
        .iter()
        .map(|j| format!("'{}'", j))
        .collect::<Vec<_>>()
        .join(", ");
    let positions = trajectory
        .positions
        .iter()
        .map(|p| format!("{:?}", p))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{{joint_names: [{}], points: [{{positions: [{}], time_from_start: {{sec: {}, nanosec: 0}}}}]}}",
        joints, positions, trajectory.time_from_start_secs
    )
}

//! Simulation session lifecycle with real short-lived bash process groups
//! standing in for the ROS tools.

use nix::unistd::Pid;
use robograde::config::settings::{GraderConfig, WorkspaceConfig};
use robograde::exec::build::BuildRunner;
use robograde::exec::shell::ShellCommand;
use robograde::judge::submission::Submission;
use robograde::judge::GradingContext;
use robograde::kernel::process::group_exists;
use robograde::observability::events::SessionEventKind;
use robograde::safety::workspace::WorkspaceManager;
use robograde::session::commands::SimulationCommands;
use robograde::session::{SessionState, SessionTimings, SimulationSession};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn bash(script: &str) -> ShellCommand {
    ShellCommand::new("/bin/bash", script)
}

fn write_package(dir: &Path) -> PathBuf {
    let pkg = dir.join("upload").join("mover_pkg");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("package.xml"), "<package/>").unwrap();
    fs::write(pkg.join("setup.py"), "").unwrap();
    pkg
}

fn timings() -> SessionTimings {
    SessionTimings {
        stabilization: Duration::from_millis(100),
        total: Duration::from_millis(400),
        termination_grace: Duration::from_millis(300),
        output_limit: 1024,
    }
}

#[test]
fn test_descendants_are_torn_down() {
    let dir = tempfile::tempdir().unwrap();
    let submission = Submission::from_package_dir(&write_package(dir.path())).unwrap();
    let workspace = WorkspaceManager::new(&WorkspaceConfig {
        root: dir.path().join("ws"),
        protected_marker: "Universal_Robots".to_string(),
    });
    let commands = SimulationCommands {
        // The launcher forks helpers, like a real simulator launch file
        launch: bash("sleep 30 & sleep 30 & exec sleep 30"),
        unpause: bash("true"),
        activate_controllers: vec![bash("true"), bash("true")],
        inject: bash("true"),
        // Ignores SIGTERM, so teardown has to escalate
        user_node: bash("trap '' TERM; echo ready; while true; do sleep 0.05; done"),
    };

    let outcome = SimulationSession::new(
        submission,
        workspace,
        BuildRunner::new(bash("true")),
        commands,
        timings(),
    )
    .run();

    assert!(outcome.is_completed());
    assert_eq!(outcome.terminations.len(), 2);
    assert!(outcome.terminations[0].kill_sent);
    for report in &outcome.terminations {
        assert!(!group_exists(Pid::from_raw(report.pgid)));
    }
    assert!(outcome
        .user_node_output
        .as_ref()
        .unwrap()
        .text
        .contains("ready"));

    let started = outcome
        .events
        .iter()
        .filter(|e| matches!(e.kind, SessionEventKind::GroupStarted { .. }))
        .count();
    let stopped = outcome
        .events
        .iter()
        .filter(|e| matches!(e.kind, SessionEventKind::GroupStopped { .. }))
        .count();
    assert_eq!(started, 2);
    assert_eq!(stopped, 2);
}

#[test]
fn test_configured_session_without_ros_tooling() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = write_package(dir.path());

    let mut config = GraderConfig::default();
    config.checker.lint_program = "true".to_string();
    config.workspace.root = dir.path().join("ws");
    config.simulation.setup_scripts.clear();
    config.simulation.source_workspace_overlay = false;
    config.simulation.launch_command = "exec sleep 30".to_string();
    config.simulation.stabilization_secs = 0;
    config.simulation.duration_secs = 1;
    config.build.command = "mkdir -p install".to_string();

    let submission = Submission::from_package_dir(&pkg).unwrap();
    let context = GradingContext::check(submission, &config.checker).unwrap();
    let outcome = SimulationSession::from_config(&context, &config, "mover_node")
        .unwrap()
        .run();

    // Control calls and the node fail without ROS installed; none of that is fatal
    assert_eq!(outcome.state, SessionState::Completed);
    assert_eq!(outcome.submission_id, context.id());
    assert!(dir.path().join("ws").join("install").is_dir());
    assert!(dir.path().join("ws").join("src").join("mover_pkg").join("package.xml").is_file());
    for report in &outcome.terminations {
        assert!(!group_exists(Pid::from_raw(report.pgid)));
    }
}

#[test]
fn test_submission_without_manifest_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("not_a_pkg");
    fs::create_dir_all(&pkg).unwrap();

    let mut config = GraderConfig::default();
    config.checker.lint_program = "true".to_string();
    config.workspace.root = dir.path().join("ws");

    let context =
        GradingContext::check(Submission::from_package_dir(&pkg).unwrap(), &config.checker)
            .unwrap();
    assert!(SimulationSession::from_config(&context, &config, "mover_node").is_err());
    assert!(!dir.path().join("ws").exists());
}

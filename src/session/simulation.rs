//! Simulation session orchestrator.
//!
//! Drives one submission from a clean workspace through build, simulator
//! launch, controller activation, the user's node and a scripted stimulus,
//! then tears down every process group it started. Each phase is one
//! function; a phase that succeeds moves to [`SessionState::next`].

use crate::config::settings::{GraderConfig, SimulationConfig};
use crate::config::types::{GradeError, Result};
use crate::exec::build::{BuildOutcome, BuildRunner};
use crate::exec::process_group::{ProcessGroup, TerminationReport};
use crate::exec::shell::ShellCommand;
use crate::judge::submission::{Submission, SubmissionId};
use crate::judge::GradingContext;
use crate::kernel::process::become_subreaper;
use crate::kernel::signal::SignalHandler;
use crate::observability::events::{EventTrail, SessionEvent, SessionEventKind};
use crate::safety::workspace::{CleanReport, WorkspaceManager};
use crate::session::commands::SimulationCommands;
use crate::session::state::SessionState;
use crate::utils::output::CapturedOutput;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const SIMULATOR_LABEL: &str = "simulator";
const USER_NODE_LABEL: &str = "user_node";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Warm-up wait after the simulator starts
    pub stabilization: Duration,
    /// Whole simulation window, stabilization included
    pub total: Duration,
    /// SIGTERM to SIGKILL grace per process group
    pub termination_grace: Duration,
    pub output_limit: usize,
}

impl SessionTimings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            stabilization: config.stabilization(),
            total: config.total_duration(),
            termination_grace: config.termination_grace(),
            output_limit: config.output_limit_bytes,
        }
    }

    /// Time left for monitoring once stabilization has elapsed
    pub fn monitoring(&self) -> Duration {
        self.total.saturating_sub(self.stabilization)
    }
}

/// Everything a finished session reports
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub submission_id: SubmissionId,
    pub state: SessionState,
    pub failure: Option<String>,
    pub clean: Option<CleanReport>,
    pub staged_path: Option<PathBuf>,
    pub build: Option<BuildOutcome>,
    pub user_node_output: Option<CapturedOutput>,
    pub terminations: Vec<TerminationReport>,
    pub transitions: Vec<SessionState>,
    pub events: Vec<SessionEvent>,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }
}

pub struct SimulationSession {
    submission: Submission,
    workspace: WorkspaceManager,
    builder: BuildRunner,
    commands: SimulationCommands,
    timings: SessionTimings,
    shutdown: Option<SignalHandler>,
    /// Owned groups in spawn order
    groups: Vec<ProcessGroup>,
    state: SessionState,
    transitions: Vec<SessionState>,
    trail: EventTrail,
    failure: Option<String>,
    clean: Option<CleanReport>,
    staged_path: Option<PathBuf>,
    build: Option<BuildOutcome>,
    terminations: Vec<TerminationReport>,
}

impl SimulationSession {
    pub fn new(
        submission: Submission,
        workspace: WorkspaceManager,
        builder: BuildRunner,
        commands: SimulationCommands,
        timings: SessionTimings,
    ) -> Self {
        let trail = EventTrail::new(submission.id());
        Self {
            submission,
            workspace,
            builder,
            commands,
            timings,
            shutdown: None,
            groups: Vec::new(),
            state: SessionState::Idle,
            transitions: vec![SessionState::Idle],
            trail,
            failure: None,
            clean: None,
            staged_path: None,
            build: None,
            terminations: Vec::new(),
        }
    }

    /// Session for a checked submission, running `node` from its package.
    /// Refuses submissions without a manifest.
    pub fn from_config(context: &GradingContext, config: &GraderConfig, node: &str) -> Result<Self> {
        context.ensure_simulatable(&config.checker)?;
        let workspace = WorkspaceManager::new(&config.workspace);
        let commands = SimulationCommands::ros(
            config,
            workspace.root(),
            context.submission.package_name(),
            node,
        );
        Ok(Self::new(
            context.submission.clone(),
            workspace,
            BuildRunner::from_config(config),
            commands,
            SessionTimings::from_config(&config.simulation),
        ))
    }

    /// Poll `handler` between phases and tear down early when it fires
    pub fn with_shutdown(mut self, handler: SignalHandler) -> Self {
        self.shutdown = Some(handler);
        self
    }

    /// Run every phase to a terminal state. Owned process groups are gone
    /// when this returns.
    pub fn run(mut self) -> SessionOutcome {
        if let Err(e) = become_subreaper() {
            log::warn!("Could not become child subreaper: {}", e);
        }
        log::info!(
            "Starting simulation session {} for {}",
            self.submission.id(),
            self.submission.package_name()
        );

        while !self.state.is_terminal() {
            let next = self.advance();
            self.transition(next);
        }

        log::info!(
            "Simulation session {} finished: {}",
            self.submission.id(),
            self.state
        );
        self.into_outcome()
    }

    fn advance(&mut self) -> SessionState {
        if self.state == SessionState::Terminating {
            return self.terminate_all();
        }
        if let Some(signal) = self.pending_shutdown() {
            self.trail
                .record(SessionEventKind::ShutdownRequested { signal });
            self.failure = Some(format!("Interrupted by signal {}", signal));
            return SessionState::Terminating;
        }

        let result = match self.state {
            SessionState::Idle => Ok(()),
            SessionState::Cleaning => self.clean_workspace(),
            SessionState::Copying => self.copy_submission(),
            SessionState::Building => self.build_workspace(),
            SessionState::Launching => self.launch_simulator(),
            SessionState::Stabilizing => self.stabilize(),
            SessionState::Activating => self.activate_controllers(),
            SessionState::RunningUserNode => self.run_user_node(),
            SessionState::Injecting => self.inject_stimulus(),
            SessionState::Monitoring => self.monitor(),
            SessionState::Terminating | SessionState::Completed | SessionState::Failed => Ok(()),
        };

        match result {
            Ok(()) => self.state.next().unwrap_or(self.state),
            Err(e) => {
                log::error!("Session {} failed in {}: {}", self.submission.id(), self.state, e);
                self.failure = Some(e.to_string());
                if self.groups.is_empty() {
                    SessionState::Failed
                } else {
                    SessionState::Terminating
                }
            }
        }
    }

    fn pending_shutdown(&self) -> Option<i32> {
        self.shutdown
            .filter(|h| h.shutdown_requested())
            .map(|h| h.get_signal())
    }

    fn transition(&mut self, next: SessionState) {
        if next == self.state {
            return;
        }
        log::info!("Session {}: {} -> {}", self.submission.id(), self.state, next);
        self.trail.record(SessionEventKind::Transition {
            from: self.state,
            to: next,
        });
        self.transitions.push(next);
        self.state = next;
    }

    fn clean_workspace(&mut self) -> Result<()> {
        self.clean = Some(self.workspace.clean()?);
        Ok(())
    }

    fn copy_submission(&mut self) -> Result<()> {
        self.staged_path = Some(self.workspace.stage(&self.submission)?);
        Ok(())
    }

    fn build_workspace(&mut self) -> Result<()> {
        let outcome = self.builder.build()?;
        let success = outcome.success;
        let exit_code = outcome.exit_code;
        let stderr = outcome.stderr.clone();
        self.build = Some(outcome);

        if success {
            Ok(())
        } else {
            self.trail.record(SessionEventKind::BuildFailed { exit_code });
            Err(GradeError::Build(stderr))
        }
    }

    fn launch_simulator(&mut self) -> Result<()> {
        let launch = self.commands.launch.clone();
        self.spawn_group(SIMULATOR_LABEL, &launch, None)?;
        Ok(())
    }

    fn stabilize(&mut self) -> Result<()> {
        log::info!(
            "Waiting {:?} for the simulator to stabilize",
            self.timings.stabilization
        );
        std::thread::sleep(self.timings.stabilization);
        Ok(())
    }

    fn activate_controllers(&mut self) -> Result<()> {
        let mut calls = vec![("unpause".to_string(), self.commands.unpause.clone())];
        for command in &self.commands.activate_controllers {
            calls.push((command.script().to_string(), command.clone()));
        }
        for (name, command) in calls {
            self.control_call(&name, &command);
        }
        Ok(())
    }

    fn run_user_node(&mut self) -> Result<()> {
        let node = self.commands.user_node.clone();
        let limit = self.timings.output_limit;
        self.spawn_group(USER_NODE_LABEL, &node, Some(limit))?;
        Ok(())
    }

    fn inject_stimulus(&mut self) -> Result<()> {
        let inject = self.commands.inject.clone();
        self.control_call("inject", &inject);
        Ok(())
    }

    fn monitor(&mut self) -> Result<()> {
        let remaining = self.timings.monitoring();
        log::info!("Monitoring for {:?}", remaining);
        std::thread::sleep(remaining);
        Ok(())
    }

    /// Tear down every owned group, newest first. Never fails.
    fn terminate_all(&mut self) -> SessionState {
        while let Some(group) = self.groups.pop() {
            let report = group.terminate(self.timings.termination_grace);
            for note in &report.notes {
                log::warn!("{} teardown: {}", report.label, note);
            }
            self.trail.record(SessionEventKind::GroupStopped {
                label: report.label.clone(),
                pgid: report.pgid,
                term_sent: report.term_sent,
                kill_sent: report.kill_sent,
            });
            self.terminations.push(report);
        }

        if self.failure.is_some() {
            SessionState::Failed
        } else {
            SessionState::Completed
        }
    }

    fn spawn_group(
        &mut self,
        label: &str,
        command: &ShellCommand,
        capture_limit: Option<usize>,
    ) -> Result<()> {
        let group = ProcessGroup::spawn(label, command, capture_limit)?;
        self.trail.record(SessionEventKind::GroupStarted {
            label: label.to_string(),
            pgid: group.pgid().as_raw(),
        });
        self.groups.push(group);
        Ok(())
    }

    /// Blocking best-effort call; failures are logged and recorded only
    fn control_call(&mut self, name: &str, command: &ShellCommand) {
        let detail = match command.output() {
            Ok(output) if output.success => {
                log::info!("{} succeeded", name);
                return;
            }
            Ok(output) => format!(
                "exit {:?}: {}",
                output.exit_code,
                output.stderr.trim_end()
            ),
            Err(e) => e.to_string(),
        };
        log::warn!("{} failed: {}", name, detail);
        self.trail.record(SessionEventKind::ControlCallFailed {
            call: name.to_string(),
            detail,
        });
    }

    fn into_outcome(self) -> SessionOutcome {
        let user_node_output = self
            .terminations
            .iter()
            .find(|r| r.label == USER_NODE_LABEL)
            .and_then(|r| r.output.clone());

        SessionOutcome {
            submission_id: self.submission.id(),
            state: self.state,
            failure: self.failure,
            clean: self.clean,
            staged_path: self.staged_path,
            build: self.build,
            user_node_output,
            terminations: self.terminations,
            transitions: self.transitions,
            events: self.trail.into_events(),
        }
    }
}

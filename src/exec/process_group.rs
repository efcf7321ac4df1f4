//! Owned process groups.
//!
//! A [`ProcessGroup`] is the leader of a fresh session plus everything it
//! spawns. The handle is the only way to reach the group: dropping it or
//! calling [`ProcessGroup::terminate`] signals the whole group, so every exit
//! path of the owner tears the group down.

use crate::config::types::{GradeError, Result};
use crate::exec::shell::ShellCommand;
use crate::kernel::process::{group_exists, reap_group, signal_group};
use crate::utils::output::{CapturedOutput, OutputCapture};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use serde::Serialize;
use std::fs::File;
use std::os::unix::process::CommandExt;
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};

/// How long teardown waits for the capture thread to see EOF
const CAPTURE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
/// Grace period used when a handle is dropped without explicit termination
const DROP_GRACE: Duration = Duration::from_millis(200);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Signal escalation report for one group's teardown
#[derive(Debug, Clone, Default, Serialize)]
pub struct TerminationReport {
    pub label: String,
    pub pgid: i32,
    pub term_sent: bool,
    pub kill_sent: bool,
    /// The group was already gone when teardown started
    pub already_exited: bool,
    pub leader_status: Option<String>,
    pub waited_ms: u64,
    pub output: Option<CapturedOutput>,
    pub notes: Vec<String>,
}

pub struct ProcessGroup {
    label: String,
    pgid: Pid,
    child: Child,
    capture: Option<OutputCapture>,
    released: bool,
}

impl ProcessGroup {
    /// Start `command` as the leader of a new session and process group.
    ///
    /// With `capture_limit` set, stdout and stderr share one pipe whose
    /// first `capture_limit` bytes are kept; otherwise both are inherited.
    /// Returns immediately.
    pub fn spawn(
        label: impl Into<String>,
        command: &ShellCommand,
        capture_limit: Option<usize>,
    ) -> Result<Self> {
        let label = label.into();
        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null());

        let mut capture_reader = None;
        if capture_limit.is_some() {
            // Close-on-exec so children forked by other threads never hold the
            // write end; the child's stdout/stderr copies are made by dup2.
            let (read, write) = nix::unistd::pipe2(OFlag::O_CLOEXEC)
                .map_err(|e| GradeError::Process(format!("pipe for {} failed: {}", label, e)))?;
            let write_err = write.try_clone()?;
            cmd.stdout(Stdio::from(write));
            cmd.stderr(Stdio::from(write_err));
            capture_reader = Some(File::from(read));
        }

        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(std::io::Error::from)
            });
        }

        log::debug!("Spawning {}: {}", label, command.command_line());
        let child = cmd
            .spawn()
            .map_err(|e| GradeError::Process(format!("Failed to spawn {}: {}", label, e)))?;
        // Close our copies of the pipe's write end so EOF arrives when the group exits.
        drop(cmd);

        let pgid = Pid::from_raw(child.id() as i32);
        let mut group = Self {
            label,
            pgid,
            child,
            capture: None,
            released: false,
        };

        if let (Some(reader), Some(limit)) = (capture_reader, capture_limit) {
            // On failure the group is dropped here and therefore terminated.
            group.capture = Some(OutputCapture::start(reader, limit)?);
        }

        log::info!("Started {} as process group {}", group.label, group.pgid);
        Ok(group)
    }

    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    pub fn is_alive(&self) -> bool {
        group_exists(self.pgid)
    }

    /// SIGTERM the group, wait up to `grace`, then SIGKILL stragglers and
    /// reap. Never fails: every error is folded into the report.
    pub fn terminate(mut self, grace: Duration) -> TerminationReport {
        self.terminate_in_place(grace)
    }

    fn terminate_in_place(&mut self, grace: Duration) -> TerminationReport {
        self.released = true;
        let start = Instant::now();
        let mut report = TerminationReport {
            label: self.label.clone(),
            pgid: self.pgid.as_raw(),
            ..TerminationReport::default()
        };

        match signal_group(self.pgid, Signal::SIGTERM) {
            Ok(()) => report.term_sent = true,
            Err(Errno::ESRCH) => report.already_exited = true,
            Err(e) => report.notes.push(format!("SIGTERM to group failed: {}", e)),
        }

        let deadline = start + grace;
        loop {
            if self.reap_leader(&mut report) {
                reap_group(self.pgid);
                if !group_exists(self.pgid) {
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        if group_exists(self.pgid) {
            match signal_group(self.pgid, Signal::SIGKILL) {
                Ok(()) => report.kill_sent = true,
                Err(Errno::ESRCH) => {}
                Err(e) => report.notes.push(format!("SIGKILL to group failed: {}", e)),
            }
            if report.leader_status.is_none() {
                match self.child.wait() {
                    Ok(status) => report.leader_status = Some(status.to_string()),
                    Err(e) => report.notes.push(format!("wait for leader failed: {}", e)),
                }
            }
            reap_group(self.pgid);
        }

        if let Some(capture) = self.capture.take() {
            report.output = capture.finish(CAPTURE_DRAIN_TIMEOUT);
        }

        report.waited_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Stopped {} (pgid {}): term_sent={} kill_sent={} in {}ms",
            report.label,
            report.pgid,
            report.term_sent,
            report.kill_sent,
            report.waited_ms
        );
        report
    }

    /// Returns true once the leader has been reaped
    fn reap_leader(&mut self, report: &mut TerminationReport) -> bool {
        if report.leader_status.is_some() {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                report.leader_status = Some(status.to_string());
                true
            }
            Ok(None) => false,
            Err(e) => {
                report.notes.push(format!("try_wait on leader failed: {}", e));
                report.leader_status = Some("unknown".to_string());
                true
            }
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.released {
            log::warn!(
                "{} (pgid {}) dropped without explicit termination",
                self.label,
                self.pgid
            );
            let _ = self.terminate_in_place(DROP_GRACE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bash(script: &str) -> ShellCommand {
        ShellCommand::new("/bin/bash", script)
    }

    #[test]
    fn test_spawn_creates_own_group() {
        let group = ProcessGroup::spawn("sleeper", &bash("exec sleep 30"), None).unwrap();
        assert_ne!(group.pgid(), nix::unistd::getpgrp());
        assert!(group.is_alive());

        let pgid = group.pgid();
        let report = group.terminate(Duration::from_secs(2));
        assert!(report.term_sent);
        assert!(!group_exists(pgid));
    }

    #[test]
    fn test_terminate_reaches_descendants() {
        // Orphaned sleepers must be reaped by us, not by the container's init.
        crate::kernel::process::become_subreaper().unwrap();
        let group = ProcessGroup::spawn("tree", &bash("sleep 30 & sleep 30 & wait"), None).unwrap();
        let pgid = group.pgid();
        std::thread::sleep(Duration::from_millis(100));

        group.terminate(Duration::from_secs(2));
        assert!(!group_exists(pgid));
    }

    #[test]
    fn test_sigterm_ignored_escalates() {
        let group = ProcessGroup::spawn("stubborn", &bash("trap '' TERM; exec sleep 30"), None).unwrap();
        let pgid = group.pgid();
        std::thread::sleep(Duration::from_millis(100));

        let report = group.terminate(Duration::from_millis(200));
        assert!(report.kill_sent);
        assert!(!group_exists(pgid));
    }

    #[test]
    fn test_captured_output_merges_streams() {
        let group = ProcessGroup::spawn(
            "talker",
            &bash("echo out; echo err >&2; exec sleep 30"),
            Some(1024),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(200));

        let report = group.terminate(Duration::from_secs(2));
        let output = report.output.expect("capture enabled");
        assert!(output.text.contains("out"));
        assert!(output.text.contains("err"));
    }

    #[test]
    fn test_capture_survives_concurrent_spawns() {
        use std::process::Command;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        // Another thread forking long-lived children must not inherit the
        // capture pipe and hold it open past the group's exit.
        let stop = Arc::new(AtomicBool::new(false));
        let spawner = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut children = Vec::new();
                while !stop.load(Ordering::SeqCst) {
                    if let Ok(child) = Command::new("sleep").arg("5").spawn() {
                        children.push(child);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                for mut child in children {
                    let _ = child.kill();
                    let _ = child.wait();
                }
            })
        };

        let mut lost = 0;
        for i in 0..10 {
            let group = ProcessGroup::spawn(
                format!("echo-{}", i),
                &bash("echo hi"),
                Some(64),
            )
            .unwrap();
            std::thread::sleep(Duration::from_millis(50));
            let report = group.terminate(Duration::from_millis(500));
            match report.output {
                Some(output) if output.text.contains("hi") => {}
                _ => lost += 1,
            }
        }

        stop.store(true, Ordering::SeqCst);
        spawner.join().unwrap();
        assert_eq!(lost, 0);
    }

    #[test]
    fn test_already_exited_group() {
        let group = ProcessGroup::spawn("quick", &bash("exit 0"), None).unwrap();
        let pgid = group.pgid();
        std::thread::sleep(Duration::from_millis(200));

        let report = group.terminate(Duration::from_millis(200));
        assert!(!report.kill_sent);
        assert!(report.leader_status.is_some());
        assert!(!group_exists(pgid));
    }

    #[test]
    fn test_drop_terminates() {
        let group = ProcessGroup::spawn("dropped", &bash("exec sleep 30"), None).unwrap();
        let pgid = group.pgid();
        drop(group);
        assert!(!group_exists(pgid));
    }

    #[test]
    fn test_spawn_failure_is_process_error() {
        let cmd = ShellCommand::new("/nonexistent/shell", "true");
        assert!(matches!(
            ProcessGroup::spawn("bad", &cmd, None),
            Err(GradeError::Process(_))
        ));
    }
}

//! Structured session event trail
//!
//! Every state transition and process-group action is kept in order and
//! emitted as one JSON line on the `robograde::audit` log target, keyed by
//! the submission id.
use crate::judge::submission::SubmissionId;
use crate::session::state::SessionState;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const AUDIT_TARGET: &str = "robograde::audit";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEventKind {
    Transition {
        from: SessionState,
        to: SessionState,
    },
    GroupStarted {
        label: String,
        pgid: i32,
    },
    GroupStopped {
        label: String,
        pgid: i32,
        term_sent: bool,
        kill_sent: bool,
    },
    ControlCallFailed {
        call: String,
        detail: String,
    },
    BuildFailed {
        exit_code: Option<i32>,
    },
    ShutdownRequested {
        signal: i32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub submission_id: SubmissionId,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

#[derive(Debug, Clone)]
pub struct EventTrail {
    submission_id: SubmissionId,
    events: Vec<SessionEvent>,
}

impl EventTrail {
    pub fn new(submission_id: SubmissionId) -> Self {
        Self {
            submission_id,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, kind: SessionEventKind) {
        let event = SessionEvent {
            submission_id: self.submission_id,
            at: Utc::now(),
            kind,
        };
        match serde_json::to_string(&event) {
            Ok(line) => log::info!(target: AUDIT_TARGET, "{}", line),
            Err(e) => log::warn!("Failed to serialize session event: {}", e),
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<SessionEvent> {
        self.events
    }
}

//! Bounded output capture for long-running process groups
//!
//! A reader thread drains the pipe for the whole lifetime of the group so a
//! chatty node can never block on a full pipe. Only the first `limit` bytes
//! are kept; the rest is counted and dropped.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Collected output of one process group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedOutput {
    /// Retained output, lossily decoded as UTF-8
    pub text: String,
    /// Total bytes read from the pipe
    pub total_bytes: usize,
    /// True when output beyond the limit was discarded
    pub truncated: bool,
}

/// Running collector attached to a pipe read end
pub struct OutputCapture {
    rx: Receiver<CapturedOutput>,
    handle: Option<JoinHandle<()>>,
}

impl OutputCapture {
    pub fn start(mut reader: File, limit: usize) -> std::io::Result<Self> {
        let (tx, rx) = channel();
        let handle = thread::Builder::new()
            .name("robograde-capture".to_string())
            .spawn(move || {
                let mut kept = Vec::new();
                let mut total = 0usize;
                let mut chunk = [0u8; 8192];
                loop {
                    match reader.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => {
                            total += n;
                            let room = limit.saturating_sub(kept.len());
                            kept.extend_from_slice(&chunk[..n.min(room)]);
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            log::debug!("Output capture stopped: {}", e);
                            break;
                        }
                    }
                }
                let _ = tx.send(CapturedOutput {
                    text: String::from_utf8_lossy(&kept).into_owned(),
                    total_bytes: total,
                    truncated: total > kept.len(),
                });
            })?;

        Ok(Self {
            rx,
            handle: Some(handle),
        })
    }

    /// Wait up to `timeout` for EOF. A descendant that escaped its group can
    /// hold the write end open forever; in that case nothing is returned and
    /// the reader thread is left detached.
    pub fn finish(mut self, timeout: Duration) -> Option<CapturedOutput> {
        match self.rx.recv_timeout(timeout) {
            Ok(output) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                Some(output)
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Output capture did not reach EOF within {:?}", timeout);
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

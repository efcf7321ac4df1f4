//! Advisory lock serializing sessions over one build workspace.
//!
//! The orchestrator itself never locks; callers take this lock so that two
//! sessions cannot stage and build into the same workspace at once. The
//! kernel drops a `flock` when its descriptor closes, so a crashed holder
//! never leaves the workspace wedged.

use crate::config::types::{GradeError, Result};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOCK_FILE_NAME: &str = ".robograde.lock";

pub struct WorkspaceLock {
    path: PathBuf,
    _lock: Flock<File>,
}

impl WorkspaceLock {
    /// Take the exclusive lock without blocking
    pub fn acquire(workspace_root: &Path) -> Result<Self> {
        std::fs::create_dir_all(workspace_root)?;
        let path = workspace_root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        let mut lock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => lock,
            Err((_, Errno::EWOULDBLOCK)) => {
                return Err(GradeError::WorkspaceBusy(workspace_root.display().to_string()))
            }
            Err((_, errno)) => {
                return Err(GradeError::Filesystem(format!(
                    "flock on {} failed: {}",
                    path.display(),
                    errno
                )))
            }
        };

        // Owner pid for operators inspecting a busy workspace.
        lock.set_len(0)?;
        writeln!(lock, "{}", std::process::id())?;
        log::debug!("Acquired workspace lock {}", path.display());

        Ok(Self { path, _lock: lock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

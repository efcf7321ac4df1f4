//! Process-group primitives used during teardown.

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// Make this process the reaper for orphaned descendants.
///
/// Without it, a grandchild orphaned by its group leader is reparented to
/// init and, in containers whose init does not reap, lingers as a zombie
/// that still answers `killpg(pgid, 0)`.
#[cfg(target_os = "linux")]
pub fn become_subreaper() -> std::io::Result<()> {
    let rc = unsafe { libc::prctl(libc::PR_SET_CHILD_SUBREAPER, 1, 0, 0, 0) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(target_os = "linux"))]
pub fn become_subreaper() -> std::io::Result<()> {
    Ok(())
}

/// True while any member of the group, zombies included, still exists
pub fn group_exists(pgid: Pid) -> bool {
    match killpg(pgid, None) {
        Ok(()) => true,
        // EPERM means the group exists but belongs to someone else.
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Send `signal` to every member of the group
pub fn signal_group(pgid: Pid, signal: Signal) -> nix::Result<()> {
    killpg(pgid, signal)
}

/// Reap every exited member of the group that is our child. Returns the
/// number of members reaped.
pub fn reap_group(pgid: Pid) -> usize {
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-pgid.as_raw()), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(_) => reaped += 1,
            Err(Errno::EINTR) => continue,
            // ECHILD: nothing left in this group that we can wait for.
            Err(_) => break,
        }
    }
    reaped
}

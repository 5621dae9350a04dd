//! Timed waits that take the whole process group down on expiry.
//!
//! A shell line like `(sleep 1; touch x); true` forks grandchildren that
//! survive a kill aimed only at `sh`. On unix every timed child is started as
//! the leader of its own process group, and a timeout signals the group.

use std::process::Output;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::debug;

/// Make `cmd` lead a fresh process group. `kill_on_drop` stays set as a backstop.
pub(crate) fn isolate(cmd: &mut Command) -> &mut Command {
    #[cfg(unix)]
    cmd.process_group(0);
    cmd.kill_on_drop(true)
}

/// Wait for `child` to finish, or kill its group once `timeout` elapses.
///
/// Returns `Ok(None)` on timeout.
pub(crate) async fn wait_or_kill(child: Child, timeout: Duration) -> std::io::Result<Option<Output>> {
    let pid = child.id();
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map(Some),
        Err(_) => {
            // The dropped future dropped the child, so kill_on_drop already
            // hit the leader and tokio reaps it.
            if let Some(pid) = pid {
                kill_group(pid);
            }
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    // SAFETY: kill(2) with a negative pid only signals the group; no memory is touched.
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
    if rc == -1 {
        debug!(pid, error = %std::io::Error::last_os_error(), "Process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(pid: u32) {
    debug!(pid, "Process groups unsupported; relying on kill_on_drop");
}

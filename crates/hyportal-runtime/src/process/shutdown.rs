//! Stopping a server process.
//!
//! A Hytale server is a JVM: SIGTERM runs its shutdown hooks, which save
//! loaded worlds and player data before the process exits. The server only
//! gets `grace` for that. After it, the process is killed outright.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::warn;

/// How long a server gets to save and exit after SIGTERM.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Ask the JVM to exit, then kill it if it is still alive after `grace`.
///
/// Always reaps the child. On Windows there is no console-less equivalent of
/// SIGTERM for a JVM, so the process is killed immediately.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    if request_exit(child)? {
        if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
            return status;
        }
        warn!(pid = ?child.id(), grace = ?grace, "Server ignored SIGTERM, killing it");
    }

    child.kill().await?;
    child.wait().await
}

/// Send SIGTERM. Returns false when the caller should kill right away.
#[cfg(unix)]
fn request_exit(child: &Child) -> io::Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(false);
    };
    let pid = Pid::from_raw(i32::try_from(pid).map_err(io::Error::other)?);
    match kill(pid, Signal::SIGTERM) {
        Ok(()) => {
            tracing::debug!(pid = %pid, "Sent SIGTERM to server");
            Ok(true)
        }
        // Exited between try_wait and the signal; wait() picks up the status.
        Err(Errno::ESRCH) => Ok(true),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) -> io::Result<bool> {
    Ok(false)
}

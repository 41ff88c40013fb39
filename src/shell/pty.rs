//! PTY allocation and shell spawning.
//!
//! Uses the `nix` crate for POSIX PTY APIs. The master fd stays with the
//! relay; the slave fd becomes the shell's controlling terminal and stdio.

use std::os::fd::{AsRawFd, OwnedFd};
use std::process::Stdio;

use nix::pty::{openpty, OpenptyResult, Winsize};
use tokio::process::{Child, Command};

/// Failures while preparing the shell process. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to allocate PTY: {0}")]
    Pty(#[from] nix::Error),
    #[error("failed to spawn shell {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// An allocated PTY pair (master + slave).
pub struct PtyPair {
    pub master: OwnedFd,
    pub slave: OwnedFd,
}

/// Allocate a PTY pair with the given terminal size.
pub fn allocate_pty(rows: u16, cols: u16) -> Result<PtyPair, ProcessError> {
    let winsize = Winsize {
        ws_row: rows,
        ws_col: cols,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let OpenptyResult { master, slave } = openpty(&winsize, None)?;
    Ok(PtyPair { master, slave })
}

/// Spawn `program args...` on the slave side of the PTY.
///
/// The child becomes a session leader with the PTY slave as its controlling
/// terminal. stdin/stdout/stderr are all connected to the slave fd. Neither
/// PTY fd survives in the child beyond its stdio.
pub fn spawn_shell_pty(
    pty: &PtyPair,
    program: &str,
    args: &[String],
    working_dir: Option<&str>,
) -> Result<Child, ProcessError> {
    let slave_fd = pty.slave.as_raw_fd();
    let master_fd = pty.master.as_raw_fd();
    let mut cmd = Command::new(program);
    cmd.args(args).kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    // stdio is wired up in pre_exec via dup2, so tokio must not create pipes.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    // SAFETY: All syscalls used here are async-signal-safe per POSIX.
    unsafe {
        cmd.pre_exec(move || {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            if libc::ioctl(slave_fd, libc::TIOCSCTTY, 0) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            libc::dup2(slave_fd, 0);
            libc::dup2(slave_fd, 1);
            libc::dup2(slave_fd, 2);
            if slave_fd > 2 {
                libc::close(slave_fd);
            }
            libc::close(master_fd);
            Ok(())
        });
    }

    cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_pty() {
        let pty = allocate_pty(24, 80).unwrap();
        assert_ne!(pty.master.as_raw_fd(), pty.slave.as_raw_fd());
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let pty = allocate_pty(24, 80).unwrap();
        let err = spawn_shell_pty(&pty, "/nonexistent/shell", &[], None).unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { ref program, .. } if program == "/nonexistent/shell"));
    }

    #[tokio::test]
    async fn test_spawn_shell_exits() {
        let pty = allocate_pty(24, 80).unwrap();
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        let mut child = spawn_shell_pty(&pty, "/bin/sh", &args, Some("/")).unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }
}

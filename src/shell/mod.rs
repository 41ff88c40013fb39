//! Shell process management.
//!
//! The relay runs a single interactive shell on the slave side of a PTY; see
//! [`pty::spawn_shell_pty`].

pub mod pty;

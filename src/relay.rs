//! Duplex byte relay between a shell's PTY and a remote TCP socket.
//!
//! A session moves through three states:
//!
//! - **Connecting** - open the TCP connection, send the greeting, spawn the
//!   shell on a fresh PTY.
//! - **Relaying** - two [`RelayChannel`] tasks copy bytes (pty → socket and
//!   socket → pty) in chunks of at most [`CHUNK_SIZE`] until either side
//!   closes or fails.
//! - **Terminated** - the shell process has been reaped.
//!
//! Both channels share one [`Liveness`] flag. Whichever channel stops first
//! clears it; the other one notices at its next loop check. Stopping is
//! cooperative only: a read already blocked on a dead peer is not interrupted
//! and ends when that side itself errors or the process exits.

use std::fmt;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{Config, TargetConfig};
use crate::shell::pty::{self, ProcessError, PtyPair};

/// Maximum bytes moved per read.
pub const CHUNK_SIZE: usize = 1024;

/// Printed to stdout once the shell has exited.
pub const TERMINATION_MESSAGE: &str = "Shell killed";

/// Fatal relay session errors. Errors inside a running channel are not
/// reported here; they only stop that channel.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },
    #[error("failed to send greeting: {0}")]
    Greeting(std::io::Error),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("failed to duplicate PTY master: {0}")]
    PtyHandle(std::io::Error),
    #[error("failed to wait for shell: {0}")]
    Wait(std::io::Error),
    #[error("failed to report termination: {0}")]
    Report(std::io::Error),
}

/// Session lifecycle state, logged on each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Connecting,
    Relaying,
    Terminated,
}

/// Shared run flag for both relay channels.
///
/// Starts alive and is cleared exactly once. Relaxed ordering is enough: the
/// flag carries no data and is only polled between iterations.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag. Returns `true` only for the call that cleared it.
    pub fn kill(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Which way a channel moves bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// PTY master → socket.
    Upstream,
    /// Socket → PTY master.
    Downstream,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upstream => f.write_str("pty->socket"),
            Direction::Downstream => f.write_str("socket->pty"),
        }
    }
}

/// One direction of the relay.
pub struct RelayChannel<R, W> {
    direction: Direction,
    source: R,
    sink: W,
    liveness: Liveness,
}

impl<R, W> RelayChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(direction: Direction, source: R, sink: W, liveness: Liveness) -> Self {
        Self {
            direction,
            source,
            sink,
            liveness,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Copy chunks while the shared flag is set. Returns the bytes relayed.
    ///
    /// EOF, a read error, or a write error clears the flag and ends the loop.
    pub async fn run(&mut self) -> u64 {
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total = 0u64;
        while self.liveness.is_alive() {
            let n = match self.source.read(&mut buf).await {
                Ok(0) => {
                    debug!("Relay {}: source closed", self.direction);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!("Relay {}: read error: {e}", self.direction);
                    break;
                }
            };
            if let Err(e) = self.sink.write_all(&buf[..n]).await {
                debug!("Relay {}: write error: {e}", self.direction);
                break;
            }
            if let Err(e) = self.sink.flush().await {
                debug!("Relay {}: flush error: {e}", self.direction);
                break;
            }
            total += n as u64;
        }
        self.liveness.kill();
        debug!("Relay {} stopped after {total} bytes", self.direction);
        total
    }

    /// Give back the sink, e.g. to inspect what was written.
    pub fn into_sink(self) -> W {
        self.sink
    }
}

impl<R, W> RelayChannel<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Run the channel on its own task.
    pub fn spawn(mut self) -> JoinHandle<u64> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Open the connection to `target` and send the greeting.
pub async fn connect(target: &TargetConfig) -> Result<TcpStream, RelayError> {
    let addr = format!("{}:{}", target.host, target.port);
    let mut stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|source| RelayError::Connect {
            addr: addr.clone(),
            source,
        })?;
    stream
        .write_all(target.greeting.as_bytes())
        .await
        .map_err(RelayError::Greeting)?;
    info!("Connected to {addr}");
    Ok(stream)
}

/// Start both relay channels between the PTY master and the socket.
///
/// The master fd is duplicated so reads and writes use independent handles.
pub fn start_relays(
    master: OwnedFd,
    stream: TcpStream,
    liveness: &Liveness,
) -> Result<[JoinHandle<u64>; 2], RelayError> {
    let reader = master.try_clone().map_err(RelayError::PtyHandle)?;
    let pty_read = tokio::fs::File::from_std(std::fs::File::from(reader));
    let pty_write = tokio::fs::File::from_std(std::fs::File::from(master));
    let (sock_read, sock_write) = stream.into_split();

    let upstream = RelayChannel::new(Direction::Upstream, pty_read, sock_write, liveness.clone());
    let downstream =
        RelayChannel::new(Direction::Downstream, sock_read, pty_write, liveness.clone());
    Ok([upstream.spawn(), downstream.spawn()])
}

/// Wait for the shell to exit, then stop the relay and report it on `out`.
///
/// Normal exits and signal deaths are treated alike.
pub async fn supervise<O: Write>(
    child: &mut Child,
    liveness: &Liveness,
    out: &mut O,
) -> Result<ExitStatus, RelayError> {
    let status = child.wait().await.map_err(RelayError::Wait)?;
    info!("Shell exited: {status}");
    liveness.kill();
    writeln!(out, "{TERMINATION_MESSAGE}")
        .and_then(|()| out.flush())
        .map_err(RelayError::Report)?;
    Ok(status)
}

/// Run one full session: connect, relay until the shell exits, report.
pub async fn run<O: Write>(config: &Config, out: &mut O) -> Result<ExitStatus, RelayError> {
    let mut state = RelayState::Connecting;
    debug!("Relay state: {state:?}");
    let stream = connect(&config.target).await?;

    let pty = pty::allocate_pty(config.shell.rows, config.shell.cols)?;
    let mut child = pty::spawn_shell_pty(
        &pty,
        &config.shell.program,
        &config.shell.args,
        config.shell.working_dir.as_deref(),
    )?;
    info!(
        "Spawned {} (pid {:?}) on PTY",
        config.shell.program,
        child.id()
    );
    // The child holds its own copy of the slave; dropping ours lets the
    // master report EOF/EIO once the shell is gone.
    let PtyPair { master, slave } = pty;
    drop(slave);

    let liveness = Liveness::new();
    let _relays = start_relays(master, stream, &liveness)?;
    state = RelayState::Relaying;
    debug!("Relay state: {state:?}");

    let status = supervise(&mut child, &liveness, out).await?;
    state = RelayState::Terminated;
    debug!("Relay state: {state:?}");
    Ok(status)
}

// src/executor/multiplexer.rs

//! The default executor for ad-hoc commands on a shared connection.
//!
//! Submissions from any number of callers are funneled through a FIFO into a
//! single drain task that owns the connection. Commands are sent strictly in
//! submission order and replies resolve in that same order, which is what
//! makes positional reply correlation sound on one socket.

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::core::CinnabarError;
use crate::core::protocol::{CommandArg, RespFrame};
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// One queued submission awaiting its turn on the connection.
struct QueuedCommand {
    command: String,
    args: Vec<CommandArg>,
    reply: oneshot::Sender<Result<RespFrame, CinnabarError>>,
}

enum Submission {
    Command(QueuedCommand),
    Shutdown,
}

/// A cloneable handle serializing concurrent command submissions over one
/// connection, reissuing the in-flight command across a reconnect when the
/// fault is retriable.
///
/// Reissue after reconnect can double-execute a command whose first outcome
/// was never observed. Callers that need exactly-once must not lean on
/// transport-level retry; see `max_retries = 0` to disable it.
#[derive(Clone)]
pub struct Multiplexer {
    queue: mpsc::UnboundedSender<Submission>,
    closed: Arc<AtomicBool>,
}

impl Multiplexer {
    /// Establishes a connection for `config` and starts the drain task.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, CinnabarError> {
        let mut conn = Connection::new(config);
        conn.connect().await?;
        Ok(Self::with_connection(conn))
    }

    /// Wraps an already-established connection. The multiplexer takes over
    /// sole ownership of it.
    pub fn with_connection(conn: Connection) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        tokio::spawn(drain(conn, rx, Arc::clone(&closed)));
        Self { queue: tx, closed }
    }

    /// Closes the multiplexer. Every subsequent submission fails with
    /// `ConnectionClosed` immediately; commands already queued are failed by
    /// the drain task as it shuts down.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.queue.send(Submission::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl CommandExecutor for Multiplexer {
    async fn execute(
        &self,
        command: &str,
        args: Vec<CommandArg>,
    ) -> Result<RespFrame, CinnabarError> {
        if self.is_closed() {
            return Err(CinnabarError::ConnectionClosed);
        }
        let (reply, rx) = oneshot::channel();
        let record = QueuedCommand {
            command: command.to_string(),
            args,
            reply,
        };
        self.queue
            .send(Submission::Command(record))
            .map_err(|_| CinnabarError::ConnectionClosed)?;
        // A dropped sender means the drain task died with the connection.
        rx.await.map_err(|_| CinnabarError::ConnectionClosed)?
    }
}

/// The drain loop: exactly one runs per multiplexer, owning the connection.
/// The head command is not abandoned on a retriable fault; it is reissued on
/// the fresh connection so its caller sees the eventual reply, not an error.
async fn drain(
    mut conn: Connection,
    mut rx: mpsc::UnboundedReceiver<Submission>,
    closed: Arc<AtomicBool>,
) {
    while let Some(submission) = rx.recv().await {
        match submission {
            Submission::Shutdown => break,
            Submission::Command(record) => {
                let outcome = issue_with_retry(&mut conn, &record.command, &record.args).await;
                // The caller may have gone away; that abandons the reply but
                // never the drain.
                let _ = record.reply.send(outcome);
            }
        }
    }

    closed.store(true, Ordering::Release);
    debug!("Multiplexer drain for {} shutting down", conn.config().addr());
    conn.close().await;

    // Fail anything that slipped into the queue while shutdown raced it.
    rx.close();
    while let Ok(submission) = rx.try_recv() {
        if let Submission::Command(record) = submission {
            let _ = record.reply.send(Err(CinnabarError::ConnectionClosed));
        }
    }
}

/// Issues one command, reconnecting and resending on retriable transport
/// faults while budget remains. Server error replies and authentication
/// failures pass straight through to the caller.
async fn issue_with_retry(
    conn: &mut Connection,
    command: &str,
    args: &[CommandArg],
) -> Result<RespFrame, CinnabarError> {
    let budget = conn.config().max_retries;
    let mut attempt: u32 = 0;
    loop {
        match conn.roundtrip(command, args).await {
            Ok(frame) => return Ok(frame),
            Err(e) if e.is_retriable() && attempt < budget => {
                attempt += 1;
                warn!(
                    "Command {command} hit a transport fault ({e}); reconnecting \
                     (attempt {attempt}/{budget})"
                );
                // If reconnection itself gives up, its error is what the
                // caller sees.
                conn.reconnect().await?;
            }
            Err(e) => return Err(e),
        }
    }
}

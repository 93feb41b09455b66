// src/connection/session.rs

//! A resilient client session over one socket: establishment with handshake
//! and bounded backoff retry, a PING-probe reconnect, and the single-frame and
//! batched request/reply paths every executor builds on.

use crate::config::ConnectionConfig;
use crate::connection::AnyStream;
use crate::core::protocol::{CommandArg, RespFrame, RespFrameCodec, encode_command};
use crate::core::{CinnabarError, protocol};
use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf, split};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

/// A single client connection with its handshake state and liveness flags.
///
/// Constructed disconnected; [`Connection::connect`] dials and performs the
/// AUTH / SELECT / CLIENT SETNAME handshake. Exactly one executor may own a
/// connection at a time: the reply stream is positional, so two readers would
/// steal each other's replies.
pub struct Connection {
    config: ConnectionConfig,
    reader: Option<FramedRead<ReadHalf<AnyStream>, RespFrameCodec>>,
    writer: Option<WriteHalf<AnyStream>>,
    /// The user has requested shutdown; never auto-reconnect.
    closed: bool,
    /// The link is currently usable (dialed and handshaken).
    connected: bool,
}

impl Connection {
    /// Creates a new, disconnected session for `config`.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            reader: None,
            writer: None,
            closed: false,
            connected: false,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.reader.is_some() && self.writer.is_some()
    }

    /// Establishes the socket and performs the handshake, retrying transport
    /// failures with the configured backoff up to `max_retries`.
    ///
    /// Authentication rejection is terminal: it bypasses the retry loop
    /// entirely and surfaces at once.
    pub async fn connect(&mut self) -> Result<(), CinnabarError> {
        if self.closed {
            return Err(CinnabarError::ConnectionClosed);
        }
        if self.is_connected() {
            return Ok(());
        }

        let mut attempt: u32 = 0;
        loop {
            match self.establish().await {
                Ok(()) => {
                    self.connected = true;
                    info!("Connected to {}", self.config.addr());
                    return Ok(());
                }
                Err(e @ CinnabarError::Authentication(_)) => return Err(e),
                Err(e) if attempt < self.config.max_retries => {
                    let delay = self.config.backoff.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        "Connect to {} failed ({e}); retry {attempt}/{} in {delay:?}",
                        self.config.addr(),
                        self.config.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(
                        "Giving up connecting to {} after {attempt} retries: {e}",
                        self.config.addr()
                    );
                    return Err(e);
                }
            }
        }
    }

    /// One dial + handshake cycle.
    async fn establish(&mut self) -> Result<(), CinnabarError> {
        let stream =
            AnyStream::connect(&self.config.host, self.config.port, self.config.tls).await?;
        let (read_half, write_half) = split(stream);
        self.reader = Some(FramedRead::new(read_half, RespFrameCodec));
        self.writer = Some(write_half);

        if let Err(e) = self.handshake().await {
            self.teardown().await;
            return Err(e);
        }
        Ok(())
    }

    /// AUTH (if credentials set) → SELECT (if db ≠ 0) → CLIENT SETNAME (if named).
    async fn handshake(&mut self) -> Result<(), CinnabarError> {
        if let Some(password) = self.config.password.clone() {
            let mut args: Vec<CommandArg> = Vec::with_capacity(2);
            protocol::push_optional(&mut args, self.config.username.clone());
            args.push(password.into());
            match self.roundtrip("AUTH", &args).await {
                Ok(_) => {}
                Err(CinnabarError::ErrorReply(msg)) => {
                    return Err(CinnabarError::Authentication(msg));
                }
                Err(e) => return Err(e),
            }
        }

        if self.config.db > 0 {
            self.roundtrip("SELECT", &[self.config.db.into()])
                .await?
                .expect_ok()?;
        }

        if let Some(name) = self.config.client_name.clone() {
            self.roundtrip("CLIENT", &["SETNAME".into(), name.into()])
                .await?
                .expect_ok()?;
        }
        Ok(())
    }

    /// Probes the link with PING; on failure closes the socket and runs
    /// establishment from scratch (which itself retries with backoff).
    pub async fn reconnect(&mut self) -> Result<(), CinnabarError> {
        if self.closed {
            return Err(CinnabarError::ConnectionClosed);
        }

        if self.is_connected() {
            match self.roundtrip("PING", &[]).await {
                Ok(_) => {
                    debug!("Reconnect probe to {} answered; link is live", self.config.addr());
                    return Ok(());
                }
                Err(e) => {
                    debug!("Reconnect probe to {} failed: {e}", self.config.addr());
                }
            }
        }

        self.teardown().await;
        self.connect().await
    }

    /// Marks the session closed and shuts the socket down. Idempotent; faults
    /// from a socket that is already gone are swallowed.
    pub async fn close(&mut self) {
        self.closed = true;
        self.teardown().await;
    }

    /// Drops the halves and clears the connected flag without touching the
    /// closed flag.
    async fn teardown(&mut self) {
        self.connected = false;
        self.reader = None;
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                let e = CinnabarError::from(e);
                if !e.is_already_closed() {
                    debug!("Error shutting down socket: {e}");
                }
            }
        }
    }

    // --- Frame-level IO ---

    /// Assembles the request into one transient buffer and writes it in a
    /// single shot, so concurrent connections never observe a partial frame.
    pub async fn send_request(
        &mut self,
        command: &str,
        args: &[CommandArg],
    ) -> Result<(), CinnabarError> {
        let mut buf = BytesMut::new();
        encode_command(&mut buf, command, args);
        self.write_all(&buf).await
    }

    /// Sends an already-built frame (used for raw protocol traffic and tests).
    pub async fn send_frame(&mut self, frame: RespFrame) -> Result<(), CinnabarError> {
        let buf = frame.encode_to_vec()?;
        self.write_all(&buf).await
    }

    async fn write_all(&mut self, buf: &[u8]) -> Result<(), CinnabarError> {
        if self.closed {
            return Err(CinnabarError::ConnectionClosed);
        }
        let writer = self.writer.as_mut().ok_or_else(not_connected)?;
        writer.write_all(buf).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Reads the next reply frame.
    ///
    /// A decode error, including a stream that dies mid-frame
    /// ([`CinnabarError::TruncatedFrame`]), is a protocol violation: the link
    /// is torn down before the error surfaces, and executors must not retry
    /// it. A stream that closes cleanly between frames surfaces as the
    /// retriable [`CinnabarError::UnexpectedEof`].
    pub async fn read_frame(&mut self) -> Result<RespFrame, CinnabarError> {
        if self.closed {
            return Err(CinnabarError::ConnectionClosed);
        }
        let reader = self.reader.as_mut().ok_or_else(not_connected)?;
        match reader.next().await {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(e)) => {
                self.teardown().await;
                Err(e)
            }
            None => {
                self.teardown().await;
                Err(CinnabarError::UnexpectedEof)
            }
        }
    }

    /// One command, one reply. A server error reply is raised as
    /// [`CinnabarError::ErrorReply`] scoped to this call.
    pub async fn roundtrip(
        &mut self,
        command: &str,
        args: &[CommandArg],
    ) -> Result<RespFrame, CinnabarError> {
        self.send_request(command, args).await?;
        self.read_frame().await?.into_result()
    }

    /// Batched submission: encodes every command into one buffer, writes it in
    /// a single shot, then reads exactly one reply per command in order.
    ///
    /// A server error reply at position `i` is captured as the `Err` element
    /// at position `i`; it does not abort the batch. A transport fault aborts
    /// the whole batch and propagates.
    pub async fn send_commands(
        &mut self,
        commands: &[(String, Vec<CommandArg>)],
    ) -> Result<Vec<Result<RespFrame, CinnabarError>>, CinnabarError> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut buf = BytesMut::new();
        for (command, args) in commands {
            encode_command(&mut buf, command, args);
        }
        self.write_all(&buf).await?;

        let mut replies = Vec::with_capacity(commands.len());
        for _ in 0..commands.len() {
            let frame = self.read_frame().await?;
            replies.push(frame.into_result());
        }
        Ok(replies)
    }
}

fn not_connected() -> CinnabarError {
    CinnabarError::from(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "connection is not established",
    ))
}

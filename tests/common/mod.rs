// tests/common/mod.rs

//! A scripted RESP2 peer for exercising the client against real sockets.
#![allow(dead_code)] // Each test binary uses its own subset of these helpers.
//!
//! Tests bind a listener on an ephemeral port, accept connections in a
//! spawned task, and script the exchange command-by-command. Reconnection
//! tests accept more than once and script each connection differently.

use anyhow::{Result, bail};
use cinnabar::{BackoffPolicy, ConnectionConfig};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a tracing subscriber once per test binary so client-side logs are
/// visible under `RUST_LOG` (quiet by default).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Binds an ephemeral listener and returns it with a config pointing at it.
/// The config uses a fast constant backoff so reconnect tests stay quick.
pub async fn listener_and_config() -> (TcpListener, ConnectionConfig) {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = ConnectionConfig::new("127.0.0.1", port)
        .with_backoff(BackoffPolicy::Custom(Arc::new(|_| {
            Duration::from_millis(5)
        })))
        .with_max_retries(3);
    (listener, config)
}

/// One accepted connection, read side parsed as RESP2 request arrays.
pub struct ScriptedConn {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl ScriptedConn {
    pub async fn accept(listener: &TcpListener) -> Result<Self> {
        let (stream, _) = listener.accept().await?;
        Ok(Self {
            stream,
            buf: Vec::new(),
        })
    }

    /// Reads the next request array, returning its elements as text.
    pub async fn next_command(&mut self) -> Result<Vec<String>> {
        loop {
            if let Some((command, consumed)) = try_parse_command(&self.buf)? {
                self.buf.drain(..consumed);
                return Ok(command);
            }
            let mut chunk = [0u8; 4096];
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                bail!("peer closed before a full command arrived");
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Reads the next command and asserts its elements.
    pub async fn expect(&mut self, expected: &[&str]) -> Result<()> {
        let got = self.next_command().await?;
        if got != expected {
            bail!("expected command {expected:?}, got {got:?}");
        }
        Ok(())
    }

    /// Writes raw reply bytes verbatim.
    pub async fn reply(&mut self, raw: &str) -> Result<()> {
        self.stream.write_all(raw.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Drops the connection, simulating a transport fault.
    pub fn abort(self) {
        drop(self.stream);
    }
}

/// Parses one `*N` array of bulk strings from the front of `buf`.
/// Returns `None` when the bytes so far do not yet hold a full command.
fn try_parse_command(buf: &[u8]) -> Result<Option<(Vec<String>, usize)>> {
    let Some((header, mut pos)) = read_line(buf, 0) else {
        return Ok(None);
    };
    if !header.starts_with(b"*") {
        bail!(
            "request does not start with an array header: {:?}",
            String::from_utf8_lossy(header)
        );
    }
    let count: usize = std::str::from_utf8(&header[1..])?.parse()?;

    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let Some((len_line, after_len)) = read_line(buf, pos) else {
            return Ok(None);
        };
        if !len_line.starts_with(b"$") {
            bail!("request element is not a bulk string");
        }
        let len: usize = std::str::from_utf8(&len_line[1..])?.parse()?;
        if buf.len() < after_len + len + 2 {
            return Ok(None);
        }
        elements.push(String::from_utf8_lossy(&buf[after_len..after_len + len]).into_owned());
        pos = after_len + len + 2;
    }
    Ok(Some((elements, pos)))
}

fn read_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = &buf[start..];
    rest.windows(2)
        .position(|w| w == b"\r\n")
        .map(|idx| (&rest[..idx], start + idx + 2))
}

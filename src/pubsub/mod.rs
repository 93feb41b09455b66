// src/pubsub/mod.rs

//! The subscription session: a connection dedicated to server-pushed messages.
//!
//! Once the first subscribe completes, every frame the server sends on this
//! connection is push-style, so the session owns its connection outright and
//! exposes no general command entry point. Command executors must use their
//! own connection.

use crate::config::ConnectionConfig;
use crate::connection::Connection;
use crate::core::CinnabarError;
use crate::core::protocol::{CommandArg, RespFrame};
use bytes::Bytes;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};

/// One message pushed by the server to this subscriber.
///
/// `pattern` is set when the delivery happened through a pattern
/// subscription (`pmessage`) and names the matching pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub pattern: Option<Bytes>,
    pub channel: Bytes,
    pub payload: Bytes,
}

impl PushMessage {
    /// The channel name as text.
    pub fn channel_text(&self) -> Result<String, CinnabarError> {
        Ok(String::from_utf8(self.channel.to_vec())?)
    }

    /// The payload decoded as UTF-8 text; use the `payload` field directly
    /// for raw bytes.
    pub fn payload_text(&self) -> Result<String, CinnabarError> {
        Ok(String::from_utf8(self.payload.to_vec())?)
    }
}

/// What a decoded push frame meant.
enum PushEvent {
    Message(PushMessage),
    Ack {
        kind: AckKind,
        subject: Bytes,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AckKind {
    Subscribe,
    Unsubscribe,
    PSubscribe,
    PUnsubscribe,
}

/// A long-lived subscription session over its own connection.
///
/// The session tracks acknowledged channels and patterns locally and replays
/// both sets after a reconnect, so one `next_message` loop survives server
/// restarts. Messages published between the socket failure and the completed
/// replay are lost; pub/sub has no server-side durability, and callers that
/// need delivery guarantees should use streams instead.
pub struct Subscriber {
    conn: Connection,
    channels: HashSet<Bytes>,
    patterns: HashSet<Bytes>,
    /// Messages that arrived interleaved with subscription acks.
    pending: VecDeque<PushMessage>,
}

impl Subscriber {
    /// Dials a dedicated connection for this subscription session.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, CinnabarError> {
        let mut conn = Connection::new(config);
        conn.connect().await?;
        Ok(Self {
            conn,
            channels: HashSet::new(),
            patterns: HashSet::new(),
            pending: VecDeque::new(),
        })
    }

    /// The channels currently acknowledged by the server.
    pub fn channels(&self) -> impl Iterator<Item = &Bytes> {
        self.channels.iter()
    }

    /// The patterns currently acknowledged by the server.
    pub fn patterns(&self) -> impl Iterator<Item = &Bytes> {
        self.patterns.iter()
    }

    /// Subscribes to exact channels; returns once the server has acknowledged
    /// every one of them.
    pub async fn subscribe(&mut self, channels: &[&str]) -> Result<(), CinnabarError> {
        self.issue("SUBSCRIBE", channels).await
    }

    /// Subscribes to glob-style patterns.
    pub async fn psubscribe(&mut self, patterns: &[&str]) -> Result<(), CinnabarError> {
        self.issue("PSUBSCRIBE", patterns).await
    }

    pub async fn unsubscribe(&mut self, channels: &[&str]) -> Result<(), CinnabarError> {
        self.issue("UNSUBSCRIBE", channels).await
    }

    pub async fn punsubscribe(&mut self, patterns: &[&str]) -> Result<(), CinnabarError> {
        self.issue("PUNSUBSCRIBE", patterns).await
    }

    async fn issue(&mut self, command: &str, subjects: &[&str]) -> Result<(), CinnabarError> {
        if self.conn.is_closed() {
            return Err(CinnabarError::SubscriptionClosed);
        }
        if subjects.is_empty() {
            return Ok(());
        }
        let args: Vec<CommandArg> = subjects.iter().map(|s| CommandArg::from(*s)).collect();
        self.conn.send_request(command, &args).await?;
        self.await_acks(subjects.len()).await
    }

    /// Consumes frames until `remaining` subscription acks have been seen,
    /// buffering any messages that interleave with them. Local state is only
    /// mutated on acknowledgment.
    async fn await_acks(&mut self, mut remaining: usize) -> Result<(), CinnabarError> {
        while remaining > 0 {
            match parse_push(self.conn.read_frame().await?)? {
                PushEvent::Message(msg) => self.pending.push_back(msg),
                PushEvent::Ack { kind, subject } => {
                    self.apply_ack(kind, subject);
                    remaining -= 1;
                }
            }
        }
        Ok(())
    }

    fn apply_ack(&mut self, kind: AckKind, subject: Bytes) {
        match kind {
            AckKind::Subscribe => {
                self.channels.insert(subject);
            }
            AckKind::Unsubscribe => {
                self.channels.remove(&subject);
            }
            AckKind::PSubscribe => {
                self.patterns.insert(subject);
            }
            AckKind::PUnsubscribe => {
                self.patterns.remove(&subject);
            }
        }
    }

    /// Yields the next pushed message.
    ///
    /// The sequence is potentially infinite; it ends with `Ok(None)` once the
    /// session has been closed. A retriable transport fault triggers a
    /// reconnect followed by a full replay of the subscription state, after
    /// which iteration resumes transparently.
    pub async fn next_message(&mut self) -> Result<Option<PushMessage>, CinnabarError> {
        loop {
            if let Some(msg) = self.pending.pop_front() {
                return Ok(Some(msg));
            }
            if self.conn.is_closed() {
                return Ok(None);
            }

            match self.conn.read_frame().await {
                Ok(frame) => match parse_push(frame)? {
                    PushEvent::Message(msg) => return Ok(Some(msg)),
                    PushEvent::Ack { kind, subject } => self.apply_ack(kind, subject),
                },
                Err(CinnabarError::ConnectionClosed) => return Ok(None),
                Err(e) if e.is_retriable() => {
                    warn!("Subscription link faulted ({e}); reconnecting and replaying");
                    self.conn.reconnect().await?;
                    self.resubscribe_all().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Replays every channel and pattern still in the local state sets onto
    /// the fresh connection.
    async fn resubscribe_all(&mut self) -> Result<(), CinnabarError> {
        let channels: Vec<Bytes> = self.channels.iter().cloned().collect();
        let patterns: Vec<Bytes> = self.patterns.iter().cloned().collect();
        info!(
            "Replaying subscription state: {} channels, {} patterns",
            channels.len(),
            patterns.len()
        );

        if !channels.is_empty() {
            let args: Vec<CommandArg> = channels.iter().map(|c| c.clone().into()).collect();
            self.conn.send_request("SUBSCRIBE", &args).await?;
            self.await_acks(channels.len()).await?;
        }
        if !patterns.is_empty() {
            let args: Vec<CommandArg> = patterns.iter().map(|p| p.clone().into()).collect();
            self.conn.send_request("PSUBSCRIBE", &args).await?;
            self.await_acks(patterns.len()).await?;
        }
        Ok(())
    }

    /// Closes the underlying connection; any pending iterator terminates.
    pub async fn close(&mut self) {
        debug!("Closing subscription session");
        self.conn.close().await;
        self.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }
}

/// Decodes one server-pushed frame: `message`, `pmessage`, or a
/// subscribe/unsubscribe acknowledgment.
fn parse_push(frame: RespFrame) -> Result<PushEvent, CinnabarError> {
    let mut items = frame.into_array()?.into_iter();
    let kind = items
        .next()
        .ok_or_else(|| CinnabarError::InvalidState("empty push frame".to_string()))?
        .into_bytes()?;

    let mut next_bytes = |what: &str| -> Result<Bytes, CinnabarError> {
        items
            .next()
            .ok_or_else(|| CinnabarError::InvalidState(format!("push frame missing {what}")))?
            .into_bytes()
    };

    if kind.eq_ignore_ascii_case(b"message") {
        let channel = next_bytes("channel")?;
        let payload = next_bytes("payload")?;
        Ok(PushEvent::Message(PushMessage {
            pattern: None,
            channel,
            payload,
        }))
    } else if kind.eq_ignore_ascii_case(b"pmessage") {
        let pattern = next_bytes("pattern")?;
        let channel = next_bytes("channel")?;
        let payload = next_bytes("payload")?;
        Ok(PushEvent::Message(PushMessage {
            pattern: Some(pattern),
            channel,
            payload,
        }))
    } else {
        let ack_kind = if kind.eq_ignore_ascii_case(b"subscribe") {
            AckKind::Subscribe
        } else if kind.eq_ignore_ascii_case(b"unsubscribe") {
            AckKind::Unsubscribe
        } else if kind.eq_ignore_ascii_case(b"psubscribe") {
            AckKind::PSubscribe
        } else if kind.eq_ignore_ascii_case(b"punsubscribe") {
            AckKind::PUnsubscribe
        } else {
            return Err(CinnabarError::InvalidState(format!(
                "unexpected push frame kind: {:?}",
                String::from_utf8_lossy(&kind)
            )));
        };
        let subject = next_bytes("subject")?;
        Ok(PushEvent::Ack {
            kind: ack_kind,
            subject,
        })
    }
}

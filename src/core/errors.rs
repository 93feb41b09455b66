// src/core/errors.rs

//! Defines the primary error type for the entire client.

use std::io::ErrorKind;
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the client.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum CinnabarError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// Internal codec signal: the read buffer does not yet hold a complete frame.
    /// Never escapes a public API; the framed reader turns it into "wait for more data".
    #[error("Incomplete frame in stream")]
    IncompleteFrame,

    /// The user has closed this connection; it will never reconnect.
    #[error("Connection has been closed")]
    ConnectionClosed,

    /// AUTH was refused by the server. Terminal: establishment never retries past it.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server answered this command with an error reply (`-ERR ...`).
    /// Scoped to the command that produced it; the connection stays usable.
    #[error("{0}")]
    ErrorReply(String),

    /// The byte stream closed with no frame in progress: the peer vanished
    /// between replies. Retriable like any other transport fault.
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// The byte stream ended in the middle of a frame. A partial reply proves
    /// the command reached the server, so executors must surface this rather
    /// than reconnect and reissue.
    #[error("Stream ended mid-frame")]
    TruncatedFrame,

    /// Protocol violation or reply-shape misuse: unknown frame prefix, missing CRLF
    /// after a bulk payload, or a typed accessor applied to the wrong frame shape.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The subscription session was closed while an iterator was still active.
    #[error("Subscription has been closed")]
    SubscriptionClosed,

    #[error("Value is not an integer or out of range")]
    NotAnInteger,

    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),
}

impl CinnabarError {
    /// Returns `true` for transport faults that are not attributable to a deliberate
    /// close. These are the only conditions under which executors may reconnect and
    /// reissue an in-flight command.
    ///
    /// Decode-level violations (`TruncatedFrame`, `InvalidState`) are deliberately
    /// absent: a stream that dies mid-frame has already delivered part of a reply,
    /// so the command's outcome is partially observed, not unknown.
    pub fn is_retriable(&self) -> bool {
        match self {
            CinnabarError::Io(e) => matches!(
                e.kind(),
                ErrorKind::BrokenPipe
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::NotConnected
                    | ErrorKind::UnexpectedEof
            ),
            CinnabarError::UnexpectedEof => true,
            _ => false,
        }
    }

    /// Returns `true` for transport faults raised by closing an already-closed
    /// socket. `close` and the reconnect probe swallow exactly these.
    pub fn is_already_closed(&self) -> bool {
        match self {
            CinnabarError::Io(e) => {
                matches!(e.kind(), ErrorKind::NotConnected | ErrorKind::BrokenPipe)
            }
            _ => false,
        }
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for CinnabarError {
    fn clone(&self) -> Self {
        match self {
            CinnabarError::Io(e) => CinnabarError::Io(Arc::clone(e)),
            CinnabarError::IncompleteFrame => CinnabarError::IncompleteFrame,
            CinnabarError::ConnectionClosed => CinnabarError::ConnectionClosed,
            CinnabarError::Authentication(s) => CinnabarError::Authentication(s.clone()),
            CinnabarError::ErrorReply(s) => CinnabarError::ErrorReply(s.clone()),
            CinnabarError::UnexpectedEof => CinnabarError::UnexpectedEof,
            CinnabarError::TruncatedFrame => CinnabarError::TruncatedFrame,
            CinnabarError::InvalidState(s) => CinnabarError::InvalidState(s.clone()),
            CinnabarError::SubscriptionClosed => CinnabarError::SubscriptionClosed,
            CinnabarError::NotAnInteger => CinnabarError::NotAnInteger,
            CinnabarError::InvalidUrl(s) => CinnabarError::InvalidUrl(s.clone()),
        }
    }
}

impl PartialEq for CinnabarError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CinnabarError::Io(e1), CinnabarError::Io(e2)) => e1.to_string() == e2.to_string(),
            (CinnabarError::Authentication(s1), CinnabarError::Authentication(s2)) => s1 == s2,
            (CinnabarError::ErrorReply(s1), CinnabarError::ErrorReply(s2)) => s1 == s2,
            (CinnabarError::InvalidState(s1), CinnabarError::InvalidState(s2)) => s1 == s2,
            (CinnabarError::InvalidUrl(s1), CinnabarError::InvalidUrl(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for CinnabarError {
    fn from(e: std::io::Error) -> Self {
        CinnabarError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for CinnabarError {
    fn from(_: std::str::Utf8Error) -> Self {
        CinnabarError::InvalidState("reply is not valid UTF-8".to_string())
    }
}

impl From<std::string::FromUtf8Error> for CinnabarError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        CinnabarError::InvalidState("reply is not valid UTF-8".to_string())
    }
}

impl From<std::num::ParseIntError> for CinnabarError {
    fn from(_: std::num::ParseIntError) -> Self {
        CinnabarError::NotAnInteger
    }
}

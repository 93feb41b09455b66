// src/core/protocol/resp_frame.rs

//! Implements the RESP2 reply frame structure and the corresponding `Encoder`
//! and `Decoder` used on the wire.
//!
//! Decoding is incremental: the parser inspects the buffered bytes and either
//! yields a complete frame (telling the framed reader how much to consume) or
//! signals that more data is needed, leaving the buffer untouched. Trailing
//! unread bytes are preserved across calls.

use crate::core::CinnabarError;
use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// The CRLF (Carriage Return, Line Feed) sequence terminating lines in RESP.
const CRLF: &[u8] = b"\r\n";
const CRLF_LEN: usize = 2;

// Protocol-level limits rejecting malformed or hostile frames.
const MAX_ARRAY_ELEMENTS: usize = 1_024 * 1_024;
const MAX_BULK_LEN: usize = 512 * 1024 * 1024; // 512MB, the server-side cap for a value.

/// A single RESP2 frame as read from or written to the wire.
///
/// Replies form a recursive tagged union: an array may contain any frame,
/// including further arrays. Null bulk (`$-1`) and null array (`*-1`) are
/// distinct from the empty bulk string and the empty array.
#[derive(Debug, Clone, PartialEq)]
pub enum RespFrame {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Null,
    NullArray,
    Array(Vec<RespFrame>),
}

impl RespFrame {
    /// A convenience method to encode a frame into a `Vec<u8>`.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, CinnabarError> {
        let mut buf = BytesMut::new();
        RespFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.to_vec())
    }

    fn type_name(&self) -> &'static str {
        match self {
            RespFrame::SimpleString(_) => "simple string",
            RespFrame::Error(_) => "error",
            RespFrame::Integer(_) => "integer",
            RespFrame::BulkString(_) => "bulk string",
            RespFrame::Null => "null",
            RespFrame::NullArray => "null array",
            RespFrame::Array(_) => "array",
        }
    }

    fn wrong_shape(&self, wanted: &str) -> CinnabarError {
        CinnabarError::InvalidState(format!("expected {wanted}, got {}", self.type_name()))
    }

    /// Turns a server error reply into a typed failure, passing every other
    /// frame through. Single-command paths call this; batched paths keep the
    /// error frame as a per-position value instead.
    pub fn into_result(self) -> Result<RespFrame, CinnabarError> {
        match self {
            RespFrame::Error(msg) => Err(CinnabarError::ErrorReply(msg)),
            other => Ok(other),
        }
    }

    /// Returns `true` for the null bulk string and the null array.
    pub fn is_null(&self) -> bool {
        matches!(self, RespFrame::Null | RespFrame::NullArray)
    }

    // --- Typed accessors. Accessing a frame as the wrong shape is a protocol
    // misuse and fails with `InvalidState`. ---

    /// The frame as text: a simple string, or a bulk string holding UTF-8.
    pub fn into_text(self) -> Result<String, CinnabarError> {
        match self {
            RespFrame::SimpleString(s) => Ok(s),
            RespFrame::BulkString(b) => Ok(String::from_utf8(b.to_vec())?),
            other => Err(other.wrong_shape("text")),
        }
    }

    /// The frame as raw bytes: a bulk string, or a simple string's UTF-8 bytes.
    pub fn into_bytes(self) -> Result<Bytes, CinnabarError> {
        match self {
            RespFrame::BulkString(b) => Ok(b),
            RespFrame::SimpleString(s) => Ok(Bytes::from(s.into_bytes())),
            other => Err(other.wrong_shape("bytes")),
        }
    }

    /// Like [`RespFrame::into_bytes`], but a null bulk decodes to `None`.
    pub fn into_optional_bytes(self) -> Result<Option<Bytes>, CinnabarError> {
        match self {
            RespFrame::Null | RespFrame::NullArray => Ok(None),
            other => other.into_bytes().map(Some),
        }
    }

    /// Like [`RespFrame::into_text`], but a null bulk decodes to `None`.
    pub fn into_optional_text(self) -> Result<Option<String>, CinnabarError> {
        match self {
            RespFrame::Null | RespFrame::NullArray => Ok(None),
            other => other.into_text().map(Some),
        }
    }

    /// The frame as a signed 64-bit integer.
    pub fn as_integer(&self) -> Result<i64, CinnabarError> {
        match self {
            RespFrame::Integer(i) => Ok(*i),
            other => Err(other.wrong_shape("integer")),
        }
    }

    /// The frame as an ordered sequence of child frames.
    pub fn into_array(self) -> Result<Vec<RespFrame>, CinnabarError> {
        match self {
            RespFrame::Array(items) => Ok(items),
            other => Err(other.wrong_shape("array")),
        }
    }

    /// Like [`RespFrame::into_array`], but a null array decodes to `None`.
    pub fn into_optional_array(self) -> Result<Option<Vec<RespFrame>>, CinnabarError> {
        match self {
            RespFrame::NullArray | RespFrame::Null => Ok(None),
            other => other.into_array().map(Some),
        }
    }

    /// Asserts the canonical `+OK` acknowledgment.
    pub fn expect_ok(self) -> Result<(), CinnabarError> {
        match self {
            RespFrame::SimpleString(ref s) if s.eq_ignore_ascii_case("OK") => Ok(()),
            other => Err(other.wrong_shape("+OK")),
        }
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding `RespFrame`s.
#[derive(Debug, Default)]
pub struct RespFrameCodec;

impl Encoder<RespFrame> for RespFrameCodec {
    type Error = CinnabarError;

    fn encode(&mut self, item: RespFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            RespFrame::SimpleString(s) => {
                dst.extend_from_slice(b"+");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Error(s) => {
                dst.extend_from_slice(b"-");
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Integer(i) => {
                dst.extend_from_slice(b":");
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            RespFrame::BulkString(b) => {
                dst.extend_from_slice(b"$");
                dst.extend_from_slice(b.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(&b);
                dst.extend_from_slice(CRLF);
            }
            RespFrame::Null => dst.extend_from_slice(b"$-1\r\n"),
            RespFrame::NullArray => dst.extend_from_slice(b"*-1\r\n"),
            RespFrame::Array(items) => {
                dst.extend_from_slice(b"*");
                dst.extend_from_slice(items.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in items {
                    self.encode(frame, dst)?;
                }
            }
        }
        Ok(())
    }
}

impl Decoder for RespFrameCodec {
    type Item = RespFrame;
    type Error = CinnabarError;

    /// Returns `Ok(None)` while the buffer does not yet contain a full frame,
    /// letting the framed reader pull more bytes from the transport.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_frame(src) {
            Ok((frame, consumed)) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            Err(CinnabarError::IncompleteFrame) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// End-of-stream with a partial frame still buffered is a truncation: a
    /// protocol violation distinct from a clean transport close, and never
    /// retriable since part of the reply was already observed.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(CinnabarError::TruncatedFrame),
        }
    }
}

/// The parsing entry point: peek the leading type byte and dispatch.
/// On success returns the frame together with the number of bytes it occupied.
fn parse_frame(src: &[u8]) -> Result<(RespFrame, usize), CinnabarError> {
    let Some(&prefix) = src.first() else {
        return Err(CinnabarError::IncompleteFrame);
    };
    let body = &src[1..];
    match prefix {
        b'+' => {
            let (line, len) = take_line(body)?;
            let text = String::from_utf8_lossy(line).into_owned();
            Ok((RespFrame::SimpleString(text), len + 1))
        }
        b'-' => {
            let (line, len) = take_line(body)?;
            let text = String::from_utf8_lossy(line).into_owned();
            Ok((RespFrame::Error(text), len + 1))
        }
        b':' => {
            let (line, len) = take_line(body)?;
            Ok((RespFrame::Integer(parse_decimal(line)?), len + 1))
        }
        b'$' => parse_bulk(body).map(|(f, len)| (f, len + 1)),
        b'*' => parse_array(body).map(|(f, len)| (f, len + 1)),
        other => Err(CinnabarError::InvalidState(format!(
            "unknown frame prefix byte 0x{other:02x}"
        ))),
    }
}

/// Scans forward for the next CRLF pair. A stray CR is not a terminator.
fn take_line(src: &[u8]) -> Result<(&[u8], usize), CinnabarError> {
    src.windows(CRLF_LEN)
        .position(|w| w == CRLF)
        .map(|pos| (&src[..pos], pos + CRLF_LEN))
        .ok_or(CinnabarError::IncompleteFrame)
}

fn parse_decimal(line: &[u8]) -> Result<i64, CinnabarError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            CinnabarError::InvalidState(format!(
                "invalid decimal integer: {:?}",
                String::from_utf8_lossy(line)
            ))
        })
}

/// Parses a bulk string: `$<len>\r\n<bytes>\r\n`, or the null bulk `$-1\r\n`.
fn parse_bulk(src: &[u8]) -> Result<(RespFrame, usize), CinnabarError> {
    let (line, header_len) = take_line(src)?;
    let declared = parse_decimal(line)?;

    if declared == -1 {
        return Ok((RespFrame::Null, header_len));
    }
    if declared < 0 || declared as usize > MAX_BULK_LEN {
        return Err(CinnabarError::InvalidState(format!(
            "bulk length {declared} out of range"
        )));
    }

    let payload_len = declared as usize;
    let frame_end = header_len + payload_len + CRLF_LEN;
    if src.len() < frame_end {
        return Err(CinnabarError::IncompleteFrame);
    }

    // A bulk payload must be followed by exactly one CRLF.
    if &src[header_len + payload_len..frame_end] != CRLF {
        return Err(CinnabarError::InvalidState(
            "bulk payload is not terminated by CRLF".to_string(),
        ));
    }

    let payload = Bytes::copy_from_slice(&src[header_len..header_len + payload_len]);
    Ok((RespFrame::BulkString(payload), frame_end))
}

/// Parses an array header and recursively decodes its children.
fn parse_array(src: &[u8]) -> Result<(RespFrame, usize), CinnabarError> {
    let (line, header_len) = take_line(src)?;
    let declared = parse_decimal(line)?;

    if declared == -1 {
        return Ok((RespFrame::NullArray, header_len));
    }
    if declared < 0 || declared as usize > MAX_ARRAY_ELEMENTS {
        return Err(CinnabarError::InvalidState(format!(
            "array length {declared} out of range"
        )));
    }

    let count = declared as usize;
    let mut items = Vec::with_capacity(count);
    let mut cursor = header_len;
    for _ in 0..count {
        let (child, child_len) = parse_frame(&src[cursor..])?;
        items.push(child);
        cursor += child_len;
    }
    Ok((RespFrame::Array(items), cursor))
}

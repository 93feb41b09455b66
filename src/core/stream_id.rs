// src/core/stream_id.rs

//! Stream entry identifiers and decoded stream entries.
//!
//! A stream id is a `(unix-milliseconds, sequence)` pair with the textual form
//! `ms-seq`. Commands additionally accept sentinel forms (`*`, `-`, `+`, `$`,
//! `>`); those are modeled separately so a concrete id is always a valid pair.

use crate::core::{CinnabarError, RespFrame};
use bytes::Bytes;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Identifies one entry in a server-side stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub timestamp_ms: u64,
    pub sequence: u64,
}

impl StreamId {
    pub fn new(timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            timestamp_ms,
            sequence,
        }
    }
}

impl FromStr for StreamId {
    type Err = CinnabarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || CinnabarError::InvalidState(format!("invalid stream id: {s:?}"));
        match s.split_once('-') {
            Some((ms, seq)) => {
                let timestamp_ms = ms.parse().map_err(|_| invalid())?;
                let sequence = seq.parse().map_err(|_| invalid())?;
                Ok(StreamId::new(timestamp_ms, sequence))
            }
            // A bare millisecond value implies sequence 0.
            None => {
                let timestamp_ms = s.parse().map_err(|_| invalid())?;
                Ok(StreamId::new(timestamp_ms, 0))
            }
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.timestamp_ms, self.sequence)
    }
}

/// A stream id argument: either a concrete `(ms, seq)` pair or one of the
/// sentinel forms the server understands in specific argument positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamIdSpec {
    /// `*` — let the server assign the next id (XADD).
    Auto,
    /// `-` — the smallest id a stream can hold (range lower bound).
    Min,
    /// `+` — the largest id a stream can hold (range upper bound).
    Max,
    /// `$` — the current tail of the stream (XREAD).
    Tail,
    /// `>` — entries never delivered to this consumer group (XREADGROUP).
    Unseen,
    /// A concrete identifier.
    Exact(StreamId),
}

impl From<StreamId> for StreamIdSpec {
    fn from(id: StreamId) -> Self {
        StreamIdSpec::Exact(id)
    }
}

impl FromStr for StreamIdSpec {
    type Err = CinnabarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(StreamIdSpec::Auto),
            "-" => Ok(StreamIdSpec::Min),
            "+" => Ok(StreamIdSpec::Max),
            "$" => Ok(StreamIdSpec::Tail),
            ">" => Ok(StreamIdSpec::Unseen),
            other => other.parse::<StreamId>().map(StreamIdSpec::Exact),
        }
    }
}

impl fmt::Display for StreamIdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamIdSpec::Auto => f.write_str("*"),
            StreamIdSpec::Min => f.write_str("-"),
            StreamIdSpec::Max => f.write_str("+"),
            StreamIdSpec::Tail => f.write_str("$"),
            StreamIdSpec::Unseen => f.write_str(">"),
            StreamIdSpec::Exact(id) => write!(f, "{id}"),
        }
    }
}

/// One decoded stream entry: its id and its field/value pairs in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: IndexMap<Bytes, Bytes>,
}

impl StreamEntry {
    /// Decodes one `[id, [field, value, ...]]` reply element.
    pub fn from_frame(frame: RespFrame) -> Result<Self, CinnabarError> {
        let mut parts = frame.into_array()?.into_iter();
        let id_text = parts
            .next()
            .ok_or_else(|| CinnabarError::InvalidState("stream entry missing id".to_string()))?
            .into_text()?;
        let id = id_text.parse::<StreamId>()?;

        let flat = parts
            .next()
            .ok_or_else(|| CinnabarError::InvalidState("stream entry missing fields".to_string()))?
            .into_array()?;
        if flat.len() % 2 != 0 {
            return Err(CinnabarError::InvalidState(
                "stream entry fields are not key/value pairs".to_string(),
            ));
        }

        let mut fields = IndexMap::with_capacity(flat.len() / 2);
        let mut iter = flat.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            fields.insert(k.into_bytes()?, v.into_bytes()?);
        }
        Ok(StreamEntry { id, fields })
    }

    /// Decodes an XRANGE/XREVRANGE-shaped reply: an array of entries.
    pub fn many_from_frame(frame: RespFrame) -> Result<Vec<Self>, CinnabarError> {
        frame
            .into_optional_array()?
            .unwrap_or_default()
            .into_iter()
            .map(Self::from_frame)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_round_trips_through_text() {
        let id: StreamId = "1700000000000-7".parse().unwrap();
        assert_eq!(id, StreamId::new(1_700_000_000_000, 7));
        assert_eq!(id.to_string(), "1700000000000-7");
    }

    #[test]
    fn bare_millisecond_form_implies_sequence_zero() {
        let id: StreamId = "42".parse().unwrap();
        assert_eq!(id, StreamId::new(42, 0));
    }

    #[test]
    fn sentinel_forms_round_trip() {
        for text in ["*", "-", "+", "$", ">"] {
            let spec: StreamIdSpec = text.parse().unwrap();
            assert_eq!(spec.to_string(), text);
        }
        let exact: StreamIdSpec = "5-1".parse().unwrap();
        assert_eq!(exact, StreamIdSpec::Exact(StreamId::new(5, 1)));
        assert_eq!(exact.to_string(), "5-1");
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!("abc".parse::<StreamId>().is_err());
        assert!("1-2-3".parse::<StreamId>().is_err());
        assert!("1-x".parse::<StreamId>().is_err());
    }
}

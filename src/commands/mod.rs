// src/commands/mod.rs

//! The typed command surface.
//!
//! Each family lives in its own file as an extension trait over
//! [`CommandExecutor`](crate::executor::CommandExecutor), blanket-implemented
//! so the same wrappers run against the multiplexer or queue into a pipeline.
//! Wrappers are mechanical: typed call → command name + arguments → reply
//! decoded through the frame accessors.

pub mod connection;
pub mod generic;
pub mod hashes;
pub mod lists;
pub mod pubsub;
pub mod scan;
pub mod sets;
pub mod sorted_sets;
pub mod streams;
pub mod strings;

pub use connection::ConnectionCommands;
pub use generic::KeyCommands;
pub use hashes::HashCommands;
pub use lists::ListCommands;
pub use pubsub::PubSubCommands;
pub use scan::ScanCommands;
pub use sets::SetCommands;
pub use sorted_sets::SortedSetCommands;
pub use streams::StreamCommands;
pub use strings::StringCommands;

pub(crate) mod decode {
    //! Reply-shape helpers shared by the command wrappers.

    use crate::core::{CinnabarError, RespFrame};
    use bytes::Bytes;

    /// An array of bulk strings (KEYS, SMEMBERS, LRANGE, ...).
    pub fn bytes_items(frame: RespFrame) -> Result<Vec<Bytes>, CinnabarError> {
        frame
            .into_optional_array()?
            .unwrap_or_default()
            .into_iter()
            .map(RespFrame::into_bytes)
            .collect()
    }

    /// An array whose elements may individually be null (MGET).
    pub fn optional_bytes_items(frame: RespFrame) -> Result<Vec<Option<Bytes>>, CinnabarError> {
        frame
            .into_optional_array()?
            .unwrap_or_default()
            .into_iter()
            .map(RespFrame::into_optional_bytes)
            .collect()
    }

    /// A flat field/value array folded into pairs (HGETALL, CONFIG GET, ...).
    pub fn pairs(frame: RespFrame) -> Result<Vec<(Bytes, Bytes)>, CinnabarError> {
        let flat = frame.into_optional_array()?.unwrap_or_default();
        if flat.len() % 2 != 0 {
            return Err(CinnabarError::InvalidState(
                "reply is not a flat list of pairs".to_string(),
            ));
        }
        let mut out = Vec::with_capacity(flat.len() / 2);
        let mut iter = flat.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            out.push((k.into_bytes()?, v.into_bytes()?));
        }
        Ok(out)
    }

    /// An integer, or null (ZRANK and friends).
    pub fn optional_integer(frame: RespFrame) -> Result<Option<i64>, CinnabarError> {
        match frame {
            RespFrame::Null | RespFrame::NullArray => Ok(None),
            other => other.as_integer().map(Some),
        }
    }

    /// A score reply: bulk text holding a float.
    pub fn float(frame: RespFrame) -> Result<f64, CinnabarError> {
        let text = frame.into_text()?;
        parse_float(&text)
    }

    /// A score reply that may be null.
    pub fn optional_float(frame: RespFrame) -> Result<Option<f64>, CinnabarError> {
        match frame {
            RespFrame::Null | RespFrame::NullArray => Ok(None),
            other => float(other).map(Some),
        }
    }

    pub fn parse_float(text: &str) -> Result<f64, CinnabarError> {
        match text {
            "inf" | "+inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => other.parse::<f64>().map_err(|_| {
                CinnabarError::InvalidState(format!("reply is not a float: {other:?}"))
            }),
        }
    }

    /// Formats a score the way the server parses one, including the infinite
    /// range bounds.
    pub fn format_float(value: f64) -> String {
        if value == f64::INFINITY {
            "+inf".to_string()
        } else if value == f64::NEG_INFINITY {
            "-inf".to_string()
        } else {
            value.to_string()
        }
    }
}

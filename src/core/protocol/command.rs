// src/core/protocol/command.rs

//! Request-side framing: a command and its arguments become one RESP2 array of
//! bulk strings, assembled into a single buffer so the transport sees exactly
//! one write per request.

use bytes::{BufMut, Bytes, BytesMut};

/// A single command argument.
///
/// Text is sent as its UTF-8 bytes, integers as their decimal text form, and
/// blobs pass through verbatim. Optional command suffixes are expressed by
/// pushing arguments conditionally; absent values are simply never framed.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    Text(String),
    Int(i64),
    Blob(Bytes),
}

impl CommandArg {
    /// The argument's wire bytes.
    pub fn as_bytes(&self) -> Bytes {
        match self {
            CommandArg::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            CommandArg::Int(i) => Bytes::from(i.to_string().into_bytes()),
            CommandArg::Blob(b) => b.clone(),
        }
    }
}

impl From<&str> for CommandArg {
    fn from(s: &str) -> Self {
        CommandArg::Text(s.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(s: String) -> Self {
        CommandArg::Text(s)
    }
}

impl From<i64> for CommandArg {
    fn from(i: i64) -> Self {
        CommandArg::Int(i)
    }
}

impl From<u64> for CommandArg {
    fn from(i: u64) -> Self {
        CommandArg::Int(i as i64)
    }
}

impl From<usize> for CommandArg {
    fn from(i: usize) -> Self {
        CommandArg::Int(i as i64)
    }
}

impl From<Bytes> for CommandArg {
    fn from(b: Bytes) -> Self {
        CommandArg::Blob(b)
    }
}

impl From<Vec<u8>> for CommandArg {
    fn from(b: Vec<u8>) -> Self {
        CommandArg::Blob(Bytes::from(b))
    }
}

impl From<&[u8]> for CommandArg {
    fn from(b: &[u8]) -> Self {
        CommandArg::Blob(Bytes::copy_from_slice(b))
    }
}

/// Appends `value` to `args` when present. Keeping the filtering here, before
/// any length prefix is computed, means an absent optional argument leaves no
/// trace in the frame.
pub fn push_optional<T: Into<CommandArg>>(args: &mut Vec<CommandArg>, value: Option<T>) {
    if let Some(value) = value {
        args.push(value.into());
    }
}

/// Encodes `command` and `args` as a RESP2 request frame into `dst`:
/// `*<1+n>\r\n` followed by one length-prefixed bulk string per element.
pub fn encode_command(dst: &mut BytesMut, command: &str, args: &[CommandArg]) {
    dst.reserve(16 + command.len() + args.len() * 16);
    put_header(dst, b'*', (1 + args.len()) as i64);
    put_bulk(dst, command.as_bytes());
    for arg in args {
        match arg {
            CommandArg::Text(s) => put_bulk(dst, s.as_bytes()),
            CommandArg::Int(i) => put_bulk(dst, i.to_string().as_bytes()),
            CommandArg::Blob(b) => put_bulk(dst, b),
        }
    }
}

fn put_header(dst: &mut BytesMut, prefix: u8, value: i64) {
    dst.put_u8(prefix);
    dst.extend_from_slice(value.to_string().as_bytes());
    dst.extend_from_slice(b"\r\n");
}

fn put_bulk(dst: &mut BytesMut, payload: &[u8]) {
    put_header(dst, b'$', payload.len() as i64);
    dst.extend_from_slice(payload);
    dst.extend_from_slice(b"\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_command_with_mixed_args() {
        let mut buf = BytesMut::new();
        let args = vec![
            CommandArg::from("key"),
            CommandArg::from(42i64),
            CommandArg::from(&b"\x01\x02"[..]),
        ];
        encode_command(&mut buf, "SET", &args);
        assert_eq!(
            &buf[..],
            b"*4\r\n$3\r\nSET\r\n$3\r\nkey\r\n$2\r\n42\r\n$2\r\n\x01\x02\r\n"
        );
    }

    #[test]
    fn encodes_negative_integers_as_decimal_text() {
        let mut buf = BytesMut::new();
        encode_command(&mut buf, "INCRBY", &[CommandArg::from("k"), CommandArg::Int(-7)]);
        assert_eq!(&buf[..], b"*3\r\n$6\r\nINCRBY\r\n$1\r\nk\r\n$2\r\n-7\r\n");
    }

    #[test]
    fn absent_optional_args_leave_no_trace() {
        let mut args: Vec<CommandArg> = vec![CommandArg::from("k")];
        push_optional(&mut args, None::<i64>);
        push_optional(&mut args, Some(10i64));
        let mut buf = BytesMut::new();
        encode_command(&mut buf, "GET", &args);
        assert_eq!(&buf[..], b"*3\r\n$3\r\nGET\r\n$1\r\nk\r\n$2\r\n10\r\n");
    }

    #[test]
    fn command_with_no_args_is_a_one_element_array() {
        let mut buf = BytesMut::new();
        encode_command(&mut buf, "PING", &[]);
        assert_eq!(&buf[..], b"*1\r\n$4\r\nPING\r\n");
    }
}

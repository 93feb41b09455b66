// src/core/protocol/mod.rs

//! The RESP2 wire protocol: reply frames with their codec, and request framing.

pub mod command;
pub mod resp_frame;

pub use command::{CommandArg, encode_command, push_optional};
pub use resp_frame::{RespFrame, RespFrameCodec};

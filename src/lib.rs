// src/lib.rs

//! # cinnabar
//!
//! An asynchronous RESP2 client for Redis-compatible servers, built on tokio.
//!
//! Three interchangeable execution strategies share one connection type:
//!
//! - [`Multiplexer`] — serialized ad-hoc commands over a shared connection,
//!   with automatic reissue across reconnection for retriable faults.
//! - [`Pipeline`] — deferred batch submission in one round trip, optionally
//!   framed as a MULTI/EXEC transaction.
//! - [`Subscriber`] — a dedicated pub/sub session that replays its
//!   subscription state after a reconnect.
//!
//! The typed command surface is written once against [`CommandExecutor`], so
//! the same wrappers run against a multiplexer or queue into a pipeline:
//!
//! ```ignore
//! use cinnabar::{ConnectionConfig, Multiplexer, StringCommands};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cinnabar::CinnabarError> {
//!     let mux = Multiplexer::connect(ConnectionConfig::new("127.0.0.1", 6379)).await?;
//!     mux.set("greeting", "hello").await?;
//!     assert_eq!(mux.get_text("greeting").await?.as_deref(), Some("hello"));
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod connection;
pub mod core;
pub mod executor;
pub mod pubsub;

// Re-export
pub use crate::commands::{
    ConnectionCommands, HashCommands, KeyCommands, ListCommands, PubSubCommands, ScanCommands,
    SetCommands, SortedSetCommands, StreamCommands, StringCommands,
};
pub use crate::config::{BackoffPolicy, ConnectionConfig};
pub use crate::connection::Connection;
pub use crate::core::errors::CinnabarError;
pub use crate::core::protocol::{CommandArg, RespFrame};
pub use crate::core::stream_id::{StreamEntry, StreamId, StreamIdSpec};
pub use crate::executor::{CommandExecutor, Multiplexer, Pipeline};
pub use crate::pubsub::{PushMessage, Subscriber};

// src/executor/mod.rs

//! Execution strategies over a single connection.
//!
//! Two interchangeable executors implement the same submission seam: the
//! [`Multiplexer`] serializes concurrent ad-hoc commands over one shared
//! connection, and the [`Pipeline`] defers commands for a single batched
//! round trip. The entire typed command surface is written once against
//! [`CommandExecutor`] and works with either.

pub mod multiplexer;
pub mod pipeline;

pub use multiplexer::Multiplexer;
pub use pipeline::Pipeline;

use crate::core::protocol::{CommandArg, RespFrame};
use crate::core::CinnabarError;
use async_trait::async_trait;

/// The submission contract shared by every execution strategy.
///
/// An implementation translates `(command, args)` into wire frames and
/// produces one reply frame per submission. What "produces" means is
/// strategy-specific: the multiplexer resolves with the server's actual
/// reply, while the pipeline records the command and resolves immediately
/// with a sentinel acknowledgment.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(
        &self,
        command: &str,
        args: Vec<CommandArg>,
    ) -> Result<RespFrame, CinnabarError>;
}

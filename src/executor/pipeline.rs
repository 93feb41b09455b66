// src/executor/pipeline.rs

//! The deferred executor: commands accumulate locally and go to the server as
//! one batch, optionally bracketed by MULTI/EXEC.

use crate::connection::Connection;
use crate::core::CinnabarError;
use crate::core::protocol::{CommandArg, RespFrame};
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Accumulates commands and flushes them as a single batch over a borrowed
/// connection, collecting one reply-or-error value per command in submission
/// order.
///
/// The pipeline implements [`CommandExecutor`], so the typed command surface
/// can queue into it; each such submission resolves immediately with a
/// sentinel `+OK`, and the real replies arrive from [`Pipeline::flush`].
#[derive(Debug, Default)]
pub struct Pipeline {
    queued: Mutex<Vec<(String, Vec<CommandArg>)>>,
    transactional: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline whose flush is framed as `MULTI … EXEC`, executing the
    /// whole batch atomically on the server.
    pub fn transactional() -> Self {
        Self {
            queued: Mutex::new(Vec::new()),
            transactional: true,
        }
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Appends one command to the batch.
    pub fn queue(&self, command: impl Into<String>, args: Vec<CommandArg>) {
        self.queued.lock().push((command.into(), args));
    }

    pub fn len(&self) -> usize {
        self.queued.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.lock().is_empty()
    }

    /// Snapshots and clears the queue, then submits the batch over `conn`.
    ///
    /// The returned vector matches the raw frame exchange: per-command server
    /// errors are `Err` values at their position, never thrown. In
    /// transactional mode the vector covers `MULTI`, each `QUEUED` ack, and
    /// the final `EXEC` reply. A transport fault propagates; the queue is
    /// already cleared, so the pipeline is reusable afterwards either way.
    pub async fn flush(
        &self,
        conn: &mut Connection,
    ) -> Result<Vec<Result<RespFrame, CinnabarError>>, CinnabarError> {
        let batch = std::mem::take(&mut *self.queued.lock());
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let batch = if self.transactional {
            let mut framed = Vec::with_capacity(batch.len() + 2);
            framed.push(("MULTI".to_string(), Vec::new()));
            framed.extend(batch);
            framed.push(("EXEC".to_string(), Vec::new()));
            framed
        } else {
            batch
        };

        conn.send_commands(&batch).await
    }

    /// Flushes a transactional pipeline and surfaces the `EXEC` reply as the
    /// user-visible result list: one reply per queued command.
    ///
    /// Returns `Ok(None)` when the server discarded the transaction (a null
    /// `EXEC` reply, e.g. after a failed WATCH). A rejected queued command
    /// surfaces as the server's `EXECABORT` error reply.
    pub async fn flush_transaction(
        &self,
        conn: &mut Connection,
    ) -> Result<Option<Vec<RespFrame>>, CinnabarError> {
        debug_assert!(self.transactional, "flush_transaction on a plain pipeline");
        let mut raw = self.flush(conn).await?;
        let Some(exec_reply) = raw.pop() else {
            return Ok(Some(Vec::new()));
        };
        exec_reply?.into_optional_array()
    }
}

#[async_trait]
impl CommandExecutor for Pipeline {
    /// Records the command and resolves at once with the sentinel `+OK`; the
    /// actual reply is delivered positionally by the next flush.
    async fn execute(
        &self,
        command: &str,
        args: Vec<CommandArg>,
    ) -> Result<RespFrame, CinnabarError> {
        self.queue(command, args);
        Ok(RespFrame::SimpleString("OK".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submissions_resolve_with_the_sentinel() {
        let pipeline = Pipeline::new();
        let reply = pipeline
            .execute("SET", vec!["k".into(), "v".into()])
            .await
            .unwrap();
        assert_eq!(reply, RespFrame::SimpleString("OK".to_string()));
        assert_eq!(pipeline.len(), 1);
    }

    #[tokio::test]
    async fn queue_preserves_submission_order() {
        let pipeline = Pipeline::new();
        pipeline.queue("SET", vec!["a".into(), "1".into()]);
        pipeline.queue("GET", vec!["a".into()]);
        let queued = pipeline.queued.lock();
        assert_eq!(queued[0].0, "SET");
        assert_eq!(queued[1].0, "GET");
    }
}

// src/commands/pubsub.rs

//! Publish-side commands. Subscribing happens on a dedicated
//! [`Subscriber`](crate::pubsub::Subscriber) session, never on an executor.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait PubSubCommands: CommandExecutor {
    /// PUBLISH channel message; returns the number of receiving subscribers.
    async fn publish<V: Into<CommandArg> + Send>(
        &self,
        channel: &str,
        message: V,
    ) -> Result<i64, CinnabarError> {
        self.execute("PUBLISH", vec![channel.into(), message.into()])
            .await?
            .as_integer()
    }

    /// PUBSUB CHANNELS [pattern].
    async fn pubsub_channels(&self, pattern: Option<&str>) -> Result<Vec<Bytes>, CinnabarError> {
        let mut args = vec![CommandArg::from("CHANNELS")];
        if let Some(pattern) = pattern {
            args.push(pattern.into());
        }
        decode::bytes_items(self.execute("PUBSUB", args).await?)
    }

    /// PUBSUB NUMSUB [channel ...] as `(channel, subscriber count)` pairs.
    async fn pubsub_numsub(&self, channels: &[&str]) -> Result<Vec<(Bytes, i64)>, CinnabarError> {
        let mut args = Vec::with_capacity(1 + channels.len());
        args.push(CommandArg::from("NUMSUB"));
        args.extend(channels.iter().map(|c| CommandArg::from(*c)));
        let flat = self.execute("PUBSUB", args).await?.into_array()?;
        if flat.len() % 2 != 0 {
            return Err(CinnabarError::InvalidState(
                "NUMSUB reply is not a flat list of pairs".to_string(),
            ));
        }
        let mut out = Vec::with_capacity(flat.len() / 2);
        let mut iter = flat.into_iter();
        while let (Some(channel), Some(count)) = (iter.next(), iter.next()) {
            out.push((channel.into_bytes()?, count.as_integer()?));
        }
        Ok(out)
    }
}

impl<T: CommandExecutor> PubSubCommands for T {}

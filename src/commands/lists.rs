// src/commands/lists.rs

//! List commands.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait ListCommands: CommandExecutor {
    /// LPUSH key value [value ...]; returns the resulting list length.
    async fn lpush(&self, key: &str, values: &[&str]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + values.len());
        args.push(CommandArg::from(key));
        args.extend(values.iter().map(|v| CommandArg::from(*v)));
        self.execute("LPUSH", args).await?.as_integer()
    }

    /// RPUSH key value [value ...]; returns the resulting list length.
    async fn rpush(&self, key: &str, values: &[&str]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + values.len());
        args.push(CommandArg::from(key));
        args.extend(values.iter().map(|v| CommandArg::from(*v)));
        self.execute("RPUSH", args).await?.as_integer()
    }

    /// LPOP key.
    async fn lpop(&self, key: &str) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("LPOP", vec![key.into()])
            .await?
            .into_optional_bytes()
    }

    /// RPOP key.
    async fn rpop(&self, key: &str) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("RPOP", vec![key.into()])
            .await?
            .into_optional_bytes()
    }

    /// LLEN key.
    async fn llen(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("LLEN", vec![key.into()]).await?.as_integer()
    }

    /// LRANGE key start stop.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, CinnabarError> {
        decode::bytes_items(
            self.execute("LRANGE", vec![key.into(), start.into(), stop.into()])
                .await?,
        )
    }

    /// LINDEX key index.
    async fn lindex(&self, key: &str, index: i64) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("LINDEX", vec![key.into(), index.into()])
            .await?
            .into_optional_bytes()
    }

    /// LSET key index value.
    async fn lset<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        index: i64,
        value: V,
    ) -> Result<(), CinnabarError> {
        self.execute("LSET", vec![key.into(), index.into(), value.into()])
            .await?
            .expect_ok()
    }

    /// LTRIM key start stop.
    async fn ltrim(&self, key: &str, start: i64, stop: i64) -> Result<(), CinnabarError> {
        self.execute("LTRIM", vec![key.into(), start.into(), stop.into()])
            .await?
            .expect_ok()
    }

    /// LREM key count value; returns the number of removed elements.
    async fn lrem<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        count: i64,
        value: V,
    ) -> Result<i64, CinnabarError> {
        self.execute("LREM", vec![key.into(), count.into(), value.into()])
            .await?
            .as_integer()
    }
}

impl<T: CommandExecutor> ListCommands for T {}

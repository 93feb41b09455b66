// src/commands/sets.rs

//! Set commands.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

fn key_and_members(key: &str, members: &[&str]) -> Vec<CommandArg> {
    let mut args = Vec::with_capacity(1 + members.len());
    args.push(CommandArg::from(key));
    args.extend(members.iter().map(|m| CommandArg::from(*m)));
    args
}

#[async_trait]
pub trait SetCommands: CommandExecutor {
    /// SADD key member [member ...]; returns the number of new members.
    async fn sadd(&self, key: &str, members: &[&str]) -> Result<i64, CinnabarError> {
        self.execute("SADD", key_and_members(key, members))
            .await?
            .as_integer()
    }

    /// SREM key member [member ...]; returns the number removed.
    async fn srem(&self, key: &str, members: &[&str]) -> Result<i64, CinnabarError> {
        self.execute("SREM", key_and_members(key, members))
            .await?
            .as_integer()
    }

    /// SMEMBERS key.
    async fn smembers(&self, key: &str) -> Result<Vec<Bytes>, CinnabarError> {
        decode::bytes_items(self.execute("SMEMBERS", vec![key.into()]).await?)
    }

    /// SISMEMBER key member.
    async fn sismember(&self, key: &str, member: &str) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("SISMEMBER", vec![key.into(), member.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// SCARD key.
    async fn scard(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("SCARD", vec![key.into()]).await?.as_integer()
    }

    /// SPOP key.
    async fn spop(&self, key: &str) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("SPOP", vec![key.into()])
            .await?
            .into_optional_bytes()
    }

    /// SMOVE source destination member; `true` when the member moved.
    async fn smove(&self, source: &str, destination: &str, member: &str) -> Result<bool, CinnabarError> {
        Ok(self
            .execute(
                "SMOVE",
                vec![source.into(), destination.into(), member.into()],
            )
            .await?
            .as_integer()?
            != 0)
    }

    /// SINTER key [key ...].
    async fn sinter(&self, keys: &[&str]) -> Result<Vec<Bytes>, CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        decode::bytes_items(self.execute("SINTER", args).await?)
    }

    /// SUNION key [key ...].
    async fn sunion(&self, keys: &[&str]) -> Result<Vec<Bytes>, CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        decode::bytes_items(self.execute("SUNION", args).await?)
    }

    /// SDIFF key [key ...].
    async fn sdiff(&self, keys: &[&str]) -> Result<Vec<Bytes>, CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        decode::bytes_items(self.execute("SDIFF", args).await?)
    }
}

impl<T: CommandExecutor> SetCommands for T {}

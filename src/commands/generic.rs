// src/commands/generic.rs

//! Generic keyspace commands, plus WATCH/UNWATCH for optimistic transactions.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait KeyCommands: CommandExecutor {
    /// DEL key [key ...]; returns the number of keys removed.
    async fn del(&self, keys: &[&str]) -> Result<i64, CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        self.execute("DEL", args).await?.as_integer()
    }

    /// EXISTS key [key ...]; returns how many of them exist.
    async fn exists(&self, keys: &[&str]) -> Result<i64, CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        self.execute("EXISTS", args).await?.as_integer()
    }

    /// EXPIRE key seconds; `true` when a timeout was set.
    async fn expire(&self, key: &str, seconds: i64) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("EXPIRE", vec![key.into(), seconds.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// PEXPIRE key milliseconds.
    async fn pexpire(&self, key: &str, millis: i64) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("PEXPIRE", vec![key.into(), millis.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// TTL key in seconds; -1 without expiry, -2 when missing.
    async fn ttl(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("TTL", vec![key.into()]).await?.as_integer()
    }

    /// PTTL key in milliseconds.
    async fn pttl(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("PTTL", vec![key.into()]).await?.as_integer()
    }

    /// PERSIST key; `true` when an expiry was removed.
    async fn persist(&self, key: &str) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("PERSIST", vec![key.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// TYPE key.
    async fn key_type(&self, key: &str) -> Result<String, CinnabarError> {
        self.execute("TYPE", vec![key.into()]).await?.into_text()
    }

    /// KEYS pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<Bytes>, CinnabarError> {
        decode::bytes_items(self.execute("KEYS", vec![pattern.into()]).await?)
    }

    /// RENAME key newkey.
    async fn rename(&self, key: &str, new_key: &str) -> Result<(), CinnabarError> {
        self.execute("RENAME", vec![key.into(), new_key.into()])
            .await?
            .expect_ok()
    }

    /// RENAMENX key newkey; `true` when the target did not already exist.
    async fn rename_nx(&self, key: &str, new_key: &str) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("RENAMENX", vec![key.into(), new_key.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// WATCH key [key ...] for the next transaction on this connection.
    async fn watch(&self, keys: &[&str]) -> Result<(), CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        self.execute("WATCH", args).await?.expect_ok()
    }

    /// UNWATCH all previously watched keys.
    async fn unwatch(&self) -> Result<(), CinnabarError> {
        self.execute("UNWATCH", vec![]).await?.expect_ok()
    }
}

impl<T: CommandExecutor> KeyCommands for T {}

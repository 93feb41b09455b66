// src/commands/strings.rs

//! String commands.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait StringCommands: CommandExecutor {
    /// SET key value.
    async fn set<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        value: V,
    ) -> Result<(), CinnabarError> {
        self.execute("SET", vec![key.into(), value.into()])
            .await?
            .expect_ok()
    }

    /// SET key value EX seconds.
    async fn set_ex<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        value: V,
        seconds: u64,
    ) -> Result<(), CinnabarError> {
        self.execute(
            "SET",
            vec![key.into(), value.into(), "EX".into(), seconds.into()],
        )
        .await?
        .expect_ok()
    }

    /// SETNX key value; `true` when the key was set.
    async fn set_nx<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        value: V,
    ) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("SETNX", vec![key.into(), value.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// GET key; `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("GET", vec![key.into()])
            .await?
            .into_optional_bytes()
    }

    /// GET key decoded as UTF-8 text.
    async fn get_text(&self, key: &str) -> Result<Option<String>, CinnabarError> {
        self.execute("GET", vec![key.into()])
            .await?
            .into_optional_text()
    }

    /// GETDEL key.
    async fn getdel(&self, key: &str) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("GETDEL", vec![key.into()])
            .await?
            .into_optional_bytes()
    }

    /// GETRANGE key start end.
    async fn getrange(&self, key: &str, start: i64, end: i64) -> Result<Bytes, CinnabarError> {
        self.execute("GETRANGE", vec![key.into(), start.into(), end.into()])
            .await?
            .into_bytes()
    }

    /// SETRANGE key offset value; returns the resulting length.
    async fn setrange<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        offset: u64,
        value: V,
    ) -> Result<i64, CinnabarError> {
        self.execute("SETRANGE", vec![key.into(), offset.into(), value.into()])
            .await?
            .as_integer()
    }

    /// APPEND key value; returns the resulting length.
    async fn append<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        value: V,
    ) -> Result<i64, CinnabarError> {
        self.execute("APPEND", vec![key.into(), value.into()])
            .await?
            .as_integer()
    }

    /// STRLEN key.
    async fn strlen(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("STRLEN", vec![key.into()]).await?.as_integer()
    }

    /// INCR key.
    async fn incr(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("INCR", vec![key.into()]).await?.as_integer()
    }

    /// INCRBY key delta.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, CinnabarError> {
        self.execute("INCRBY", vec![key.into(), delta.into()])
            .await?
            .as_integer()
    }

    /// DECR key.
    async fn decr(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("DECR", vec![key.into()]).await?.as_integer()
    }

    /// DECRBY key delta.
    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64, CinnabarError> {
        self.execute("DECRBY", vec![key.into(), delta.into()])
            .await?
            .as_integer()
    }

    /// MGET key [key ...]; positions for missing keys hold `None`.
    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Bytes>>, CinnabarError> {
        let args = keys.iter().map(|k| CommandArg::from(*k)).collect();
        decode::optional_bytes_items(self.execute("MGET", args).await?)
    }

    /// MSET key value [key value ...].
    async fn mset(&self, pairs: &[(&str, &str)]) -> Result<(), CinnabarError> {
        let mut args = Vec::with_capacity(pairs.len() * 2);
        for (key, value) in pairs {
            args.push(CommandArg::from(*key));
            args.push(CommandArg::from(*value));
        }
        self.execute("MSET", args).await?.expect_ok()
    }
}

impl<T: CommandExecutor> StringCommands for T {}

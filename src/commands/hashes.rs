// src/commands/hashes.rs

//! Hash commands.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait HashCommands: CommandExecutor {
    /// HSET key field value [field value ...]; returns the number of new fields.
    async fn hset(&self, key: &str, pairs: &[(&str, &str)]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + pairs.len() * 2);
        args.push(CommandArg::from(key));
        for (field, value) in pairs {
            args.push(CommandArg::from(*field));
            args.push(CommandArg::from(*value));
        }
        self.execute("HSET", args).await?.as_integer()
    }

    /// HSETNX key field value; `true` when the field was created.
    async fn hset_nx<V: Into<CommandArg> + Send>(
        &self,
        key: &str,
        field: &str,
        value: V,
    ) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("HSETNX", vec![key.into(), field.into(), value.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// HGET key field.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<Bytes>, CinnabarError> {
        self.execute("HGET", vec![key.into(), field.into()])
            .await?
            .into_optional_bytes()
    }

    /// HDEL key field [field ...]; returns the number of fields removed.
    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + fields.len());
        args.push(CommandArg::from(key));
        args.extend(fields.iter().map(|f| CommandArg::from(*f)));
        self.execute("HDEL", args).await?.as_integer()
    }

    /// HGETALL key as field/value pairs in server order.
    async fn hgetall(&self, key: &str) -> Result<Vec<(Bytes, Bytes)>, CinnabarError> {
        decode::pairs(self.execute("HGETALL", vec![key.into()]).await?)
    }

    /// HKEYS key.
    async fn hkeys(&self, key: &str) -> Result<Vec<Bytes>, CinnabarError> {
        decode::bytes_items(self.execute("HKEYS", vec![key.into()]).await?)
    }

    /// HVALS key.
    async fn hvals(&self, key: &str) -> Result<Vec<Bytes>, CinnabarError> {
        decode::bytes_items(self.execute("HVALS", vec![key.into()]).await?)
    }

    /// HLEN key.
    async fn hlen(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("HLEN", vec![key.into()]).await?.as_integer()
    }

    /// HEXISTS key field.
    async fn hexists(&self, key: &str, field: &str) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("HEXISTS", vec![key.into(), field.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// HINCRBY key field delta.
    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, CinnabarError> {
        self.execute("HINCRBY", vec![key.into(), field.into(), delta.into()])
            .await?
            .as_integer()
    }
}

impl<T: CommandExecutor> HashCommands for T {}

// src/commands/sorted_sets.rs

//! Sorted-set commands.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait SortedSetCommands: CommandExecutor {
    /// ZADD key score member [score member ...]; returns the number of new members.
    async fn zadd(&self, key: &str, entries: &[(f64, &str)]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + entries.len() * 2);
        args.push(CommandArg::from(key));
        for (score, member) in entries {
            args.push(CommandArg::from(decode::format_float(*score)));
            args.push(CommandArg::from(*member));
        }
        self.execute("ZADD", args).await?.as_integer()
    }

    /// ZREM key member [member ...]; returns the number removed.
    async fn zrem(&self, key: &str, members: &[&str]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + members.len());
        args.push(CommandArg::from(key));
        args.extend(members.iter().map(|m| CommandArg::from(*m)));
        self.execute("ZREM", args).await?.as_integer()
    }

    /// ZSCORE key member.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, CinnabarError> {
        decode::optional_float(
            self.execute("ZSCORE", vec![key.into(), member.into()])
                .await?,
        )
    }

    /// ZCARD key.
    async fn zcard(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("ZCARD", vec![key.into()]).await?.as_integer()
    }

    /// ZINCRBY key delta member; returns the new score.
    async fn zincr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64, CinnabarError> {
        decode::float(
            self.execute(
                "ZINCRBY",
                vec![
                    key.into(),
                    decode::format_float(delta).into(),
                    member.into(),
                ],
            )
            .await?,
        )
    }

    /// ZRANGE key start stop by rank.
    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, CinnabarError> {
        decode::bytes_items(
            self.execute("ZRANGE", vec![key.into(), start.into(), stop.into()])
                .await?,
        )
    }

    /// ZRANGE key start stop WITHSCORES as `(member, score)` pairs.
    async fn zrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Bytes, f64)>, CinnabarError> {
        let frame = self
            .execute(
                "ZRANGE",
                vec![key.into(), start.into(), stop.into(), "WITHSCORES".into()],
            )
            .await?;
        decode::pairs(frame)?
            .into_iter()
            .map(|(member, score)| {
                let score = decode::parse_float(std::str::from_utf8(&score)?)?;
                Ok((member, score))
            })
            .collect()
    }

    /// ZRANK key member.
    async fn zrank(&self, key: &str, member: &str) -> Result<Option<i64>, CinnabarError> {
        decode::optional_integer(
            self.execute("ZRANK", vec![key.into(), member.into()])
                .await?,
        )
    }

    /// ZCOUNT key min max over scores.
    async fn zcount(&self, key: &str, min: f64, max: f64) -> Result<i64, CinnabarError> {
        self.execute(
            "ZCOUNT",
            vec![
                key.into(),
                decode::format_float(min).into(),
                decode::format_float(max).into(),
            ],
        )
        .await?
        .as_integer()
    }
}

impl<T: CommandExecutor> SortedSetCommands for T {}

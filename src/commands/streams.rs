// src/commands/streams.rs

//! Stream commands.
//!
//! Blocking variants (BLOCK) are deliberately absent: they would pin the
//! shared multiplexed connection for the duration of the block.

use crate::core::CinnabarError;
use crate::core::protocol::{CommandArg, RespFrame, push_optional};
use crate::core::stream_id::{StreamEntry, StreamId, StreamIdSpec};
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait StreamCommands: CommandExecutor {
    /// XADD key id field value [field value ...]; returns the entry's id as
    /// assigned by the server (pass [`StreamIdSpec::Auto`] for `*`).
    async fn xadd(
        &self,
        key: &str,
        id: StreamIdSpec,
        fields: &[(&str, &str)],
    ) -> Result<StreamId, CinnabarError> {
        let mut args = Vec::with_capacity(2 + fields.len() * 2);
        args.push(CommandArg::from(key));
        args.push(CommandArg::from(id.to_string()));
        for (field, value) in fields {
            args.push(CommandArg::from(*field));
            args.push(CommandArg::from(*value));
        }
        self.execute("XADD", args).await?.into_text()?.parse()
    }

    /// XLEN key.
    async fn xlen(&self, key: &str) -> Result<i64, CinnabarError> {
        self.execute("XLEN", vec![key.into()]).await?.as_integer()
    }

    /// XRANGE key start end.
    async fn xrange(
        &self,
        key: &str,
        start: StreamIdSpec,
        end: StreamIdSpec,
    ) -> Result<Vec<StreamEntry>, CinnabarError> {
        let frame = self
            .execute(
                "XRANGE",
                vec![
                    key.into(),
                    start.to_string().into(),
                    end.to_string().into(),
                ],
            )
            .await?;
        StreamEntry::many_from_frame(frame)
    }

    /// XREVRANGE key end start.
    async fn xrevrange(
        &self,
        key: &str,
        end: StreamIdSpec,
        start: StreamIdSpec,
    ) -> Result<Vec<StreamEntry>, CinnabarError> {
        let frame = self
            .execute(
                "XREVRANGE",
                vec![key.into(), end.to_string().into(), start.to_string().into()],
            )
            .await?;
        StreamEntry::many_from_frame(frame)
    }

    /// XDEL key id [id ...]; returns the number of entries removed.
    async fn xdel(&self, key: &str, ids: &[StreamId]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(1 + ids.len());
        args.push(CommandArg::from(key));
        args.extend(ids.iter().map(|id| CommandArg::from(id.to_string())));
        self.execute("XDEL", args).await?.as_integer()
    }

    /// XTRIM key MAXLEN threshold; returns the number of entries evicted.
    async fn xtrim_maxlen(&self, key: &str, maxlen: u64) -> Result<i64, CinnabarError> {
        self.execute("XTRIM", vec![key.into(), "MAXLEN".into(), maxlen.into()])
            .await?
            .as_integer()
    }

    /// Non-blocking XREAD [COUNT n] STREAMS key [key ...] id [id ...].
    ///
    /// Returns one `(stream key, entries)` group per stream that had new
    /// entries; an empty vector when none did.
    async fn xread(
        &self,
        streams: &[(&str, StreamIdSpec)],
        count: Option<u64>,
    ) -> Result<Vec<(Bytes, Vec<StreamEntry>)>, CinnabarError> {
        let mut args = Vec::with_capacity(3 + streams.len() * 2);
        if count.is_some() {
            args.push(CommandArg::from("COUNT"));
        }
        push_optional(&mut args, count);
        args.push(CommandArg::from("STREAMS"));
        for (key, _) in streams {
            args.push(CommandArg::from(*key));
        }
        for (_, id) in streams {
            args.push(CommandArg::from(id.to_string()));
        }

        decode_stream_groups(self.execute("XREAD", args).await?)
    }

    /// XGROUP CREATE key group start, creating the stream when absent.
    ///
    /// `start` is usually [`StreamIdSpec::Tail`] (only new entries) or a
    /// concrete id to begin from.
    async fn xgroup_create(
        &self,
        key: &str,
        group: &str,
        start: StreamIdSpec,
    ) -> Result<(), CinnabarError> {
        self.execute(
            "XGROUP",
            vec![
                "CREATE".into(),
                key.into(),
                group.into(),
                start.to_string().into(),
                "MKSTREAM".into(),
            ],
        )
        .await?
        .expect_ok()
    }

    /// XGROUP DESTROY key group; returns whether the group existed.
    async fn xgroup_destroy(&self, key: &str, group: &str) -> Result<bool, CinnabarError> {
        Ok(self
            .execute("XGROUP", vec!["DESTROY".into(), key.into(), group.into()])
            .await?
            .as_integer()?
            != 0)
    }

    /// Non-blocking XREADGROUP GROUP group consumer [COUNT n] STREAMS ...
    ///
    /// Pass [`StreamIdSpec::Unseen`] (`>`) to receive entries never delivered
    /// to this group; a concrete id re-reads this consumer's pending entries.
    async fn xreadgroup(
        &self,
        group: &str,
        consumer: &str,
        streams: &[(&str, StreamIdSpec)],
        count: Option<u64>,
    ) -> Result<Vec<(Bytes, Vec<StreamEntry>)>, CinnabarError> {
        let mut args = Vec::with_capacity(6 + streams.len() * 2);
        args.push(CommandArg::from("GROUP"));
        args.push(CommandArg::from(group));
        args.push(CommandArg::from(consumer));
        if count.is_some() {
            args.push(CommandArg::from("COUNT"));
        }
        push_optional(&mut args, count);
        args.push(CommandArg::from("STREAMS"));
        for (key, _) in streams {
            args.push(CommandArg::from(*key));
        }
        for (_, id) in streams {
            args.push(CommandArg::from(id.to_string()));
        }

        decode_stream_groups(self.execute("XREADGROUP", args).await?)
    }

    /// XACK key group id [id ...]; returns the number of acknowledged entries.
    async fn xack(&self, key: &str, group: &str, ids: &[StreamId]) -> Result<i64, CinnabarError> {
        let mut args = Vec::with_capacity(2 + ids.len());
        args.push(CommandArg::from(key));
        args.push(CommandArg::from(group));
        args.extend(ids.iter().map(|id| CommandArg::from(id.to_string())));
        self.execute("XACK", args).await?.as_integer()
    }
}

/// Decodes the `[[key, entries], ...]` shape shared by XREAD and XREADGROUP.
/// A null reply means no stream had anything to deliver.
fn decode_stream_groups(
    frame: RespFrame,
) -> Result<Vec<(Bytes, Vec<StreamEntry>)>, CinnabarError> {
    let Some(groups) = frame.into_optional_array()? else {
        return Ok(Vec::new());
    };
    groups
        .into_iter()
        .map(|group| {
            let mut parts = group.into_array()?.into_iter();
            let key = parts
                .next()
                .ok_or_else(|| {
                    CinnabarError::InvalidState("stream read group missing key".to_string())
                })?
                .into_bytes()?;
            let entries = parts
                .next()
                .map_or_else(|| Ok(Vec::new()), StreamEntry::many_from_frame)?;
            Ok((key, entries))
        })
        .collect()
}

impl<T: CommandExecutor> StreamCommands for T {}

// src/commands/scan.rs

//! Cursor-based iteration commands.
//!
//! Each call returns the next cursor together with one batch of results; a
//! returned cursor of `0` means the iteration is complete.

use crate::commands::decode;
use crate::core::CinnabarError;
use crate::core::protocol::{CommandArg, RespFrame, push_optional};
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

fn scan_args(cursor: u64, pattern: Option<&str>, count: Option<u64>) -> Vec<CommandArg> {
    let mut args = vec![CommandArg::from(cursor)];
    if pattern.is_some() {
        args.push("MATCH".into());
    }
    push_optional(&mut args, pattern.map(str::to_string));
    if count.is_some() {
        args.push("COUNT".into());
    }
    push_optional(&mut args, count);
    args
}

/// Splits a `[cursor, items]` reply.
fn cursor_and_items(frame: RespFrame) -> Result<(u64, RespFrame), CinnabarError> {
    let mut parts = frame.into_array()?.into_iter();
    let cursor = parts
        .next()
        .ok_or_else(|| CinnabarError::InvalidState("scan reply missing cursor".to_string()))?
        .into_text()?
        .parse::<u64>()
        .map_err(|_| CinnabarError::NotAnInteger)?;
    let items = parts
        .next()
        .ok_or_else(|| CinnabarError::InvalidState("scan reply missing items".to_string()))?;
    Ok((cursor, items))
}

#[async_trait]
pub trait ScanCommands: CommandExecutor {
    /// SCAN cursor [MATCH pattern] [COUNT n] over the keyspace.
    async fn scan(
        &self,
        cursor: u64,
        pattern: Option<&str>,
        count: Option<u64>,
    ) -> Result<(u64, Vec<Bytes>), CinnabarError> {
        let frame = self
            .execute("SCAN", scan_args(cursor, pattern, count))
            .await?;
        let (next, items) = cursor_and_items(frame)?;
        Ok((next, decode::bytes_items(items)?))
    }

    /// SSCAN key cursor [MATCH pattern] [COUNT n] over a set's members.
    async fn sscan(
        &self,
        key: &str,
        cursor: u64,
        pattern: Option<&str>,
        count: Option<u64>,
    ) -> Result<(u64, Vec<Bytes>), CinnabarError> {
        let mut args = vec![CommandArg::from(key)];
        args.extend(scan_args(cursor, pattern, count));
        let frame = self.execute("SSCAN", args).await?;
        let (next, items) = cursor_and_items(frame)?;
        Ok((next, decode::bytes_items(items)?))
    }

    /// HSCAN key cursor [MATCH pattern] [COUNT n] as field/value pairs.
    async fn hscan(
        &self,
        key: &str,
        cursor: u64,
        pattern: Option<&str>,
        count: Option<u64>,
    ) -> Result<(u64, Vec<(Bytes, Bytes)>), CinnabarError> {
        let mut args = vec![CommandArg::from(key)];
        args.extend(scan_args(cursor, pattern, count));
        let frame = self.execute("HSCAN", args).await?;
        let (next, items) = cursor_and_items(frame)?;
        Ok((next, decode::pairs(items)?))
    }

    /// ZSCAN key cursor [MATCH pattern] [COUNT n] as member/score pairs.
    async fn zscan(
        &self,
        key: &str,
        cursor: u64,
        pattern: Option<&str>,
        count: Option<u64>,
    ) -> Result<(u64, Vec<(Bytes, f64)>), CinnabarError> {
        let mut args = vec![CommandArg::from(key)];
        args.extend(scan_args(cursor, pattern, count));
        let frame = self.execute("ZSCAN", args).await?;
        let (next, items) = cursor_and_items(frame)?;
        let scored = decode::pairs(items)?
            .into_iter()
            .map(|(member, score)| {
                let score = decode::parse_float(std::str::from_utf8(&score)?)?;
                Ok((member, score))
            })
            .collect::<Result<Vec<_>, CinnabarError>>()?;
        Ok((next, scored))
    }
}

impl<T: CommandExecutor> ScanCommands for T {}

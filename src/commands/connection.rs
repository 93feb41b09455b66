// src/commands/connection.rs

//! Connection-scoped commands.

use crate::core::CinnabarError;
use crate::core::protocol::CommandArg;
use crate::executor::CommandExecutor;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait ConnectionCommands: CommandExecutor {
    /// PING; returns the server's response text (`PONG` without a message).
    async fn ping(&self) -> Result<String, CinnabarError> {
        self.execute("PING", vec![]).await?.into_text()
    }

    /// ECHO message.
    async fn echo<V: Into<CommandArg> + Send>(&self, message: V) -> Result<Bytes, CinnabarError> {
        self.execute("ECHO", vec![message.into()]).await?.into_bytes()
    }

    /// SELECT db.
    async fn select(&self, db: usize) -> Result<(), CinnabarError> {
        self.execute("SELECT", vec![db.into()]).await?.expect_ok()
    }

    /// CLIENT SETNAME name.
    async fn client_setname(&self, name: &str) -> Result<(), CinnabarError> {
        self.execute("CLIENT", vec!["SETNAME".into(), name.into()])
            .await?
            .expect_ok()
    }

    /// CLIENT GETNAME.
    async fn client_getname(&self) -> Result<Option<String>, CinnabarError> {
        self.execute("CLIENT", vec!["GETNAME".into()])
            .await?
            .into_optional_text()
    }

    /// DBSIZE.
    async fn dbsize(&self) -> Result<i64, CinnabarError> {
        self.execute("DBSIZE", vec![]).await?.as_integer()
    }

    /// FLUSHDB.
    async fn flushdb(&self) -> Result<(), CinnabarError> {
        self.execute("FLUSHDB", vec![]).await?.expect_ok()
    }

    /// INFO [section], returned as the server's raw text report.
    async fn info(&self, section: Option<&str>) -> Result<String, CinnabarError> {
        let mut args = Vec::with_capacity(1);
        if let Some(section) = section {
            args.push(CommandArg::from(section));
        }
        self.execute("INFO", args).await?.into_text()
    }
}

impl<T: CommandExecutor> ConnectionCommands for T {}

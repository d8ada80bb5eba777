//! Provider subprocess protocol.
//!
//! This module handles communication with external provider binaries
//! (e.g., `roomsync-provider-file`) using JSON over stdin/stdout.
//!
//! The protocol is language-agnostic: any executable that speaks it can be a
//! provider. Providers own their credentials; roomsync only passes along the
//! `[provider_config]` table from its config file.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::constants::PROVIDER_TIMEOUT_SECS;
use crate::error::{RoomSyncError, RoomSyncResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(PROVIDER_TIMEOUT_SECS);

#[derive(Clone, Debug)]
pub struct Provider {
    name: String,
    binary_path: Option<PathBuf>,
}

impl Provider {
    /// A provider found in PATH as `roomsync-provider-{name}`.
    pub fn from_name(name: &str) -> Self {
        Provider {
            name: name.to_string(),
            binary_path: None,
        }
    }

    /// A provider at an explicit location.
    pub fn from_path(name: &str, binary_path: impl Into<PathBuf>) -> Self {
        Provider {
            name: name.to_string(),
            binary_path: Some(binary_path.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn binary_path(&self) -> RoomSyncResult<PathBuf> {
        if let Some(path) = &self.binary_path {
            return Ok(path.clone());
        }

        let binary_name = format!("roomsync-provider-{}", self.name);
        which::which(&binary_name).map_err(|_| RoomSyncError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> RoomSyncResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| RoomSyncError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> RoomSyncResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| RoomSyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| RoomSyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        tracing::trace!(provider = %self.name, ?command, "calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RoomSyncError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RoomSyncError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(RoomSyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        let response_line = response_str.lines().next().unwrap_or_default();
        if response_line.is_empty() {
            return Err(RoomSyncError::Provider("Provider returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(response_line)
            .map_err(|e| RoomSyncError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(RoomSyncError::Provider(error)),
        }
    }
}

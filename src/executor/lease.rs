// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

use super::result::CommandResult;
use crate::error::{Error, Result};
use crate::session::ActiveSession;
use crate::utils::sanitize_command;

/// Exclusive hold on a session's command queue.
///
/// Nothing else runs on the session until the lease is dropped, so a
/// sequence of steps issued through one lease cannot interleave with
/// another caller's commands.
pub struct Lease {
    session: Arc<ActiveSession>,
    default_timeout: Option<Duration>,
    _slot: OwnedMutexGuard<()>,
}

impl Lease {
    pub(super) fn new(
        session: Arc<ActiveSession>,
        slot: OwnedMutexGuard<()>,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            session,
            default_timeout,
            _slot: slot,
        }
    }

    /// Run `command`, failing with [`Error::CommandFailure`] on a non-zero exit.
    pub async fn run(&self, command: &str) -> Result<CommandResult> {
        self.run_capped(command, None, self.default_timeout).await
    }

    pub async fn run_with_timeout(&self, command: &str, timeout: Duration) -> Result<CommandResult> {
        self.run_capped(command, None, Some(timeout)).await
    }

    /// Run `command` with an optional cap on captured output and an
    /// optional deadline. On timeout the channel is dropped.
    pub async fn run_capped(
        &self,
        command: &str,
        output_limit: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<CommandResult> {
        sanitize_command(command)?;
        tracing::debug!("Executing on {}: {}", self.session.target(), command);

        let exec = self.session.transport().exec(command, output_limit);
        let result = self
            .session
            .guard(async {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, exec)
                        .await
                        .map_err(|_| Error::Timeout(limit))?,
                    None => exec.await,
                }
            })
            .await?;

        result.into_success().inspect_err(|e| {
            tracing::debug!("Command on {} failed: {}", self.session.target(), e);
        })
    }

    /// Write `content` to `path` over the session's file channel.
    pub async fn upload(&self, path: &str, content: &[u8]) -> Result<()> {
        tracing::debug!(
            "Uploading {} bytes to {}:{}",
            content.len(),
            self.session.target(),
            path
        );
        let upload = self.session.transport().upload(path, content);
        match self.default_timeout {
            Some(limit) => {
                self.session
                    .guard(async {
                        tokio::time::timeout(limit, upload)
                            .await
                            .map_err(|_| Error::Timeout(limit))?
                    })
                    .await
            }
            None => self.session.guard(upload).await,
        }
    }
}

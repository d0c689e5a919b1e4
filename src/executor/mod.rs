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

//! Serialized command execution against the active session.
//!
//! Two commands interleaved on one session corrupt each other's output,
//! so every command waits its turn on the session's FIFO queue. A caller
//! that needs several steps to run back to back takes a [`Lease`] and
//! issues them through it.

mod lease;
mod result;

pub use lease::Lease;
pub use result::CommandResult;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::session::SessionManager;
use crate::utils::sanitize_command;

#[derive(Debug, Clone)]
pub struct CommandExecutor {
    sessions: Arc<SessionManager>,
    default_timeout: Option<Duration>,
}

impl CommandExecutor {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            default_timeout: None,
        }
    }

    /// Apply `timeout` to every command that does not specify its own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Wait for exclusive use of the connected session.
    ///
    /// Fails with [`Error::NoSession`] immediately when nothing is connected,
    /// and with [`Error::Timeout`] if the default timeout passes while waiting
    /// behind other commands.
    pub async fn lease(&self) -> Result<Lease> {
        within(self.default_timeout, self.acquire()).await
    }

    pub async fn run(&self, command: &str) -> Result<CommandResult> {
        self.run_within(command, None, self.default_timeout).await
    }

    /// Run `command`, failing with [`Error::Timeout`] unless it has finished
    /// within `timeout`, time spent queued included.
    pub async fn run_with_timeout(&self, command: &str, timeout: Duration) -> Result<CommandResult> {
        self.run_within(command, None, Some(timeout)).await
    }

    /// Run `command`, giving up with [`Error::ContentTooLarge`] if its
    /// output grows past `output_limit` bytes.
    pub async fn run_capped(&self, command: &str, output_limit: usize) -> Result<CommandResult> {
        self.run_within(command, Some(output_limit), self.default_timeout)
            .await
    }

    async fn acquire(&self) -> Result<Lease> {
        let session = self.sessions.active().ok_or(Error::NoSession)?;
        let slot = session.acquire().await?;
        Ok(Lease::new(session, slot, self.default_timeout))
    }

    // The deadline starts before the queue wait, not when the command is sent.
    async fn run_within(
        &self,
        command: &str,
        output_limit: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<CommandResult> {
        sanitize_command(command)?;
        let run = async {
            self.acquire()
                .await?
                .run_capped(command, output_limit, None)
                .await
        };
        within(timeout, run).await
    }
}

async fn within<T>(
    timeout: Option<Duration>,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => operation.await,
    }
}

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

//! SSH exec channel operations.

use russh::client::Msg;
use russh::Channel;

use super::connection::Client;
use crate::executor::CommandResult;

/// Buffer size for SSH command I/O operations
/// - 8KB (8192 bytes) matches typical SSH channel window sizes
const SSH_CMD_BUFFER_SIZE: usize = 8192;

/// Small buffer size for stderr, which is usually a short message
const SSH_RESPONSE_BUFFER_SIZE: usize = 1024;

impl Client {
    /// Get a new SSH channel for communication.
    pub async fn get_channel(&self) -> Result<Channel<Msg>, super::Error> {
        self.connection_handle
            .channel_open_session()
            .await
            .map_err(super::Error::SshError)
    }

    /// Execute a remote command via the ssh connection.
    ///
    /// Returns stdout, stderr and the exit code of the command,
    /// packaged in a [`CommandResult`]. Gives up once either output stream
    /// exceeds `output_limit` bytes.
    ///
    /// Make sure your commands don't read from stdin and exit after bounded time.
    /// Every invocation is a new shell context.
    pub async fn execute_capped(
        &self,
        command: &str,
        output_limit: Option<usize>,
    ) -> Result<CommandResult, super::Error> {
        let mut stdout_buffer = Vec::with_capacity(SSH_CMD_BUFFER_SIZE);
        let mut stderr_buffer = Vec::with_capacity(SSH_RESPONSE_BUFFER_SIZE);
        let mut channel = self.get_channel().await?;
        channel.exec(true, command).await?;

        let mut result: Option<u32> = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                russh::ChannelMsg::Data { ref data } => stdout_buffer.extend_from_slice(data),
                russh::ChannelMsg::ExtendedData { ref data, ext } => {
                    if ext == 1 {
                        stderr_buffer.extend_from_slice(data)
                    }
                }

                // The exit status can arrive before the last data packet,
                // so keep draining until the channel closes.
                russh::ChannelMsg::ExitStatus { exit_status } => result = Some(exit_status),

                // RFC 4254 5.3 permits closing without EOF, and EOF may
                // precede Data, so it is not a termination signal.
                _ => {}
            }

            if let Some(limit) = output_limit {
                if stdout_buffer.len() > limit || stderr_buffer.len() > limit {
                    tracing::debug!("Command output exceeded {} bytes, closing channel", limit);
                    let _ = channel.close().await;
                    return Err(super::Error::OutputLimitExceeded(limit));
                }
            }
        }

        match result {
            Some(exit_status) => Ok(CommandResult::new(stdout_buffer, stderr_buffer, exit_status)),
            None => Err(super::Error::CommandDidntExit),
        }
    }
}

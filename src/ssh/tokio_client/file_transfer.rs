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

//! SFTP file writes.
//!
//! Content goes over an SFTP subsystem channel as raw bytes, so it never
//! passes through a shell and binary or non-UTF-8 data survives intact.

use russh_sftp::{client::SftpSession, protocol::OpenFlags};
use tokio::io::AsyncWriteExt;

use super::connection::Client;

impl Client {
    /// Open an SFTP session on a fresh channel.
    ///
    /// Some sshd_config does not enable sftp by default. A config line like
    /// `Subsystem sftp internal-sftp` is needed on the remote machine.
    pub async fn open_sftp(&self) -> Result<SftpSession, super::Error> {
        let channel = self.get_channel().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        Ok(sftp)
    }

    /// Create or truncate `remote_path` and write `content` to it.
    pub async fn write_remote_file(
        &self,
        remote_path: &str,
        content: &[u8],
    ) -> Result<(), super::Error> {
        let sftp = self.open_sftp().await?;

        let mut file = sftp
            .open_with_flags(
                remote_path,
                OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
            )
            .await?;
        file.write_all(content).await?;
        file.flush().await?;
        file.shutdown().await?;

        tracing::trace!("Wrote {} bytes to {}", content.len(), remote_path);
        if let Err(e) = sftp.close().await {
            tracing::debug!("Error closing SFTP session: {}", e);
        }
        Ok(())
    }
}

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

//! Reading and writing remote files.
//!
//! Reads go through `cat`. Writes never put file content on a command
//! line: the bytes are uploaded over SFTP to a staging file next to the
//! destination and then renamed over it, all under a single queue lease
//! so concurrent writes cannot interleave their steps.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::executor::{CommandExecutor, Lease};
use crate::utils::{quote_arg, validate_remote_path};

const STAGING_TAG: &str = "sshbridge";

#[derive(Debug, Clone)]
pub struct FileTransfer {
    executor: CommandExecutor,
    max_read_bytes: usize,
}

impl FileTransfer {
    pub fn new(executor: CommandExecutor, max_read_bytes: usize) -> Self {
        Self {
            executor,
            max_read_bytes,
        }
    }

    /// Return the content of `path` byte for byte.
    ///
    /// Fails with [`Error::ContentTooLarge`] if the file exceeds the read limit.
    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        validate_remote_path(path)?;
        let command = format!("cat -- {}", quote_arg(path));
        let result = self
            .executor
            .run_capped(&command, self.max_read_bytes)
            .await?;
        tracing::debug!("Read {} bytes from {}", result.stdout().len(), path);
        Ok(result.into_stdout())
    }

    /// Like [`read`](Self::read), decoding invalid UTF-8 lossily.
    pub async fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Replace `path` with `content`.
    ///
    /// The destination is either left untouched or fully replaced. A
    /// staging file left over from a failed attempt is removed on a best
    /// effort basis.
    pub async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        validate_remote_path(path)?;
        let staging = staging_path(path)?;
        let lease = self.executor.lease().await?;

        match stage_and_move(&lease, &staging, path, content).await {
            Ok(()) => {
                tracing::debug!("Wrote {} bytes to {}", content.len(), path);
                Ok(())
            }
            Err(e) => {
                remove_staging(&lease, &staging).await;
                Err(e)
            }
        }
    }
}

async fn stage_and_move(lease: &Lease, staging: &str, path: &str, content: &[u8]) -> Result<()> {
    lease.upload(staging, content).await?;
    let command = format!("mv -f -- {} {}", quote_arg(staging), quote_arg(path));
    lease.run(&command).await?;
    Ok(())
}

async fn remove_staging(lease: &Lease, staging: &str) {
    let command = format!("rm -f -- {}", quote_arg(staging));
    if let Err(e) = lease.run(&command).await {
        tracing::warn!("Failed to remove staging file {}: {}", staging, e);
    }
}

/// A unique hidden sibling of `path`, so the final rename never crosses
/// a filesystem boundary.
pub fn staging_path(path: &str) -> Result<String> {
    let (dir, name) = match path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, path),
    };
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidInput(format!(
            "Path does not name a file: {path}"
        )));
    }

    let file = format!(".{}.{}-{}.tmp", name, STAGING_TAG, Uuid::new_v4().simple());
    Ok(match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file,
    })
}

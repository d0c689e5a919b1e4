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

use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::ssh::target::Target;
use crate::ssh::transport::Transport;

/// A connected session: the transport plus its command queue.
///
/// The queue is a `tokio::sync::Mutex`, which hands out the lock in the
/// order it was requested, so commands run strictly FIFO.
pub struct ActiveSession {
    target: Target,
    transport: Arc<dyn Transport>,
    queue: Arc<Mutex<()>>,
    closed: CancellationToken,
}

impl ActiveSession {
    pub(crate) fn new(target: Target, transport: Arc<dyn Transport>) -> Self {
        Self {
            target,
            transport,
            queue: Arc::new(Mutex::new(())),
            closed: CancellationToken::new(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// True once the session was closed locally or the transport dropped.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled() || self.transport.is_closed()
    }

    /// Wait for this session's turn on the command queue.
    ///
    /// Fails with [`Error::Connection`] if the session is closed while waiting.
    pub(crate) async fn acquire(&self) -> Result<OwnedMutexGuard<()>> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(session_closed()),
            slot = Arc::clone(&self.queue).lock_owned() => Ok(slot),
        }
    }

    /// Drive `operation` unless the session is closed first.
    pub(crate) async fn guard<T>(
        &self,
        operation: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(session_closed()),
            result = operation => result,
        }
    }

    /// Fail every queued and in-flight command, then close the transport.
    pub(crate) async fn close(&self) {
        self.closed.cancel();
        self.transport.close().await;
    }
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("target", &self.target)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn session_closed() -> Error {
    Error::Connection("SSH session was closed".to_string())
}

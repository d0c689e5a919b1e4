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

//! Transport seam between the session layer and the wire.
//!
//! [`SessionManager`](crate::session::SessionManager) is the only component
//! that calls a [`Connector`] or closes a [`Transport`]. Everything above it
//! reaches the transport through a command-queue lease.
//!
//! The production implementation is [`RusshConnector`](super::RusshConnector);
//! tests plug in an in-memory remote.

use async_trait::async_trait;
use std::sync::Arc;

use super::target::{Credential, Target};
use crate::error::Result;
use crate::executor::CommandResult;

/// An open, authenticated connection to a remote host.
///
/// Implementations must not serialize calls themselves; ordering is the
/// executor's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run `command` on a fresh exec channel and collect its output.
    ///
    /// When `output_limit` is set and either stream grows past it, the
    /// channel is abandoned and [`Error::ContentTooLarge`] is returned.
    /// Transport failures are reported as [`Error::Exec`].
    ///
    /// [`Error::ContentTooLarge`]: crate::Error::ContentTooLarge
    /// [`Error::Exec`]: crate::Error::Exec
    async fn exec(&self, command: &str, output_limit: Option<usize>) -> Result<CommandResult>;

    /// Create or truncate `path` and write `content` to it through a
    /// structured file channel. No shell is involved.
    async fn upload(&self, path: &str, content: &[u8]) -> Result<()>;

    /// Close the connection. Must be safe to call more than once.
    async fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Opens transports. Failures are reported as [`Error::Connection`](crate::Error::Connection).
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, target: &Target, credential: &Credential)
        -> Result<Arc<dyn Transport>>;
}

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

//! Error taxonomy for bridge operations.
//!
//! Every failure is returned to the caller as a structured value; nothing
//! in this crate retries internally. The variants map one-to-one onto the
//! [`ErrorKind`] tags that the request/response boundary serializes.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by session, command, listing and transfer operations.
///
/// The type is `Clone` so that a single in-flight connect attempt can hand
/// the same outcome to every caller that joined it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Missing host, user or credential material.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Timeout, handshake/auth failure or unreachable network.
    #[error("{0}")]
    Connection(String),

    /// An operation was attempted while no session is connected.
    #[error("SSH connection not established. Please connect first.")]
    NoSession,

    /// The remote command exited with a non-zero status.
    #[error("Command failed with code {exit_code}: {}", .stderr.trim_end())]
    CommandFailure { exit_code: u32, stderr: String },

    /// The transport failed while a command or transfer was running.
    #[error("Execution error: {0}")]
    Exec(String),

    /// A caller-supplied command deadline elapsed.
    #[error("Command timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Captured content exceeded the configured cap.
    #[error("Content exceeds the configured limit of {limit} bytes")]
    ContentTooLarge { limit: usize },

    /// A path or command was rejected before anything was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Stable, serializable tag for each [`Error`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidConfig,
    ConnectionError,
    NoSession,
    CommandFailure,
    ExecError,
    Timeout,
    ContentTooLarge,
    InvalidInput,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::Connection(_) => ErrorKind::ConnectionError,
            Error::NoSession => ErrorKind::NoSession,
            Error::CommandFailure { .. } => ErrorKind::CommandFailure,
            Error::Exec(_) => ErrorKind::ExecError,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::ContentTooLarge { .. } => ErrorKind::ContentTooLarge,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Normalizes a failure from the connect path into [`Error::Connection`].
    pub(crate) fn into_connection_error(self) -> Self {
        match self {
            Error::Connection(_) => self,
            other => Error::Connection(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failure_display_trims_trailing_newline() {
        let err = Error::CommandFailure {
            exit_code: 2,
            stderr: "permission denied\n".to_string(),
        };
        assert_eq!(err.to_string(), "Command failed with code 2: permission denied");
        assert_eq!(err.kind(), ErrorKind::CommandFailure);
    }

    #[test]
    fn test_connect_path_normalization() {
        let err = Error::Exec("handshake reset".to_string()).into_connection_error();
        assert_eq!(err.kind(), ErrorKind::ConnectionError);
        assert!(err.to_string().contains("handshake reset"));

        let already = Error::Connection("refused".to_string());
        assert_eq!(already.clone().into_connection_error(), already);
    }

    #[test]
    fn test_error_kind_serializes_as_variant_name() {
        let json = serde_json::to_string(&ErrorKind::ContentTooLarge).unwrap();
        assert_eq!(json, "\"ContentTooLarge\"");
    }
}

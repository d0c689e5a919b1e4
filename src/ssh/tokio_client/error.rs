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

use std::io;
use thiserror::Error;

/// Wire-level failures from russh and russh-sftp.
///
/// These never cross the [`Transport`](crate::ssh::Transport) boundary
/// directly; [`Client`](super::Client) folds them into the crate's
/// [`Error`](crate::Error) taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid address: {0}")]
    AddressInvalid(io::Error),
    #[error("Failed to load SSH key: {0}")]
    KeyInvalid(russh::keys::Error),
    #[error("Authentication failed. The private key was rejected by the server.")]
    KeyAuthFailed,
    #[error("Password authentication failed.")]
    PasswordWrong,
    #[error("Host key verification failed. The server's host key was not recognized or has changed.")]
    ServerCheckFailed,
    #[error("SSH error: {0}")]
    SshError(#[from] russh::Error),
    #[error("SFTP error: {0}")]
    SftpError(#[from] russh_sftp::client::error::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Channel closed without reporting an exit status")]
    CommandDidntExit,
    #[error("Output exceeded {0} bytes")]
    OutputLimitExceeded(usize),
}

impl Error {
    /// Map a failure that happened while establishing the connection.
    pub(crate) fn into_connection_error(self) -> crate::Error {
        crate::Error::Connection(format!("SSH connection failed: {self}"))
    }

    /// Map a failure that happened on an already established connection.
    pub(crate) fn into_exec_error(self) -> crate::Error {
        match self {
            Error::OutputLimitExceeded(limit) => crate::Error::ContentTooLarge { limit },
            other => crate::Error::Exec(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_limit_maps_to_content_too_large() {
        let mapped = Error::OutputLimitExceeded(1024).into_exec_error();
        assert_eq!(mapped, crate::Error::ContentTooLarge { limit: 1024 });
    }

    #[test]
    fn test_auth_failure_maps_to_connection_error() {
        let mapped = Error::PasswordWrong.into_connection_error();
        assert_eq!(mapped.kind(), crate::ErrorKind::ConnectionError);
        assert!(mapped.to_string().contains("Password authentication failed"));
    }

    #[test]
    fn test_missing_exit_status_maps_to_exec_error() {
        let mapped = Error::CommandDidntExit.into_exec_error();
        assert_eq!(mapped.kind(), crate::ErrorKind::ExecError);
    }
}

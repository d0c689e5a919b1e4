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

//! Request/response facade over the session bridge.
//!
//! Each operation returns a [`Reply`] that serializes to the JSON shape
//! front ends consume:
//!
//! ```json
//! {"status":"success","path":"/tmp","files":[...],"totalCount":3}
//! {"status":"error","message":"SSH connection not established. Please connect first.","kind":"NoSession"}
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::config::BridgeConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::executor::CommandExecutor;
use crate::listing::{DirectoryEntry, DirectoryLister};
use crate::session::{SessionManager, SessionStatus};
use crate::ssh::{Connector, Credential, RusshConnector, Target, DEFAULT_SSH_PORT};
use crate::transfer::FileTransfer;

/// Outcome of a bridge operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply<T> {
    Success(T),
    #[serde(rename = "error")]
    Failure { message: String, kind: ErrorKind },
}

impl<T> Reply<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }

    /// The payload of a successful reply.
    pub fn success(self) -> Option<T> {
        match self {
            Reply::Success(value) => Some(value),
            Reply::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Reply::Success(_) => None,
            Reply::Failure { kind, .. } => Some(*kind),
        }
    }

    fn failure(context: &str, error: Error) -> Self {
        let message = match &error {
            // already phrased for the caller
            Error::NoSession | Error::InvalidConfig(_) | Error::InvalidInput(_) => {
                error.to_string()
            }
            Error::Connection(message) if message.starts_with("SSH connection") => {
                message.clone()
            }
            _ => format!("{context}: {error}"),
        };
        Reply::Failure {
            message,
            kind: error.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub path: String,
    pub files: Vec<DirectoryEntry>,
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Written {
    pub path: String,
    pub message: String,
}

/// Connection parameters as sent by a front end.
///
/// Secrets are wiped when the request is dropped. Missing fields take
/// their defaults so validation can report what is absent.
#[derive(Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectRequest {
    #[serde(alias = "ip")]
    pub host: String,
    pub port: Option<u16>,
    #[serde(alias = "username")]
    pub user: String,
    pub password: Option<Zeroizing<String>>,
    #[serde(alias = "sshKey")]
    pub private_key: Option<Zeroizing<String>>,
    pub passphrase: Option<Zeroizing<String>>,
}

impl ConnectRequest {
    pub fn target(&self) -> Result<Target> {
        let target = Target::new(
            self.host.as_str(),
            self.port.unwrap_or(DEFAULT_SSH_PORT),
            self.user.as_str(),
        );
        if target.host.is_empty() || target.user.is_empty() {
            return Err(Error::InvalidConfig(
                "Missing required host configuration (host, user)".to_string(),
            ));
        }
        Ok(target)
    }

    pub fn credential(&self) -> Result<Credential> {
        Credential::from_parts(
            self.password.as_ref().map(|s| s.as_str()),
            self.private_key.as_ref().map(|s| s.as_str()),
            self.passphrase.as_ref().map(|s| s.as_str()),
        )
    }
}

impl std::fmt::Debug for ConnectRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Owns one [`SessionManager`] and the operations built on it.
#[derive(Debug)]
pub struct Bridge {
    sessions: Arc<SessionManager>,
    lister: DirectoryLister,
    transfer: FileTransfer,
}

impl Bridge {
    /// A bridge that connects over SSH.
    pub fn new(config: BridgeConfig) -> Self {
        let config = Arc::new(config);
        let connector = Arc::new(RusshConnector::new(Arc::clone(&config)));
        Self::with_connector(connector, &config)
    }

    /// A bridge over an arbitrary [`Connector`].
    pub fn with_connector(connector: Arc<dyn Connector>, config: &BridgeConfig) -> Self {
        let sessions = Arc::new(SessionManager::new(connector, config.connect_timeout()));
        let executor = CommandExecutor::new(Arc::clone(&sessions))
            .with_default_timeout(config.command_timeout());
        Self {
            lister: DirectoryLister::new(executor.clone()),
            transfer: FileTransfer::new(executor, config.max_read_bytes),
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub async fn connect(&self, request: &ConnectRequest) -> Reply<Ack> {
        let outcome = async {
            let target = request.target()?;
            let credential = request.credential()?;
            tracing::info!("Connect requested for {}", target);
            self.sessions.connect(target, credential).await
        };
        match outcome.await {
            Ok(()) => Reply::Success(Ack::new("SSH connection established successfully")),
            Err(e) => Reply::failure("SSH connection failed", e),
        }
    }

    pub async fn disconnect(&self) -> Reply<Ack> {
        self.sessions.disconnect().await;
        Reply::Success(Ack::new("SSH connection disconnected successfully"))
    }

    pub fn status(&self) -> Reply<SessionStatus> {
        Reply::Success(self.sessions.status())
    }

    /// List `path`, or `/` when no path is given.
    pub async fn list_files(&self, path: Option<&str>) -> Reply<Listing> {
        let path = path.filter(|p| !p.is_empty()).unwrap_or("/");
        let outcome = async {
            self.require_session()?;
            self.lister.list(path).await
        };
        match outcome.await {
            Ok(files) => Reply::Success(Listing {
                path: path.to_string(),
                total_count: files.len(),
                files,
            }),
            Err(e) => {
                tracing::error!("Error listing files in {}: {}", path, e);
                Reply::failure("Failed to list files", e)
            }
        }
    }

    pub async fn read_file(&self, path: &str) -> Reply<FileContent> {
        let outcome = async {
            self.require_session()?;
            self.transfer.read_to_string(path).await
        };
        match outcome.await {
            Ok(content) => Reply::Success(FileContent {
                path: path.to_string(),
                content,
            }),
            Err(e) => {
                tracing::error!("Error reading file {}: {}", path, e);
                Reply::failure("Failed to read file", e)
            }
        }
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Reply<Written> {
        let outcome = async {
            self.require_session()?;
            self.transfer.write(path, content.as_bytes()).await
        };
        match outcome.await {
            Ok(()) => Reply::Success(Written {
                path: path.to_string(),
                message: "File written successfully".to_string(),
            }),
            Err(e) => {
                tracing::error!("Error writing file {}: {}", path, e);
                Reply::failure("Failed to write file", e)
            }
        }
    }

    /// Close the session on process exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down, closing SSH session");
        self.sessions.disconnect().await;
    }

    // Report a missing session before looking at the request's arguments.
    fn require_session(&self) -> Result<()> {
        self.sessions.active().map(|_| ()).ok_or(Error::NoSession)
    }
}

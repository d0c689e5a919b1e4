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

//! SSH connection management and establishment.
//!
//! This module handles the low-level SSH connection establishment,
//! including address resolution, connection attempts, and initial handshake,
//! and adapts the resulting [`Client`] to the [`Transport`] seam.

use async_trait::async_trait;
use russh::client::{Config, Handle, Handler};
use std::net::SocketAddr;
use std::sync::Arc;
use std::{fmt::Debug, io};

use super::authentication::{AuthMethod, ServerCheckMethod};
use crate::config::BridgeConfig;
use crate::executor::CommandResult;
use crate::ssh::target::{Credential, Target};
use crate::ssh::transport::{Connector, Transport};

/// A ssh connection to a remote server.
///
/// After creating a `Client` by [`connect`]ing to a remote host,
/// use [`execute_capped`] to send commands and receive results through the connection.
///
/// [`connect`]: Client::connect
/// [`execute_capped`]: Client::execute_capped
#[derive(Clone)]
pub struct Client {
    pub(super) connection_handle: Arc<Handle<ClientHandler>>,
    pub(super) username: String,
    pub(super) address: SocketAddr,
}

impl Client {
    /// Open a ssh connection to a remote host.
    ///
    /// If `host` resolves to multiple addresses, `connect` will be attempted with
    /// each of the addresses until a connection is successful.
    /// Authentification is tried on the first successful connection and the whole
    /// process aborted if this fails.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        auth: AuthMethod,
        server_check: ServerCheckMethod,
        config: Config,
    ) -> Result<Self, super::Error> {
        let config = Arc::new(config);

        let socket_addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(super::Error::AddressInvalid)?;
        let mut connect_res = Err(super::Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "could not resolve to any addresses",
        )));
        for socket_addr in socket_addrs {
            let handler = ClientHandler {
                hostname: host.to_string(),
                host: socket_addr,
                server_check: server_check.clone(),
            };
            match russh::client::connect(config.clone(), socket_addr, handler).await {
                Ok(h) => {
                    connect_res = Ok((socket_addr, h));
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connection to {} failed: {}", socket_addr, e);
                    connect_res = Err(e);
                }
            }
        }
        let (address, mut handle) = connect_res?;

        super::authentication::authenticate(&mut handle, username, auth).await?;

        Ok(Self {
            connection_handle: Arc::new(handle),
            username: username.to_string(),
            address,
        })
    }

    /// A debugging function to get the username this client is connected as.
    pub fn get_connection_username(&self) -> &str {
        &self.username
    }

    /// A debugging function to get the address this client is connected to.
    pub fn get_connection_address(&self) -> &SocketAddr {
        &self.address
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<(), super::Error> {
        self.connection_handle
            .disconnect(russh::Disconnect::ByApplication, "", "")
            .await
            .map_err(super::Error::SshError)
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.connection_handle.is_closed()
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("address", &self.address)
            .field("connection_handle", &"Handle<ClientHandler>")
            .finish()
    }
}

#[async_trait]
impl Transport for Client {
    async fn exec(&self, command: &str, output_limit: Option<usize>) -> crate::Result<CommandResult> {
        self.execute_capped(command, output_limit)
            .await
            .map_err(super::Error::into_exec_error)
    }

    async fn upload(&self, path: &str, content: &[u8]) -> crate::Result<()> {
        self.write_remote_file(path, content)
            .await
            .map_err(super::Error::into_exec_error)
    }

    async fn close(&self) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = self.disconnect().await {
            tracing::debug!("Error closing SSH connection to {}: {}", self.address, e);
        }
    }

    fn is_closed(&self) -> bool {
        Client::is_closed(self)
    }
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
    host: SocketAddr,
    server_check: ServerCheckMethod,
}

impl Handler for ClientHandler {
    type Error = super::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.server_check {
            ServerCheckMethod::NoCheck => Ok(true),
            ServerCheckMethod::KnownHostsFile(known_hosts_path) => {
                let result = russh::keys::check_known_hosts_path(
                    &self.hostname,
                    self.host.port(),
                    server_public_key,
                    known_hosts_path,
                )
                .map_err(|_| super::Error::ServerCheckFailed)?;

                Ok(result)
            }
            ServerCheckMethod::DefaultKnownHostsFile => {
                let result = russh::keys::check_known_hosts(
                    &self.hostname,
                    self.host.port(),
                    server_public_key,
                )
                .map_err(|_| super::Error::ServerCheckFailed)?;

                Ok(result)
            }
        }
    }
}

/// Opens russh [`Client`]s for the session manager.
///
/// The connect timeout is not applied here; the session manager races the
/// whole attempt against it.
#[derive(Debug, Clone)]
pub struct RusshConnector {
    config: Arc<BridgeConfig>,
}

impl RusshConnector {
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self { config }
    }

    fn russh_config(&self) -> Config {
        Config {
            keepalive_interval: self.config.keepalive_interval(),
            keepalive_max: self.config.keepalive_max,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Connector for RusshConnector {
    async fn connect(
        &self,
        target: &Target,
        credential: &Credential,
    ) -> crate::Result<Arc<dyn Transport>> {
        let client = Client::connect(
            &target.host,
            target.port,
            &target.user,
            AuthMethod::from(credential),
            ServerCheckMethod::from(&self.config.host_key_check),
            self.russh_config(),
        )
        .await
        .map_err(super::Error::into_connection_error)?;

        tracing::debug!(
            "Authenticated as {} on {}",
            client.get_connection_username(),
            client.get_connection_address()
        );
        Ok(Arc::new(client))
    }
}

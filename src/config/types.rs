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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Connect attempts are abandoned after this many seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 20;

/// Upper bound on buffered file content for reads (16 MiB).
pub const DEFAULT_MAX_READ_BYTES: usize = 16 * 1024 * 1024;

const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 10;
const DEFAULT_KEEPALIVE_MAX: usize = 3;

/// Tunables for the session bridge.
///
/// ```yaml
/// connect_timeout_secs: 20
/// keepalive_interval_secs: 10
/// keepalive_max: 3
/// command_timeout_secs: 120
/// max_read_bytes: 16777216
/// host_key_check:
///   known-hosts-file: ~/.ssh/known_hosts
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub connect_timeout_secs: u64,
    /// `None` disables keepalive probes.
    pub keepalive_interval_secs: Option<u64>,
    /// Unanswered keepalives before the transport is considered dead.
    pub keepalive_max: usize,
    /// Per-command deadline. `None` means commands may run indefinitely.
    pub command_timeout_secs: Option<u64>,
    pub max_read_bytes: usize,
    /// Written as `no-check`, `known-hosts`, or `known-hosts-file: <path>`.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub host_key_check: HostKeyCheck,
}

/// How the server's host key is verified during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyCheck {
    /// Accept any host key.
    #[default]
    NoCheck,
    /// Verify against `~/.ssh/known_hosts`.
    KnownHosts,
    /// Verify against the given known_hosts file.
    KnownHostsFile(PathBuf),
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            keepalive_interval_secs: Some(DEFAULT_KEEPALIVE_INTERVAL_SECS),
            keepalive_max: DEFAULT_KEEPALIVE_MAX,
            command_timeout_secs: None,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            host_key_check: HostKeyCheck::default(),
        }
    }
}

impl BridgeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

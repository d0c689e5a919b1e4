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

//! sshbridge exposes a single managed SSH connection as a small file
//! service: connect, list a directory, read a file, write a file.
//!
//! [`Bridge`] is the entry point. It owns a [`SessionManager`], which in
//! turn owns the one remote session; all commands are queued on that
//! session in submission order.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod listing;
pub mod session;
pub mod ssh;
pub mod transfer;
pub mod utils;

pub use bridge::{Bridge, ConnectRequest, Reply};
pub use cli::Cli;
pub use config::BridgeConfig;
pub use error::{Error, ErrorKind, Result};
pub use executor::{CommandExecutor, CommandResult, Lease};
pub use listing::{DirectoryEntry, DirectoryLister, EntryKind};
pub use session::{SessionManager, SessionState, SessionStatus};
pub use ssh::{Connector, Credential, Target, Transport};
pub use transfer::FileTransfer;

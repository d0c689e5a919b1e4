//! russh-backed implementation of the transport seam.
//!
//! The heart of this module is [`Client`]: one authenticated SSH connection
//! that opens a new exec channel per command and an SFTP subsystem channel
//! per upload. [`RusshConnector`] builds clients from a
//! [`Target`](crate::ssh::Target) and [`Credential`](crate::ssh::Credential)
//! using the keepalive and host-key settings from
//! [`BridgeConfig`](crate::config::BridgeConfig).

pub mod authentication;
pub mod channel_manager;
pub mod connection;
pub mod error;
pub mod file_transfer;

pub use authentication::{AuthMethod, ServerCheckMethod};
pub use connection::{Client, ClientHandler, RusshConnector};
pub use error::Error;

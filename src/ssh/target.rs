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

//! Remote endpoint and credential types.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

pub const DEFAULT_SSH_PORT: u16 = 22;

/// The remote endpoint a session is bound to.
///
/// Two targets are the same session when host, port and user all match;
/// the credential is not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub user: String,
}

impl Target {
    /// Create a target. A port of `0` selects the default SSH port.
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>) -> Self {
        Self {
            host: host.into().trim().to_string(),
            port: if port == 0 { DEFAULT_SSH_PORT } else { port },
            user: user.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("host is required".to_string()));
        }
        if self.user.is_empty() {
            return Err(Error::InvalidConfig("user is required".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Authentication material for a single connect call. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Password(Zeroizing<String>),
    PrivateKey {
        /// entire contents of the private key file
        key_data: Zeroizing<String>,
        passphrase: Option<Zeroizing<String>>,
    },
}

impl Credential {
    pub fn with_password(password: &str) -> Self {
        Self::Password(Zeroizing::new(password.to_string()))
    }

    pub fn with_key(key_data: &str, passphrase: Option<&str>) -> Self {
        Self::PrivateKey {
            key_data: Zeroizing::new(key_data.to_string()),
            passphrase: passphrase
                .filter(|p| !p.is_empty())
                .map(|p| Zeroizing::new(p.to_string())),
        }
    }

    /// Pick a credential from optional request fields.
    ///
    /// Key material takes precedence over a password; empty strings count
    /// as absent.
    pub fn from_parts(
        password: Option<&str>,
        private_key: Option<&str>,
        passphrase: Option<&str>,
    ) -> Result<Self> {
        match (
            private_key.filter(|k| !k.trim().is_empty()),
            password.filter(|p| !p.is_empty()),
        ) {
            (Some(key), _) => Ok(Self::with_key(key, passphrase)),
            (None, Some(password)) => Ok(Self::with_password(password)),
            (None, None) => Err(Error::InvalidConfig(
                "Either password or SSH key must be provided".to_string(),
            )),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let empty = match self {
            Credential::Password(password) => password.is_empty(),
            Credential::PrivateKey { key_data, .. } => key_data.trim().is_empty(),
        };
        if empty {
            return Err(Error::InvalidConfig(
                "Either password or SSH key must be provided".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password(_) => f.write_str("Credential::Password(<redacted>)"),
            Credential::PrivateKey { passphrase, .. } => f
                .debug_struct("Credential::PrivateKey")
                .field("key_data", &"<redacted>")
                .field("has_passphrase", &passphrase.is_some())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults_port_and_trims() {
        let target = Target::new(" 10.0.0.5 ", 0, "root ");
        assert_eq!(target.host, "10.0.0.5");
        assert_eq!(target.port, 22);
        assert_eq!(target.user, "root");
        assert_eq!(target.to_string(), "root@10.0.0.5:22");
    }

    #[test]
    fn test_target_requires_host_and_user() {
        assert!(matches!(
            Target::new("", 22, "root").validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Target::new("example.com", 22, "").validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Target::new("example.com", 2222, "admin").validate().is_ok());
    }

    #[test]
    fn test_credential_prefers_key_over_password() {
        let cred = Credential::from_parts(Some("secret"), Some("-----BEGIN KEY-----"), None).unwrap();
        assert!(matches!(cred, Credential::PrivateKey { .. }));

        let cred = Credential::from_parts(Some("secret"), Some("   "), None).unwrap();
        assert!(matches!(cred, Credential::Password(_)));
    }

    #[test]
    fn test_credential_requires_material() {
        assert!(matches!(
            Credential::from_parts(Some(""), None, None),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Credential::with_password("").validate().is_err());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let rendered = format!("{:?}", Credential::with_password("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}

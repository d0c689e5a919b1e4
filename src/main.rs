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

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use zeroize::Zeroizing;

use sshbridge::{
    bridge::{Bridge, ConnectRequest, Reply},
    cli::{Cli, Commands},
    config::{expand_tilde, BridgeConfig},
    utils::init_logging,
};

const PASSWORD_ENV_VAR: &str = "SSHBRIDGE_PASSWORD";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = BridgeConfig::load(&cli.config).await?;
    if let Some(secs) = cli.connect_timeout {
        config.connect_timeout_secs = secs;
        config.validate()?;
    }

    let request = build_connect_request(&cli).await?;
    let bridge = Bridge::new(config);

    let outcome = tokio::select! {
        outcome = run(&bridge, &request, &cli.command) => outcome,
        _ = shutdown_signal() => {
            tracing::warn!("Interrupted, closing SSH session");
            Ok(false)
        }
    };

    bridge.shutdown().await;

    if !outcome? {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(bridge: &Bridge, request: &ConnectRequest, command: &Commands) -> Result<bool> {
    let connected = bridge.connect(request).await;
    if !connected.is_success() {
        return print_reply(&connected);
    }

    match command {
        Commands::Status => print_reply(&bridge.status()),
        Commands::Ls { path } => print_reply(&bridge.list_files(Some(path)).await),
        Commands::Cat { path } => print_reply(&bridge.read_file(path).await),
        Commands::Put { path, from } => {
            let bytes = match from {
                Some(local) => tokio::fs::read(local)
                    .await
                    .with_context(|| format!("Failed to read local file {}", local.display()))?,
                None => {
                    let mut buffer = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buffer)
                        .await
                        .context("Failed to read content from stdin")?;
                    buffer
                }
            };
            let content = String::from_utf8(bytes).context("File content must be valid UTF-8")?;
            print_reply(&bridge.write_file(path, &content).await)
        }
    }
}

/// Assemble connection parameters from flags, prompting for secrets when asked.
async fn build_connect_request(cli: &Cli) -> Result<ConnectRequest> {
    let private_key = match &cli.identity {
        Some(path) => {
            let path = expand_tilde(path);
            let key = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read identity file {}", path.display()))?;
            Some(Zeroizing::new(key))
        }
        None => None,
    };

    let secret = if cli.password {
        Some(read_secret(cli, private_key.is_some())?)
    } else {
        std::env::var(PASSWORD_ENV_VAR).ok().map(Zeroizing::new)
    };

    let (password, passphrase) = match (&private_key, secret) {
        (Some(_), secret) => (None, secret),
        (None, secret) => (secret, None),
    };

    Ok(ConnectRequest {
        host: cli.host.clone(),
        port: Some(cli.port),
        user: cli.user.clone(),
        password,
        private_key,
        passphrase,
    })
}

fn read_secret(cli: &Cli, for_key: bool) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(PASSWORD_ENV_VAR) {
        tracing::debug!("Using secret from {}", PASSWORD_ENV_VAR);
        return Ok(Zeroizing::new(value));
    }
    let prompt = if for_key {
        "Enter passphrase for key: ".to_string()
    } else {
        format!("Enter password for {}@{}: ", cli.user, cli.host)
    };
    let secret = rpassword::prompt_password(prompt).with_context(|| "Failed to read password")?;
    Ok(Zeroizing::new(secret))
}

fn print_reply<T: Serialize>(reply: &Reply<T>) -> Result<bool> {
    let json = serde_json::to_string_pretty(reply).context("Failed to serialize reply")?;
    println!("{json}");
    Ok(reply.is_success())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                tracing::debug!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sshbridge",
    version,
    about = "Remote file access over a single managed SSH session",
    long_about = "sshbridge connects to one remote host over SSH and exposes it as a small file service:\ndirectory listings, file reads and atomic file writes. Each invocation connects, performs\none operation and prints the JSON reply on stdout.",
    after_help = "EXAMPLES:\n  List a directory:   sshbridge -H 10.0.0.5 -l deploy -i ~/.ssh/id_ed25519 ls /var/www\n  Read a file:        sshbridge -H 10.0.0.5 -l deploy --password cat /etc/hostname\n  Write a file:       echo hello | sshbridge -H 10.0.0.5 -l deploy -i key put /tmp/x.txt"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short = 'H', long, help = "Remote host name or address")]
    pub host: String,

    #[arg(short = 'p', long, default_value = "22", help = "Remote SSH port")]
    pub port: u16,

    #[arg(
        short = 'l',
        long = "login",
        env = "USER",
        help = "Remote user name (defaults to the local $USER)"
    )]
    pub user: String,

    #[arg(
        short = 'i',
        long,
        help = "Private key file used for authentication\nTakes precedence over --password"
    )]
    pub identity: Option<PathBuf>,

    #[arg(
        short = 'P',
        long,
        help = "Prompt for a password (or read SSHBRIDGE_PASSWORD)\nAlso used as the key passphrase when --identity is given"
    )]
    pub password: bool,

    #[arg(
        short = 'F',
        long,
        default_value = "~/.config/sshbridge/config.yaml",
        help = "Configuration file path"
    )]
    pub config: PathBuf,

    #[arg(
        long,
        help = "Seconds to wait for the connection to be established (overrides config)"
    )]
    pub connect_timeout: Option<u64>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Connect and report the session status")]
    Status,

    #[command(about = "List a remote directory")]
    Ls {
        #[arg(default_value = "/", help = "Remote directory path")]
        path: String,
    },

    #[command(about = "Print a remote file")]
    Cat {
        #[arg(help = "Remote file path")]
        path: String,
    },

    #[command(about = "Replace a remote file with the content of stdin or --from")]
    Put {
        #[arg(help = "Remote destination path")]
        path: String,

        #[arg(long, help = "Local file to upload instead of stdin")]
        from: Option<PathBuf>,
    },
}

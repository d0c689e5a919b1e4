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

//! Validation and quoting for text that ends up in a remote shell.
//!
//! Only paths are ever interpolated into commands. File content travels
//! over SFTP and never reaches this module.

use crate::error::{Error, Result};

/// Commands longer than this are rejected before a channel is opened.
const MAX_COMMAND_LENGTH: usize = 16384;

/// Matches Linux `PATH_MAX`.
const MAX_PATH_LENGTH: usize = 4096;

/// Validate a command before it is sent to the remote host.
pub fn sanitize_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(Error::InvalidInput("Empty command not allowed".to_string()));
    }

    if command.len() > MAX_COMMAND_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Command too long: {} bytes (max: {} bytes)",
            command.len(),
            MAX_COMMAND_LENGTH
        )));
    }

    if command.contains('\0') {
        return Err(Error::InvalidInput(
            "Command contains null bytes".to_string(),
        ));
    }

    Ok(())
}

/// Validate a remote path supplied by a caller.
pub fn validate_remote_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(Error::InvalidInput("File path is required".to_string()));
    }

    if path.len() > MAX_PATH_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Path too long: {} bytes (max: {} bytes)",
            path.len(),
            MAX_PATH_LENGTH
        )));
    }

    if path.contains('\0') {
        return Err(Error::InvalidInput("Path contains null bytes".to_string()));
    }

    Ok(())
}

/// Quote `arg` as a single POSIX shell word.
///
/// Words made only of characters the shell takes literally come back
/// unchanged; anything else is single-quoted.
pub fn quote_arg(arg: &str) -> String {
    shell_words::quote(arg).into_owned()
}

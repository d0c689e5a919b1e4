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

use crate::error::Error;

/// Result of a remote command execution. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_status: u32,
}

impl CommandResult {
    pub fn new(stdout: Vec<u8>, stderr: Vec<u8>, exit_status: u32) -> Self {
        Self {
            stdout,
            stderr,
            exit_status,
        }
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn exit_status(&self) -> u32 {
        self.exit_status
    }

    pub fn into_stdout(self) -> Vec<u8> {
        self.stdout
    }

    /// Convert stdout to a UTF-8 string
    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Convert stderr to a UTF-8 string
    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the command execution was successful (exit status 0)
    pub fn is_success(&self) -> bool {
        self.exit_status == 0
    }

    /// Turn a non-zero exit into [`Error::CommandFailure`], whatever stdout says.
    pub fn into_success(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::CommandFailure {
                exit_code: self.exit_status,
                stderr: self.stderr_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_result_success() {
        let result = CommandResult::new(b"Hello World\n".to_vec(), Vec::new(), 0);

        assert!(result.is_success());
        assert_eq!(result.stdout_string(), "Hello World\n");
        assert_eq!(result.stderr_string(), "");
        assert!(result.into_success().is_ok());
    }

    #[test]
    fn test_nonzero_exit_is_failure_even_with_stdout() {
        let result = CommandResult::new(
            b"partial output".to_vec(),
            b"permission denied".to_vec(),
            2,
        );

        assert!(!result.is_success());
        assert_eq!(
            result.into_success(),
            Err(Error::CommandFailure {
                exit_code: 2,
                stderr: "permission denied".to_string()
            })
        );
    }

    #[test]
    fn test_command_result_with_utf8() {
        let result = CommandResult::new(
            "한글 테스트\n".as_bytes().to_vec(),
            "エラー\n".as_bytes().to_vec(),
            1,
        );

        assert!(!result.is_success());
        assert_eq!(result.stdout_string(), "한글 테스트\n");
        assert_eq!(result.stderr_string(), "エラー\n");
    }
}

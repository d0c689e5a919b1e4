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

//! In-memory remote host used by the integration tests.
//!
//! Understands the handful of shell commands the bridge issues (`ls`,
//! `cat`, `mv`, `rm`) against a flat map of paths, and records every
//! connect, close, exec and upload in order.

#![allow(dead_code)]

use async_trait::async_trait;
use sshbridge::{CommandResult, Connector, Credential, Error, Target, Transport};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RemoteState {
    files: BTreeMap<String, Vec<u8>>,
    listings: HashMap<String, String>,
    scripted: HashMap<String, CommandResult>,
    events: Vec<String>,
    opens: usize,
    closes: usize,
    connect_delay: Option<Duration>,
    exec_delay: Option<Duration>,
    upload_delay: Option<Duration>,
    connect_error: Option<String>,
    fail_upload: bool,
    fail_mv: bool,
    links: Vec<Arc<AtomicBool>>,
}

#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        Arc::new(self.clone())
    }

    pub fn put_file(&self, path: &str, content: &[u8]) {
        self.lock().files.insert(path.to_string(), content.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    pub fn set_listing(&self, path: &str, output: &str) {
        self.lock()
            .listings
            .insert(path.to_string(), output.to_string());
    }

    pub fn script(&self, command: &str, stdout: &str, stderr: &str, exit_status: u32) {
        self.lock().scripted.insert(
            command.to_string(),
            CommandResult::new(stdout.into(), stderr.into(), exit_status),
        );
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        self.lock().connect_delay = Some(delay);
    }

    pub fn set_exec_delay(&self, delay: Duration) {
        self.lock().exec_delay = Some(delay);
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        self.lock().upload_delay = Some(delay);
    }

    pub fn fail_connect(&self, message: &str) {
        self.lock().connect_error = Some(message.to_string());
    }

    pub fn fail_uploads(&self) {
        self.lock().fail_upload = true;
    }

    pub fn fail_moves(&self) {
        self.lock().fail_mv = true;
    }

    /// Drop every open connection from the remote side.
    pub fn sever(&self) {
        for link in &self.lock().links {
            link.store(true, Ordering::SeqCst);
        }
    }

    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Commands (not connects or uploads) the remote has been asked to run.
    pub fn commands(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("exec:").map(str::to_string))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap()
    }

    fn record(&self, event: String) {
        self.lock().events.push(event);
    }

    fn run(&self, command: &str) -> CommandResult {
        let mut state = self.lock();
        if let Some(result) = state.scripted.get(command) {
            return result.clone();
        }

        let words = shell_words::split(command).unwrap_or_default();
        let args: Vec<&str> = words.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["LC_ALL=C", "ls", "-la", "--", path] => match state.listings.get(*path) {
                Some(output) => ok(output.as_bytes()),
                None => fail(
                    2,
                    &format!("ls: cannot access '{path}': No such file or directory\n"),
                ),
            },
            ["cat", "--", path] => match state.files.get(*path) {
                Some(content) => ok(content),
                None => fail(1, &format!("cat: {path}: No such file or directory\n")),
            },
            ["mv", "-f", "--", from, to] => {
                if state.fail_mv {
                    return fail(1, &format!("mv: cannot move '{from}' to '{to}': Permission denied\n"));
                }
                match state.files.remove(*from) {
                    Some(content) => {
                        state.files.insert(to.to_string(), content);
                        ok(b"")
                    }
                    None => fail(1, &format!("mv: cannot stat '{from}': No such file or directory\n")),
                }
            }
            ["rm", "-f", "--", path] => {
                state.files.remove(*path);
                ok(b"")
            }
            _ => fail(127, "sh: command not found\n"),
        }
    }
}

#[async_trait]
impl Connector for FakeRemote {
    async fn connect(
        &self,
        target: &Target,
        _credential: &Credential,
    ) -> sshbridge::Result<Arc<dyn Transport>> {
        let (delay, error) = {
            let mut state = self.lock();
            state.opens += 1;
            state.events.push(format!("open:{}", target.host));
            (state.connect_delay, state.connect_error.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = error {
            return Err(Error::Connection(format!("SSH connection failed: {message}")));
        }
        let closed = Arc::new(AtomicBool::new(false));
        self.lock().links.push(Arc::clone(&closed));
        Ok(Arc::new(FakeTransport {
            remote: self.clone(),
            host: target.host.clone(),
            closed,
        }))
    }
}

pub struct FakeTransport {
    remote: FakeRemote,
    host: String,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn exec(
        &self,
        command: &str,
        output_limit: Option<usize>,
    ) -> sshbridge::Result<CommandResult> {
        if self.is_closed() {
            return Err(Error::Exec("channel closed".to_string()));
        }
        self.remote.record(format!("exec:{command}"));
        let delay = self.remote.lock().exec_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.remote.run(command);
        if let Some(limit) = output_limit {
            if result.stdout().len() > limit || result.stderr().len() > limit {
                return Err(Error::ContentTooLarge { limit });
            }
        }
        Ok(result)
    }

    async fn upload(&self, path: &str, content: &[u8]) -> sshbridge::Result<()> {
        if self.is_closed() {
            return Err(Error::Exec("channel closed".to_string()));
        }
        self.remote.record(format!("upload:{path}"));
        let (delay, fail) = {
            let state = self.remote.lock();
            (state.upload_delay, state.fail_upload)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.remote.lock();
        if fail {
            // leave a partial file behind, like an interrupted transfer would
            state.files.insert(path.to_string(), content[..content.len() / 2].to_vec());
            return Err(Error::Exec("SFTP error: write failed".to_string()));
        }
        state.files.insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut state = self.remote.lock();
            state.closes += 1;
            state.events.push(format!("close:{}", self.host));
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn ok(stdout: &[u8]) -> CommandResult {
    CommandResult::new(stdout.to_vec(), Vec::new(), 0)
}

fn fail(exit_status: u32, stderr: &str) -> CommandResult {
    CommandResult::new(Vec::new(), stderr.as_bytes().to_vec(), exit_status)
}

pub fn target(host: &str) -> Target {
    Target::new(host, 22, "deploy")
}

pub fn password() -> Credential {
    Credential::with_password("secret")
}

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

//! Ownership and lifecycle of the single remote session.
//!
//! [`SessionManager`] is the only writer of session state and the only
//! component that opens or closes a transport. Every transition happens
//! under a short synchronous lock that is never held across an await.
//!
//! Each `connect` and `disconnect` bumps a generation counter. A connect
//! attempt runs in its own task and only installs its transport if the
//! generation is unchanged when it finishes; otherwise it closes what it
//! opened. This is how a disconnect (or a connect to another target)
//! abandons an attempt that is still in flight, and why a caller dropping
//! its future can never strand the state in `Connecting`.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::active::ActiveSession;
use super::state::{SessionState, SessionStatus};
use crate::error::{Error, Result};
use crate::ssh::target::{Credential, Target};
use crate::ssh::transport::{Connector, Transport};

type ConnectOutcome = Shared<BoxFuture<'static, Result<()>>>;

struct PendingConnect {
    target: Target,
    outcome: ConnectOutcome,
}

struct Inner {
    state: SessionState,
    active: Option<Arc<ActiveSession>>,
    pending: Option<PendingConnect>,
    generation: u64,
}

impl Inner {
    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!("Unexpected session transition {} -> {}", self.state, next);
        }
        debug!("Session state {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Owns the one remote session and drives its lifecycle.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            connector,
            connect_timeout,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Disconnected,
                active: None,
                pending: None,
                generation: 0,
            })),
        }
    }

    /// Connect to `target`, reusing the current session when it already
    /// points at the same host, port and user.
    ///
    /// A session for a different target is closed before the new transport
    /// is opened. Concurrent calls for the same target share one attempt.
    pub async fn connect(&self, target: Target, credential: Credential) -> Result<()> {
        target.validate()?;
        credential.validate()?;

        let outcome = {
            let mut inner = lock(&self.inner);

            let joined = inner
                .pending
                .as_ref()
                .filter(|pending| pending.target == target)
                .map(|pending| pending.outcome.clone());

            if let Some(outcome) = joined {
                debug!("Joining in-flight connect to {}", target);
                outcome
            } else if inner.pending.is_none()
                && inner
                    .active
                    .as_ref()
                    .is_some_and(|active| active.target() == &target && !active.is_closed())
            {
                debug!("Reusing existing SSH session to {}", target);
                return Ok(());
            } else {
                self.begin_connect(&mut inner, target, credential)
            }
        };

        outcome.await
    }

    fn begin_connect(
        &self,
        inner: &mut Inner,
        target: Target,
        credential: Credential,
    ) -> ConnectOutcome {
        inner.generation += 1;
        let generation = inner.generation;

        if let Some(superseded) = inner.pending.take() {
            debug!("Abandoning in-flight connect to {}", superseded.target);
        }

        let previous = inner.active.take();
        if previous.is_some() {
            inner.transition(SessionState::Closing);
        } else {
            if inner.state == SessionState::Closing {
                inner.transition(SessionState::Disconnected);
            }
            inner.transition(SessionState::Connecting);
        }

        let task = tokio::spawn(attempt(
            Arc::clone(&self.inner),
            Arc::clone(&self.connector),
            self.connect_timeout,
            generation,
            previous,
            target.clone(),
            credential,
        ));
        let outcome = async move {
            task.await.unwrap_or_else(|e| {
                Err(Error::Connection(format!("SSH connection task failed: {e}")))
            })
        }
        .boxed()
        .shared();

        inner.pending = Some(PendingConnect {
            target,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Close the session if there is one. Always succeeds.
    ///
    /// Queued and in-flight commands fail with [`Error::Connection`]; an
    /// in-flight connect attempt is abandoned.
    pub async fn disconnect(&self) {
        let (active, generation) = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;

            if let Some(pending) = inner.pending.take() {
                info!("Cancelling in-flight SSH connection to {}", pending.target);
            }

            let active = inner.active.take();
            if active.is_some() {
                inner.transition(SessionState::Closing);
            } else if !inner.state.is_settled() {
                inner.transition(SessionState::Disconnected);
            }
            (active, inner.generation)
        };

        if let Some(active) = active {
            active.close().await;
            info!("SSH connection to {} closed", active.target());

            let mut inner = lock(&self.inner);
            if inner.generation == generation {
                inner.transition(SessionState::Disconnected);
            }
        }
    }

    /// Current state, without side effects.
    pub fn status(&self) -> SessionStatus {
        let inner = lock(&self.inner);
        SessionStatus {
            state: inner.state,
            connected: inner.state == SessionState::Connected
                && inner.active.as_ref().is_some_and(|a| !a.is_closed()),
            has_connection: inner.active.is_some(),
        }
    }

    /// The connected session, if any.
    ///
    /// Returns `None` unless the state is `Connected` and the transport is
    /// still open, so callers never issue commands on a dead session.
    pub fn active(&self) -> Option<Arc<ActiveSession>> {
        let inner = lock(&self.inner);
        if inner.state != SessionState::Connected {
            return None;
        }
        inner
            .active
            .as_ref()
            .filter(|active| !active.is_closed())
            .cloned()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// What a finished attempt should do once the lock is released.
enum Settle {
    Installed,
    Stale(Arc<dyn Transport>),
    Failed(Error),
}

async fn attempt(
    inner: Arc<Mutex<Inner>>,
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    generation: u64,
    previous: Option<Arc<ActiveSession>>,
    target: Target,
    credential: Credential,
) -> Result<()> {
    if let Some(previous) = previous {
        info!(
            "Closing SSH session to {} before connecting to {}",
            previous.target(),
            target
        );
        previous.close().await;

        let mut guard = lock(&inner);
        if guard.generation != generation {
            return Err(abandoned());
        }
        guard.transition(SessionState::Disconnected);
        guard.transition(SessionState::Connecting);
    }

    info!("Attempting SSH connection to {}", target);
    let opened = tokio::time::timeout(connect_timeout, connector.connect(&target, &credential)).await;

    let settle = {
        let mut guard = lock(&inner);
        let current = guard.generation == generation;
        if current {
            guard.pending = None;
        }

        match opened {
            Ok(Ok(transport)) if current => {
                guard.active = Some(Arc::new(ActiveSession::new(target.clone(), transport)));
                guard.transition(SessionState::Connected);
                Settle::Installed
            }
            Ok(Ok(transport)) => Settle::Stale(transport),
            Ok(Err(e)) => {
                if current {
                    guard.transition(SessionState::Disconnected);
                }
                Settle::Failed(e.into_connection_error())
            }
            Err(_) => {
                if current {
                    guard.transition(SessionState::Disconnected);
                }
                Settle::Failed(Error::Connection(format!(
                    "SSH connection timeout after {} seconds",
                    connect_timeout.as_secs()
                )))
            }
        }
    };

    match settle {
        Settle::Installed => {
            info!("SSH connection to {} established successfully", target);
            Ok(())
        }
        Settle::Stale(transport) => {
            debug!("Connect to {} finished after being abandoned, closing it", target);
            transport.close().await;
            Err(abandoned())
        }
        Settle::Failed(e) => {
            warn!("SSH connection to {} failed: {}", target, e);
            Err(e)
        }
    }
}

fn abandoned() -> Error {
    Error::Connection("SSH connection attempt was cancelled".to_string())
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/*
 * Copyright (c) 2024. Arbor Contributors
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arbor_core::{ActorHandle, Runtime, StartError, CONFIG};

use crate::supervision::RestartPolicy;

/// The future returned by a child start function.
pub type StartFuture = Pin<Box<dyn Future<Output = Result<ActorHandle, StartError>> + Send>>;

/// Everything a child start function needs to bring one incarnation up.
///
/// The generation is managed by the supervisor: zero on first start,
/// bumped on every restart. Start functions must thread it into the spawn
/// (via [`ActorConfig::generation`](arbor_core::ActorConfig::generation))
/// so stale timers and replies from earlier incarnations are discarded,
/// and should re-bind any registry name via
/// [`Registry::rebind`](arbor_core::Registry::rebind).
#[derive(Debug, Clone)]
pub struct ChildStart {
    /// The runtime to spawn into.
    pub runtime: Runtime,
    /// The generation for the incarnation being started.
    pub generation: u64,
}

/// How a supervisor starts, restarts, and stops one child.
///
/// Built once at supervisor-build time and immutable thereafter; the
/// supervisor consumes it for every (re)start.
#[derive(Clone)]
pub struct ChildSpec {
    id: String,
    start: Arc<dyn Fn(ChildStart) -> StartFuture + Send + Sync>,
    restart_policy: RestartPolicy,
    shutdown_timeout: Duration,
}

impl std::fmt::Debug for ChildSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildSpec")
            .field("id", &self.id)
            .field("restart_policy", &self.restart_policy)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

impl ChildSpec {
    /// Creates a spec with defaults: `Permanent` restart policy and the
    /// configured actor shutdown grace period.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        start: impl Fn(ChildStart) -> StartFuture + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            start: Arc::new(start),
            restart_policy: RestartPolicy::default(),
            shutdown_timeout: CONFIG.timeouts.actor_shutdown(),
        }
    }

    /// Sets the restart policy.
    #[must_use]
    pub const fn restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    /// Sets the shutdown grace period for this child. Strictly a grace
    /// period, not a cleanup guarantee: on overrun the child is killed.
    #[must_use]
    pub const fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The child's id, unique within its supervisor.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The restart policy.
    #[must_use]
    pub const fn policy(&self) -> RestartPolicy {
        self.restart_policy
    }

    /// The shutdown grace period.
    #[must_use]
    pub const fn grace(&self) -> Duration {
        self.shutdown_timeout
    }

    pub(crate) fn start(&self, start: ChildStart) -> StartFuture {
        (self.start)(start)
    }
}

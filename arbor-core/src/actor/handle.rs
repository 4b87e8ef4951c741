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

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{instrument, trace, warn};

use crate::actor::cell::{ActorCell, LifecycleStage};
use crate::actor::ActorId;
use crate::config::CONFIG;
use crate::monitor::{MonitorSignal, WatchRef};

/// Untyped lifecycle handle to one actor incarnation.
///
/// A handle observes and controls the actor's life (stop, kill, watch,
/// wait) but cannot deliver messages; message delivery goes through the
/// typed [`Address`](crate::message::Address). Handles are cheap to clone
/// and carry no ownership of the actor's state.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    pub(crate) cell: Arc<ActorCell>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) kill: CancellationToken,
    pub(crate) tracker: TaskTracker,
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        // Cell identity: handles are equal only when they refer to the
        // same incarnation, not merely a namesake.
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for ActorHandle {}

impl ActorHandle {
    /// The actor's logical id.
    #[must_use]
    pub fn id(&self) -> &ActorId {
        self.cell.id()
    }

    /// The incarnation this handle refers to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.cell.generation()
    }

    /// The actor's current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> LifecycleStage {
        self.cell.stage()
    }

    /// Returns `true` until the actor has fully terminated.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.cell.is_alive()
    }

    /// Returns `true` once a stop has been requested or the actor is gone.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.shutdown.is_cancelled() || !self.is_alive()
    }

    /// Registers a termination watcher channel on this actor.
    ///
    /// Actors watch each other through
    /// [`ActorContext::watch`](crate::actor::ActorContext::watch), which
    /// routes signals into the watcher's selector.
    pub(crate) fn subscribe(&self, tx: mpsc::UnboundedSender<MonitorSignal>) -> WatchRef {
        self.cell.subscribe(tx)
    }

    /// Removes a watch registration. Returns `false` when the registration
    /// was already gone (including after the terminal notification).
    pub fn unwatch(&self, watch_ref: WatchRef) -> bool {
        self.cell.unsubscribe(watch_ref)
    }

    /// Requests a graceful stop and waits with the configured grace period,
    /// force-killing on overrun.
    #[instrument(skip(self), fields(actor = %self.id()))]
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.stop_with_grace(CONFIG.timeouts.actor_shutdown()).await;
        Ok(())
    }

    /// Requests a graceful stop, waits up to `grace`, then force-kills.
    ///
    /// The grace period is exactly that: a bounded window for the actor's
    /// in-flight handler and `on_stop` to finish, not a cancellation
    /// guarantee. Returns `true` when the actor had to be killed.
    #[instrument(skip(self), fields(actor = %self.id()))]
    pub async fn stop_with_grace(&self, grace: Duration) -> bool {
        trace!("requesting stop");
        self.shutdown.cancel();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return false;
        }
        warn!(actor = %self.id(), ?grace, "stop grace period elapsed, killing");
        self.kill.cancel();
        self.tracker.wait().await;
        true
    }

    /// Terminates the actor immediately, aborting any in-flight handler.
    /// Watchers observe `Crashed("killed")`.
    #[instrument(skip(self), fields(actor = %self.id()))]
    pub fn kill(&self) {
        self.kill.cancel();
    }

    /// Waits until the actor and its helper tasks have fully terminated.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }
}

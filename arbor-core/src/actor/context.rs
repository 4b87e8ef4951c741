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

use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::actor::{ActorHandle, ActorId};
use crate::message::{Address, Envelope};
use crate::monitor::{MonitorSignal, WatchRef};
use crate::runtime::Runtime;
use crate::selector::Selector;

/// The runtime facilities available to an actor from inside its own loop.
///
/// A context is created per incarnation and handed to `init`, `handle`,
/// and `on_stop`. Everything reachable from it (watching, helper tasks,
/// timers via the own address) keeps the loop itself free of blocking
/// work.
pub struct ActorContext<M: Send + 'static> {
    address: Address<M>,
    handle: ActorHandle,
    runtime: Runtime,
    monitor_tx: mpsc::UnboundedSender<MonitorSignal>,
    pub(crate) monitor_rx: mpsc::UnboundedReceiver<MonitorSignal>,
    pub(crate) selector: Selector<M>,
}

impl<M: Send + 'static> ActorContext<M> {
    pub(crate) fn new(address: Address<M>, handle: ActorHandle, runtime: Runtime) -> Self {
        let (monitor_tx, monitor_rx) = mpsc::unbounded_channel();
        Self {
            address,
            handle,
            runtime,
            monitor_tx,
            monitor_rx,
            selector: Selector::with_mailbox(),
        }
    }

    /// This actor's own address.
    #[must_use]
    pub fn address(&self) -> Address<M> {
        self.address.clone()
    }

    /// This actor's logical id.
    #[must_use]
    pub fn id(&self) -> &ActorId {
        self.handle.id()
    }

    /// The generation of this incarnation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.handle.generation()
    }

    /// This actor's own lifecycle handle.
    #[must_use]
    pub const fn handle(&self) -> &ActorHandle {
        &self.handle
    }

    /// The runtime this actor lives in.
    #[must_use]
    pub const fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Starts watching `target` for termination.
    ///
    /// When `target` terminates, or has already terminated, a
    /// [`MonitorSignal`] is delivered through this actor's selector; map
    /// it into the message type with
    /// [`Selector::on_monitor`](crate::selector::Selector::on_monitor).
    /// Watching grants no ownership in either direction.
    pub fn watch(&self, target: &ActorHandle) -> WatchRef {
        trace!(watcher = %self.id(), watched = %target.id(), "watch");
        target.subscribe(self.monitor_tx.clone())
    }

    /// Stops watching `target`. Returns `false` when the registration was
    /// already gone.
    pub fn unwatch(&self, target: &ActorHandle, watch_ref: WatchRef) -> bool {
        target.unwatch(watch_ref)
    }

    /// Replaces this actor's selector.
    ///
    /// The replacement is honored verbatim: a selector that does not
    /// include the mailbox stops mailbox delivery until another selector
    /// re-includes it.
    pub fn install_selector(&mut self, selector: Selector<M>) {
        if !selector.includes_mailbox() {
            warn!(actor = %self.id(), "installed selector does not include the actor's own mailbox");
        }
        self.selector = selector;
    }

    /// Delegates work to an ephemeral helper task and receives the result
    /// back as an ordinary message.
    ///
    /// This is the sanctioned way to perform blocking or slow I/O: the
    /// actor's own loop keeps servicing its mailbox while the helper runs.
    /// The result envelope is stamped with this incarnation's generation,
    /// so a result that outlives a restart is discarded instead of being
    /// delivered to the wrong incarnation.
    pub fn pipe_task<T, F, Map>(&self, task: F, map: Map)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
        Map: FnOnce(T) -> M + Send + 'static,
    {
        let address = self.address.clone();
        let generation = self.handle.generation();
        let kill = self.handle.kill.clone();
        self.handle.tracker().spawn(async move {
            tokio::select! {
                () = kill.cancelled() => {}
                output = task => {
                    let envelope = Envelope::with_origin(map(output), generation);
                    if address.send_envelope(envelope).await.is_err() {
                        trace!(target_actor = %address.id(), "pipe result dropped, actor gone");
                    }
                }
            }
        });
    }
}

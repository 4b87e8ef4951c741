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

//! The runtime: spawning, tracking, and shutting down actors.
//!
//! Each live actor gets one tokio task; the runtime does no scheduling of
//! its own. Spawning runs the actor's `init` to completion before
//! returning, so a successful spawn means a running actor.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{instrument, trace};

use crate::actor::{Actor, ActorCell, ActorConfig, ActorContext, ActorHandle, ActorId};
use crate::config::CONFIG;
use crate::errors::StartError;
use crate::mailbox;
use crate::message::Address;
use crate::registry::Registry;

/// The result of a successful spawn: the typed messaging endpoint and the
/// untyped lifecycle handle for the same incarnation.
#[derive(Debug)]
pub struct Spawned<M> {
    /// Typed address for `cast` and `call`.
    pub address: Address<M>,
    /// Lifecycle handle for stop, kill, watch, and wait.
    pub handle: ActorHandle,
}

// Manual impl: `M` itself need not be `Clone`.
impl<M> Clone for Spawned<M> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            handle: self.handle.clone(),
        }
    }
}

/// A handle to a running actor system.
///
/// Cloning is cheap; every clone refers to the same system. The runtime
/// owns the registry and the root cancellation token that fans out to
/// every actor's shutdown signal.
#[derive(Debug, Clone)]
pub struct Runtime {
    registry: Registry,
    roots: Arc<DashMap<String, ActorHandle>>,
    shutdown: CancellationToken,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Creates an empty actor system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            roots: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// The system's process registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Spawns an actor with default configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`StartError`] produced by the actor's `init`.
    pub async fn spawn<A: Actor>(&self, actor: A) -> Result<Spawned<A::Msg>, StartError> {
        self.spawn_with(ActorConfig::new(), actor).await
    }

    /// Spawns a named actor with otherwise default configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`StartError`] produced by the actor's `init`.
    pub async fn spawn_named<A: Actor>(
        &self,
        name: &str,
        actor: A,
    ) -> Result<Spawned<A::Msg>, StartError> {
        self.spawn_with(ActorConfig::new().named(name), actor).await
    }

    /// Spawns an actor with explicit configuration.
    ///
    /// The actor's `init` runs to completion (bounded by the configured
    /// init timeout) before this returns, so the returned address is
    /// always that of a running actor.
    ///
    /// # Errors
    ///
    /// Returns the [`StartError`] produced by the actor's `init`.
    #[instrument(skip(self, actor), fields(name = ?config.name, generation = config.generation))]
    pub async fn spawn_with<A: Actor>(
        &self,
        config: ActorConfig,
        actor: A,
    ) -> Result<Spawned<A::Msg>, StartError> {
        let id = config
            .name
            .as_deref()
            .map_or_else(ActorId::generated, ActorId::new);
        let generation = config.generation;

        let (sender, inbox) = mailbox::channel(config.mailbox);
        let cell = Arc::new(ActorCell::new(id.clone(), generation));
        let tracker = TaskTracker::new();
        let handle = ActorHandle {
            cell,
            shutdown: self.shutdown.child_token(),
            kill: CancellationToken::new(),
            tracker,
        };
        let address = Address::new(sender, id.clone(), generation);
        let ctx = ActorContext::new(address.clone(), handle.clone(), self.clone());

        let (init_tx, init_rx) = oneshot::channel();
        handle
            .tracker()
            .spawn(crate::actor::run_actor(actor, ctx, inbox, init_tx));
        handle.tracker().close();

        match init_rx.await {
            Ok(Ok(())) => {
                trace!(actor = %id, generation, "spawned");
                self.track_root(&handle);
                Ok(Spawned { address, handle })
            }
            Ok(Err(err)) => Err(err),
            // The loop task died before reporting; only a panic between
            // spawn and init can cause this.
            Err(_) => Err(StartError::InitFailed("actor task aborted".to_string())),
        }
    }

    fn track_root(&self, handle: &ActorHandle) {
        // Dead incarnations from earlier restarts are swept opportunistically.
        self.roots.retain(|_, tracked| tracked.is_alive());
        self.roots.insert(
            format!("{}#{}", handle.id(), handle.generation()),
            handle.clone(),
        );
    }

    /// Number of live actors in the system.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.roots
            .iter()
            .filter(|entry| entry.value().is_alive())
            .count()
    }

    /// Requests a graceful stop of every actor, waits the configured
    /// system grace period, then force-kills stragglers.
    #[instrument(skip(self))]
    pub async fn shutdown_all(&self) {
        trace!("system shutdown requested");
        self.shutdown.cancel();
        let grace = CONFIG.timeouts.system_shutdown();
        let handles: Vec<ActorHandle> = self
            .roots
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        join_all(
            handles
                .iter()
                .map(|handle| handle.stop_with_grace(grace)),
        )
        .await;
        self.roots.clear();
    }

    /// Parks the caller until the system is shut down.
    ///
    /// The actor runtime has no lifetime of its own beyond the host
    /// process; a process entry point starts its top-level supervisor and
    /// then parks here.
    pub async fn serve_forever(&self) {
        self.shutdown.cancelled().await;
    }
}

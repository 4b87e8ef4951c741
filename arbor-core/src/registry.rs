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

//! The process registry: stable logical names for restartable actors.
//!
//! A name is created once for one semantic purpose and re-bound to the
//! current address across supervised restarts; minting fresh names
//! dynamically is the classic way to exhaust a name table and is refused
//! by [`Registry::register`] when the name is still bound to a live
//! actor. Resolution always returns the current binding; callers must
//! not cache an address beyond a single lookup if they want restart
//! transparency.
//!
//! The registry is an explicit handle, not ambient global state: the
//! owning [`Runtime`](crate::runtime::Runtime) hands out clones.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{instrument, trace};

use crate::actor::ActorHandle;
use crate::errors::RegistryError;
use crate::message::Address;
use crate::runtime::Spawned;

struct Registration {
    address: Box<dyn Any + Send + Sync>,
    handle: ActorHandle,
}

/// Maps logical names to the current address of an actor.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<DashMap<String, Registration>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("registered", &self.entries.len())
            .finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to the given actor.
    ///
    /// Fails with [`RegistryError::NameTaken`] when the name is bound to a
    /// live actor of a different identity; rebinding across restarts goes
    /// through [`Registry::rebind`] instead.
    #[instrument(skip(self, spawned), fields(actor = %spawned.handle.id()))]
    pub fn register<M: Send + 'static>(
        &self,
        name: &str,
        spawned: &Spawned<M>,
    ) -> Result<(), RegistryError> {
        use dashmap::mapref::entry::Entry;

        let registration = Registration {
            address: Box::new(spawned.address.clone()),
            handle: spawned.handle.clone(),
        };
        match self.entries.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(registration);
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get();
                if current.handle.is_alive() && current.handle != spawned.handle {
                    return Err(RegistryError::NameTaken(name.to_string()));
                }
                slot.insert(registration);
                Ok(())
            }
        }
    }

    /// Re-binds `name` unconditionally and atomically.
    ///
    /// Used after a supervised restart: there is never a window where the
    /// name resolves to nothing, only the normal delivery-to-dead-address
    /// window before the new binding lands.
    #[instrument(skip(self, spawned), fields(actor = %spawned.handle.id()))]
    pub fn rebind<M: Send + 'static>(&self, name: &str, spawned: &Spawned<M>) {
        trace!(generation = spawned.handle.generation(), "rebinding");
        self.entries.insert(
            name.to_string(),
            Registration {
                address: Box::new(spawned.address.clone()),
                handle: spawned.handle.clone(),
            },
        );
    }

    /// Resolves `name` to the current address, if bound to an actor whose
    /// message type is `M`.
    #[must_use]
    pub fn resolve<M: Send + 'static>(&self, name: &str) -> Option<Address<M>> {
        self.entries
            .get(name)
            .and_then(|entry| entry.address.downcast_ref::<Address<M>>().cloned())
    }

    /// Looks up the lifecycle handle bound to `name`.
    #[must_use]
    pub fn lookup_handle(&self, name: &str) -> Option<ActorHandle> {
        self.entries.get(name).map(|entry| entry.handle.clone())
    }

    /// Removes the binding for `name`. Returns `false` when nothing was
    /// bound.
    pub fn unregister(&self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Number of current bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

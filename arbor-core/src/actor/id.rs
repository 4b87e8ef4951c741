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

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::CONFIG;

static NEXT_GENERATED: AtomicU64 = AtomicU64::new(0);

/// The logical identity of an actor.
///
/// An `ActorId` names the actor across restarts; the incarnation is
/// distinguished separately by a generation counter. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Arc<str>);

impl ActorId {
    /// Creates an id from a logical name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Creates a unique auto-generated id for an unnamed actor.
    #[must_use]
    pub(crate) fn generated() -> Self {
        let n = NEXT_GENERATED.fetch_add(1, Ordering::Relaxed);
        Self(Arc::from(
            format!("{}-{n}", CONFIG.defaults.actor_name).as_str(),
        ))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ActorId {
    fn from(name: String) -> Self {
        Self(Arc::from(name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_name() {
        assert_eq!(ActorId::new("worker"), ActorId::from("worker"));
        assert_ne!(ActorId::new("worker"), ActorId::new("other"));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ActorId::generated();
        let b = ActorId::generated();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("actor-"));
    }
}

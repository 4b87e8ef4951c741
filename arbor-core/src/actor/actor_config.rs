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

use crate::mailbox::MailboxPolicy;

/// Per-spawn actor configuration.
///
/// Everything here is fixed for the lifetime of the incarnation. The
/// generation is set by supervisors when restarting a child; direct spawns
/// start at generation zero.
#[derive(Debug, Clone, Default)]
pub struct ActorConfig {
    pub(crate) name: Option<String>,
    pub(crate) mailbox: MailboxPolicy,
    pub(crate) generation: u64,
}

impl ActorConfig {
    /// Configuration with defaults: auto-generated name, the configured
    /// default mailbox policy, generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the actor's logical name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the mailbox policy for this actor.
    #[must_use]
    pub const fn mailbox(mut self, policy: MailboxPolicy) -> Self {
        self.mailbox = policy;
        self
    }

    /// Sets the incarnation number. Supervisors bump this on every restart
    /// so stale timers and replies can be told apart from current ones.
    #[must_use]
    pub const fn generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }
}

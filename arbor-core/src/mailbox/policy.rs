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

use crate::config::CONFIG;

/// What a bounded mailbox does when a sender finds it full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverflowPolicy {
    /// The sender waits until capacity frees up.
    Block,

    /// The enqueue fails immediately with
    /// [`SendError::MailboxFull`](crate::errors::SendError).
    Fail,
}

/// Per-actor mailbox sizing, fixed at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailboxPolicy {
    /// No capacity limit; enqueueing never waits.
    Unbounded,

    /// At most `capacity` queued envelopes; `on_full` governs saturation.
    Bounded {
        /// Maximum number of queued envelopes.
        capacity: usize,
        /// Behavior when the mailbox is saturated.
        on_full: OverflowPolicy,
    },
}

impl MailboxPolicy {
    /// A bounded mailbox with the given capacity that blocks senders when
    /// saturated.
    #[must_use]
    pub const fn bounded(capacity: usize) -> Self {
        Self::Bounded {
            capacity,
            on_full: OverflowPolicy::Block,
        }
    }

    /// A bounded mailbox with the given capacity that rejects senders when
    /// saturated.
    #[must_use]
    pub const fn bounded_failing(capacity: usize) -> Self {
        Self::Bounded {
            capacity,
            on_full: OverflowPolicy::Fail,
        }
    }

    /// An unbounded mailbox.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self::Unbounded
    }
}

impl Default for MailboxPolicy {
    fn default() -> Self {
        Self::Bounded {
            capacity: CONFIG.limits.mailbox_capacity,
            on_full: OverflowPolicy::Block,
        }
    }
}

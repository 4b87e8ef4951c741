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

use std::time::SystemTime;

use static_assertions::assert_impl_all;

/// A message in flight to an actor's mailbox.
///
/// Envelopes are immutable once enqueued. Delivery order is FIFO for any
/// single sender→receiver pair; no order is guaranteed across senders.
#[derive(Debug)]
pub struct Envelope<M> {
    /// The message carried by the envelope.
    pub payload: M,
    /// When the envelope was created.
    pub sent_at: SystemTime,
    /// Generation of the incarnation this envelope was produced for, when
    /// known. Stamped by the timer service and by piped helper tasks so a
    /// later incarnation can discard stale deliveries.
    origin_generation: Option<u64>,
}

impl<M> Envelope<M> {
    /// Wraps a payload for immediate delivery.
    pub(crate) fn new(payload: M) -> Self {
        Self {
            payload,
            sent_at: SystemTime::now(),
            origin_generation: None,
        }
    }

    /// Wraps a payload stamped with the generation it was produced for.
    pub(crate) fn with_origin(payload: M, generation: u64) -> Self {
        Self {
            payload,
            sent_at: SystemTime::now(),
            origin_generation: Some(generation),
        }
    }

    /// The generation this envelope was produced for, if stamped.
    #[must_use]
    pub const fn origin_generation(&self) -> Option<u64> {
        self.origin_generation
    }
}

// Ensures that envelopes can cross task boundaries.
assert_impl_all!(Envelope<()>: Send);

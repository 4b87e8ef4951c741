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

use std::hash::{Hash, Hasher};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::instrument;

use crate::actor::ActorId;
use crate::errors::{CallError, SendError};
use crate::mailbox::MailboxSender;
use crate::message::{Envelope, ReplyTo};

/// An opaque, copyable handle to one incarnation of an actor's mailbox.
///
/// An address grants message delivery and nothing else: it carries no
/// ownership of the actor, so cyclic address-holding between actors is
/// safe by construction. Sending to a terminated actor returns
/// [`SendError::Closed`]; it never panics the sender.
///
/// Equality is by incarnation: two addresses are equal only when they
/// point at the same mailbox of the same generation.
#[derive(Debug)]
pub struct Address<M> {
    sender: MailboxSender<M>,
    id: ActorId,
    generation: u64,
}

impl<M> Clone for Address<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            id: self.id.clone(),
            generation: self.generation,
        }
    }
}

impl<M> PartialEq for Address<M> {
    fn eq(&self, other: &Self) -> bool {
        // Mailbox identity, not logical name: two incarnations can share a
        // name and even a generation (after a restarted subtree resets its
        // counters) but never a mailbox.
        self.generation == other.generation && self.sender.same_channel(&other.sender)
    }
}

impl<M> Eq for Address<M> {}

// Hashing uses the logical identity; equal addresses share an id and a
// generation, so the `Eq`/`Hash` contract holds.
impl<M> Hash for Address<M> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.generation.hash(state);
    }
}

impl<M: Send + 'static> Address<M> {
    pub(crate) fn new(sender: MailboxSender<M>, id: ActorId, generation: u64) -> Self {
        Self {
            sender,
            id,
            generation,
        }
    }

    /// The logical id of the actor behind this address.
    #[must_use]
    pub const fn id(&self) -> &ActorId {
        &self.id
    }

    /// The incarnation this address points at. Bumped on every supervised
    /// restart, so addresses from a previous incarnation compare unequal.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` once the target incarnation has terminated.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Enqueues a message and returns immediately: fire-and-forget,
    /// at-most-once, no acknowledgment.
    ///
    /// Only a saturated bounded-blocking mailbox makes this wait.
    #[instrument(skip_all, fields(to = %self.id))]
    pub async fn cast(&self, message: M) -> Result<(), SendError> {
        self.sender.enqueue(Envelope::new(message)).await
    }

    /// Sends a request and waits for the reply, bounded by `timeout`.
    ///
    /// The builder closure receives a fresh one-shot [`ReplyTo`] and must
    /// embed it in the request message. On timeout the reply listener is
    /// dropped before this returns: a late reply lands on a closed channel
    /// and is discarded, so repeated timeouts leave nothing behind. The
    /// runtime never retries a call; retry is caller policy.
    ///
    /// An actor must never `call` its own address from inside its handler:
    /// its mailbox is not serviced while the handler runs, so the call can
    /// only time out.
    #[instrument(skip_all, fields(to = %self.id))]
    pub async fn call<R, F>(&self, timeout: Duration, build: F) -> Result<R, CallError>
    where
        R: Send + 'static,
        F: FnOnce(ReplyTo<R>) -> M,
    {
        let (tx, rx) = oneshot::channel();
        self.cast(build(ReplyTo::new(tx)))
            .await
            .map_err(CallError::Send)?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(CallError::NoReply),
            Err(_) => Err(CallError::Timeout(timeout)),
        }
    }

    /// Enqueues a pre-stamped envelope; used by the timer service and by
    /// piped helper tasks.
    pub(crate) async fn send_envelope(&self, envelope: Envelope<M>) -> Result<(), SendError> {
        self.sender.enqueue(envelope).await
    }
}

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

//! Per-actor FIFO mailboxes.
//!
//! A mailbox accepts concurrent enqueues from any number of senders and is
//! drained by exactly one consumer, the owning actor's loop. It is the only
//! concurrently shared structure in the runtime; everything else is owned
//! by a single loop.

mod policy;

use std::task::{Context, Poll};

use tokio::sync::mpsc;

pub use policy::{MailboxPolicy, OverflowPolicy};

use crate::errors::SendError;
use crate::message::Envelope;

/// The sending half of an actor mailbox.
#[derive(Debug)]
pub(crate) enum MailboxSender<M> {
    /// Bounded channel; `on_full` governs saturation behavior.
    Bounded {
        tx: mpsc::Sender<Envelope<M>>,
        on_full: OverflowPolicy,
    },
    /// Unbounded channel.
    Unbounded(mpsc::UnboundedSender<Envelope<M>>),
}

// Manual impl: `M` itself need not be `Clone` for the sender to be.
impl<M> Clone for MailboxSender<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Bounded { tx, on_full } => Self::Bounded {
                tx: tx.clone(),
                on_full: *on_full,
            },
            Self::Unbounded(tx) => Self::Unbounded(tx.clone()),
        }
    }
}

/// The receiving half of an actor mailbox, owned by the actor's loop.
#[derive(Debug)]
pub(crate) enum MailboxReceiver<M> {
    Bounded(mpsc::Receiver<Envelope<M>>),
    Unbounded(mpsc::UnboundedReceiver<Envelope<M>>),
}

/// Creates a mailbox channel for the given policy.
pub(crate) fn channel<M>(policy: MailboxPolicy) -> (MailboxSender<M>, MailboxReceiver<M>) {
    match policy {
        MailboxPolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (MailboxSender::Unbounded(tx), MailboxReceiver::Unbounded(rx))
        }
        MailboxPolicy::Bounded { capacity, on_full } => {
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (
                MailboxSender::Bounded { tx, on_full },
                MailboxReceiver::Bounded(rx),
            )
        }
    }
}

impl<M> MailboxSender<M> {
    /// Enqueues an envelope.
    ///
    /// Waits only for a saturated bounded mailbox whose policy is
    /// [`OverflowPolicy::Block`]; every other configuration returns
    /// immediately.
    pub(crate) async fn enqueue(&self, envelope: Envelope<M>) -> Result<(), SendError> {
        match self {
            Self::Unbounded(tx) => tx.send(envelope).map_err(Into::into),
            Self::Bounded {
                tx,
                on_full: OverflowPolicy::Block,
            } => tx.send(envelope).await.map_err(Into::into),
            Self::Bounded {
                tx,
                on_full: OverflowPolicy::Fail,
            } => tx.try_send(envelope).map_err(Into::into),
        }
    }

    /// Whether both senders feed the same underlying channel.
    pub(crate) fn same_channel(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bounded { tx: a, .. }, Self::Bounded { tx: b, .. }) => a.same_channel(b),
            (Self::Unbounded(a), Self::Unbounded(b)) => a.same_channel(b),
            _ => false,
        }
    }

    /// Returns `true` once the consumer is gone.
    pub(crate) fn is_closed(&self) -> bool {
        match self {
            Self::Bounded { tx, .. } => tx.is_closed(),
            Self::Unbounded(tx) => tx.is_closed(),
        }
    }
}

impl<M> MailboxReceiver<M> {
    /// Awaits the next envelope; `None` once every sender is gone.
    pub(crate) async fn dequeue(&mut self) -> Option<Envelope<M>> {
        match self {
            Self::Bounded(rx) => rx.recv().await,
            Self::Unbounded(rx) => rx.recv().await,
        }
    }

    /// Poll-based dequeue, used by the selector merge.
    pub(crate) fn poll_dequeue(&mut self, cx: &mut Context<'_>) -> Poll<Option<Envelope<M>>> {
        match self {
            Self::Bounded(rx) => rx.poll_recv(cx),
            Self::Unbounded(rx) => rx.poll_recv(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_per_sender() {
        let (tx, mut rx) = channel::<u32>(MailboxPolicy::unbounded());
        for n in 0..100 {
            tx.enqueue(Envelope::new(n)).await.unwrap();
        }
        for n in 0..100 {
            assert_eq!(rx.dequeue().await.unwrap().payload, n);
        }
    }

    #[tokio::test]
    async fn bounded_failing_reports_saturation() {
        let (tx, _rx) = channel::<u32>(MailboxPolicy::bounded_failing(2));
        tx.enqueue(Envelope::new(1)).await.unwrap();
        tx.enqueue(Envelope::new(2)).await.unwrap();
        let err = tx.enqueue(Envelope::new(3)).await.unwrap_err();
        assert_eq!(err, SendError::MailboxFull);
    }

    #[tokio::test]
    async fn enqueue_after_consumer_drop_fails() {
        let (tx, rx) = channel::<u32>(MailboxPolicy::bounded(4));
        drop(rx);
        let err = tx.enqueue(Envelope::new(1)).await.unwrap_err();
        assert_eq!(err, SendError::Closed);
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn blocking_sender_resumes_when_capacity_frees() {
        let (tx, mut rx) = channel::<u32>(MailboxPolicy::bounded(1));
        tx.enqueue(Envelope::new(1)).await.unwrap();

        let tx2 = tx.clone();
        let pending = tokio::spawn(async move { tx2.enqueue(Envelope::new(2)).await });

        assert_eq!(rx.dequeue().await.unwrap().payload, 1);
        pending.await.unwrap().unwrap();
        assert_eq!(rx.dequeue().await.unwrap().payload, 2);
    }
}

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

//! The timer service: delayed and periodic message delivery.
//!
//! Timers deliver ordinary envelopes, subject to normal mailbox ordering,
//! stamped with the generation of the target incarnation at scheduling
//! time. A timer that outlives a supervised restart therefore cannot reach
//! the successor incarnation: delivery to the old mailbox fails silently,
//! and the generation stamp is the receiver-side backstop for the
//! cancel-versus-fire race.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::message::{Address, Envelope};

/// Outcome of [`TimerHandle::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The timer was still pending; it will not fire. For a periodic timer
    /// the remaining time is until the tick that was cancelled.
    Cancelled {
        /// Time that was left until the (next) firing.
        remaining: Duration,
    },

    /// A one-shot timer had already fired; the message was delivered or is
    /// in the target's mailbox.
    AlreadyFired,
}

/// Handle to a scheduled timer.
#[derive(Debug)]
pub struct TimerHandle {
    cancel: CancellationToken,
    fired: Arc<AtomicBool>,
    next_fire: Arc<Mutex<Instant>>,
    periodic: bool,
}

impl TimerHandle {
    /// Cancels the timer.
    ///
    /// A cancelled timer delivers nothing. When cancel races the firing,
    /// the message may already be in flight; receivers discard envelopes
    /// stamped for an earlier incarnation, which resolves the race for the
    /// restart case the stamp exists for.
    pub fn cancel(&self) -> CancelOutcome {
        self.cancel.cancel();
        if !self.periodic && self.fired.load(Ordering::Acquire) {
            return CancelOutcome::AlreadyFired;
        }
        let next_fire = *self.next_fire.lock().expect("timer deadline poisoned");
        CancelOutcome::Cancelled {
            remaining: next_fire.saturating_duration_since(Instant::now()),
        }
    }

    /// Returns `true` once the timer has fired at least once.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Schedules `message` for delivery to `address` after `delay`.
pub fn schedule_after<M: Send + 'static>(
    address: &Address<M>,
    delay: Duration,
    message: M,
) -> TimerHandle {
    let cancel = CancellationToken::new();
    let fired = Arc::new(AtomicBool::new(false));
    let next_fire = Arc::new(Mutex::new(Instant::now() + delay));

    let address = address.clone();
    let generation = address.generation();
    let task_cancel = cancel.clone();
    let task_fired = fired.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = task_cancel.cancelled() => {}
            () = tokio::time::sleep(delay) => {
                task_fired.store(true, Ordering::Release);
                let envelope = Envelope::with_origin(message, generation);
                if address.send_envelope(envelope).await.is_err() {
                    trace!(target_actor = %address.id(), "timer target gone");
                }
            }
        }
    });

    TimerHandle {
        cancel,
        fired,
        next_fire,
        periodic: false,
    }
}

/// Schedules `make_message()` for delivery to `address` every `every`,
/// first firing after one full interval. The timer stops on cancel or once
/// the target terminates.
pub fn schedule_interval<M, F>(address: &Address<M>, every: Duration, mut make_message: F) -> TimerHandle
where
    M: Send + 'static,
    F: FnMut() -> M + Send + 'static,
{
    let cancel = CancellationToken::new();
    let fired = Arc::new(AtomicBool::new(false));
    let next_fire = Arc::new(Mutex::new(Instant::now() + every));

    let address = address.clone();
    let generation = address.generation();
    let task_cancel = cancel.clone();
    let task_fired = fired.clone();
    let task_next_fire = next_fire.clone();
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + every;
        let mut ticks = tokio::time::interval_at(start, every);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = task_cancel.cancelled() => break,
                _ = ticks.tick() => {
                    task_fired.store(true, Ordering::Release);
                    *task_next_fire.lock().expect("timer deadline poisoned") =
                        Instant::now() + every;
                    let envelope = Envelope::with_origin(make_message(), generation);
                    if address.send_envelope(envelope).await.is_err() {
                        trace!(target_actor = %address.id(), "interval target gone, stopping");
                        break;
                    }
                }
            }
        }
    });

    TimerHandle {
        cancel,
        fired,
        next_fire,
        periodic: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;
    use crate::mailbox::{self, MailboxPolicy};

    fn target() -> (Address<u32>, mailbox::MailboxReceiver<u32>) {
        let (tx, rx) = mailbox::channel(MailboxPolicy::unbounded());
        (Address::new(tx, ActorId::new("timer-target"), 0), rx)
    }

    #[tokio::test]
    async fn fires_after_delay() {
        let (address, mut rx) = target();
        let handle = schedule_after(&address, Duration::from_millis(10), 42);

        let envelope = rx.dequeue().await.unwrap();
        assert_eq!(envelope.payload, 42);
        assert_eq!(envelope.origin_generation(), Some(0));
        assert!(handle.has_fired());
        assert_eq!(handle.cancel(), CancelOutcome::AlreadyFired);
    }

    #[tokio::test]
    async fn cancel_before_fire_prevents_delivery() {
        let (address, mut rx) = target();
        let handle = schedule_after(&address, Duration::from_secs(60), 42);

        match handle.cancel() {
            CancelOutcome::Cancelled { remaining } => {
                assert!(remaining > Duration::from_secs(50));
            }
            CancelOutcome::AlreadyFired => panic!("timer cannot have fired yet"),
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(address);
        // No senders left but the timer task's clone; it was cancelled, so
        // the channel drains empty.
        assert!(rx.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn interval_keeps_firing_until_cancelled() {
        let (address, mut rx) = target();
        let mut n = 0;
        let handle = schedule_interval(&address, Duration::from_millis(5), move || {
            n += 1;
            n
        });

        assert_eq!(rx.dequeue().await.unwrap().payload, 1);
        assert_eq!(rx.dequeue().await.unwrap().payload, 2);
        assert_eq!(rx.dequeue().await.unwrap().payload, 3);

        match handle.cancel() {
            CancelOutcome::Cancelled { .. } => {}
            CancelOutcome::AlreadyFired => panic!("periodic cancel always reports Cancelled"),
        }
    }
}

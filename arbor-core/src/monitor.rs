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

//! One-way termination observation between actors.
//!
//! A monitor is not a link and carries no ownership: watcher and watched
//! remain independent. When the watched actor terminates, every watcher
//! receives a [`MonitorSignal`] through its own notification channel,
//! serviced by the watcher's selector. Watching an already-terminated
//! actor delivers the recorded exit immediately.

use std::sync::Mutex;

use static_assertions::assert_impl_all;
use tokio::sync::mpsc;

use crate::actor::ActorId;
use crate::errors::ExitReason;

/// Notification that a watched actor has terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSignal {
    /// Logical id of the terminated actor.
    pub id: ActorId,
    /// The incarnation that terminated.
    pub generation: u64,
    /// Why it terminated.
    pub reason: ExitReason,
}

assert_impl_all!(MonitorSignal: Send);

/// Identifies one watch registration, for removal via `unwatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchRef(u64);

/// The watcher list held by an actor cell.
///
/// Notification must never stall a terminating loop, so watcher channels
/// are unbounded. The table records the terminal signal so late watchers
/// are notified immediately.
#[derive(Debug, Default)]
pub(crate) struct WatcherTable {
    next_ref: u64,
    entries: Vec<(u64, mpsc::UnboundedSender<MonitorSignal>)>,
    terminal: Option<MonitorSignal>,
}

impl WatcherTable {
    pub(crate) fn subscribe(
        table: &Mutex<Self>,
        tx: mpsc::UnboundedSender<MonitorSignal>,
    ) -> WatchRef {
        let mut guard = table.lock().expect("watcher table poisoned");
        if let Some(signal) = &guard.terminal {
            // Already dead: notify immediately, nothing to retain.
            let _ = tx.send(signal.clone());
            let watch_ref = WatchRef(guard.next_ref);
            guard.next_ref += 1;
            return watch_ref;
        }
        let watch_ref = WatchRef(guard.next_ref);
        guard.next_ref += 1;
        guard.entries.push((watch_ref.0, tx));
        watch_ref
    }

    pub(crate) fn unsubscribe(table: &Mutex<Self>, watch_ref: WatchRef) -> bool {
        let mut guard = table.lock().expect("watcher table poisoned");
        let before = guard.entries.len();
        guard.entries.retain(|(id, _)| *id != watch_ref.0);
        guard.entries.len() != before
    }

    pub(crate) fn notify(table: &Mutex<Self>, signal: MonitorSignal) {
        let entries = {
            let mut guard = table.lock().expect("watcher table poisoned");
            guard.terminal = Some(signal.clone());
            std::mem::take(&mut guard.entries)
        };
        for (_, tx) in entries {
            // A watcher that terminated first has dropped its receiver.
            let _ = tx.send(signal.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal() -> MonitorSignal {
        MonitorSignal {
            id: ActorId::new("target"),
            generation: 0,
            reason: ExitReason::Normal,
        }
    }

    #[test]
    fn notify_reaches_all_watchers() {
        let table = Mutex::new(WatcherTable::default());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        WatcherTable::subscribe(&table, tx1);
        WatcherTable::subscribe(&table, tx2);

        WatcherTable::notify(&table, signal());
        assert_eq!(rx1.try_recv().unwrap(), signal());
        assert_eq!(rx2.try_recv().unwrap(), signal());
    }

    #[test]
    fn unsubscribed_watcher_is_not_notified() {
        let table = Mutex::new(WatcherTable::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watch_ref = WatcherTable::subscribe(&table, tx);
        assert!(WatcherTable::unsubscribe(&table, watch_ref));

        WatcherTable::notify(&table, signal());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn late_watcher_gets_terminal_signal() {
        let table = Mutex::new(WatcherTable::default());
        WatcherTable::notify(&table, signal());

        let (tx, mut rx) = mpsc::unbounded_channel();
        WatcherTable::subscribe(&table, tx);
        assert_eq!(rx.try_recv().unwrap(), signal());
    }
}

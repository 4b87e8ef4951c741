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

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::actor::ActorId;
use crate::errors::ExitReason;
use crate::monitor::{MonitorSignal, WatchRef, WatcherTable};

/// Lifecycle stage of an actor incarnation.
///
/// Stages advance monotonically:
/// `Starting → Running → (Stopping | Crashed) → Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    /// Running its `init` function; not yet receiving.
    Starting,
    /// Processing messages.
    Running,
    /// Winding down after a stop request or a `Next::Stop`.
    Stopping,
    /// Terminating abnormally.
    Crashed,
    /// Gone. Watchers have been notified.
    Terminated,
}

impl LifecycleStage {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Running => 1,
            Self::Stopping => 2,
            Self::Crashed => 3,
            Self::Terminated => 4,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Running,
            2 => Self::Stopping,
            3 => Self::Crashed,
            _ => Self::Terminated,
        }
    }
}

/// Shared record of one actor incarnation: identity, lifecycle stage, and
/// the watcher table. Mutated by the owning loop; observed by handles.
#[derive(Debug)]
pub(crate) struct ActorCell {
    id: ActorId,
    generation: u64,
    stage: AtomicU8,
    watchers: Mutex<WatcherTable>,
}

impl ActorCell {
    pub(crate) fn new(id: ActorId, generation: u64) -> Self {
        Self {
            id,
            generation,
            stage: AtomicU8::new(LifecycleStage::Starting.as_u8()),
            watchers: Mutex::new(WatcherTable::default()),
        }
    }

    pub(crate) fn id(&self) -> &ActorId {
        &self.id
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn stage(&self) -> LifecycleStage {
        LifecycleStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    pub(crate) fn set_stage(&self, stage: LifecycleStage) {
        self.stage.store(stage.as_u8(), Ordering::Release);
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.stage() != LifecycleStage::Terminated
    }

    pub(crate) fn subscribe(&self, tx: mpsc::UnboundedSender<MonitorSignal>) -> WatchRef {
        WatcherTable::subscribe(&self.watchers, tx)
    }

    pub(crate) fn unsubscribe(&self, watch_ref: WatchRef) -> bool {
        WatcherTable::unsubscribe(&self.watchers, watch_ref)
    }

    /// Records the terminal stage and notifies every watcher. Called
    /// exactly once, by the owning loop, as its final act.
    pub(crate) fn notify_exit(&self, reason: ExitReason) {
        self.set_stage(LifecycleStage::Terminated);
        WatcherTable::notify(
            &self.watchers,
            MonitorSignal {
                id: self.id.clone(),
                generation: self.generation,
                reason,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_round_trip() {
        for stage in [
            LifecycleStage::Starting,
            LifecycleStage::Running,
            LifecycleStage::Stopping,
            LifecycleStage::Crashed,
            LifecycleStage::Terminated,
        ] {
            assert_eq!(LifecycleStage::from_u8(stage.as_u8()), stage);
        }
    }

    #[test]
    fn notify_exit_terminates_and_signals() {
        let cell = ActorCell::new(ActorId::new("worker"), 3);
        let (tx, mut rx) = mpsc::unbounded_channel();
        cell.subscribe(tx);

        cell.notify_exit(ExitReason::Normal);
        assert!(!cell.is_alive());

        let signal = rx.try_recv().unwrap();
        assert_eq!(signal.id, ActorId::new("worker"));
        assert_eq!(signal.generation, 3);
        assert_eq!(signal.reason, ExitReason::Normal);
    }
}

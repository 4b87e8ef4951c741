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

//! Merging multiple input sources into an actor's single blocking wait.
//!
//! A selector lets one actor loop service its own mailbox, extra channels,
//! and monitor down-signals through one wait point, preserving the
//! one-event-at-a-time sequential guarantee. Each extra source carries a
//! [`SourceTag`] and a mapping closure that converts its payloads into the
//! actor's own message type.
//!
//! [`Selector::new`] starts empty: installing it replaces whatever was
//! installed before, and re-including the actor's own mailbox (via
//! [`Selector::mailbox`] or by starting from [`Selector::with_mailbox`])
//! is the caller's responsibility. The runtime logs a warning when an
//! installed selector omits the mailbox, but honors it.

use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tracing::trace;

use crate::monitor::MonitorSignal;

/// Identifies an extra selector source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceTag(Arc<str>);

impl SourceTag {
    /// Creates a tag from a label.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self(Arc::from(label))
    }

    /// The tag's label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceTag {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

trait SourcePoll<M>: Send {
    fn poll_source(&mut self, cx: &mut Context<'_>) -> Poll<Option<M>>;
}

struct MappedChannel<T, M> {
    rx: mpsc::Receiver<T>,
    map: Box<dyn FnMut(T) -> M + Send>,
}

impl<T: Send, M: Send> SourcePoll<M> for MappedChannel<T, M> {
    fn poll_source(&mut self, cx: &mut Context<'_>) -> Poll<Option<M>> {
        self.rx
            .poll_recv(cx)
            .map(|item| item.map(|payload| (self.map)(payload)))
    }
}

struct TaggedSource<M> {
    tag: SourceTag,
    source: Box<dyn SourcePoll<M>>,
}

/// A merge of input sources serviced by one actor loop.
pub struct Selector<M> {
    include_mailbox: bool,
    on_monitor: Option<Box<dyn FnMut(MonitorSignal) -> M + Send>>,
    sources: Vec<TaggedSource<M>>,
}

impl<M> std::fmt::Debug for Selector<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("include_mailbox", &self.include_mailbox)
            .field("maps_monitors", &self.on_monitor.is_some())
            .field(
                "sources",
                &self.sources.iter().map(|s| s.tag.clone()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<M: Send + 'static> Selector<M> {
    /// An empty selector. The actor's own mailbox is NOT included.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_mailbox: false,
            on_monitor: None,
            sources: Vec::new(),
        }
    }

    /// A selector that services the actor's own mailbox.
    #[must_use]
    pub fn with_mailbox() -> Self {
        Self::new().mailbox()
    }

    /// Includes the actor's own mailbox in the merge.
    #[must_use]
    pub fn mailbox(mut self) -> Self {
        self.include_mailbox = true;
        self
    }

    /// Maps monitor down-signals into the actor's message type.
    ///
    /// Without this mapping, down-signals for watched actors are logged
    /// and dropped.
    #[must_use]
    pub fn on_monitor(mut self, map: impl FnMut(MonitorSignal) -> M + Send + 'static) -> Self {
        self.on_monitor = Some(Box::new(map));
        self
    }

    /// Adds an extra channel source whose payloads are mapped into the
    /// actor's message type.
    #[must_use]
    pub fn source<T: Send + 'static>(
        mut self,
        tag: impl Into<SourceTag>,
        rx: mpsc::Receiver<T>,
        map: impl FnMut(T) -> M + Send + 'static,
    ) -> Self {
        self.sources.push(TaggedSource {
            tag: tag.into(),
            source: Box::new(MappedChannel {
                rx,
                map: Box::new(map),
            }),
        });
        self
    }

    /// Removes an extra source by tag. Returns `false` when no source
    /// carried the tag.
    pub fn remove_source(&mut self, tag: &SourceTag) -> bool {
        let before = self.sources.len();
        self.sources.retain(|s| s.tag != *tag);
        self.sources.len() != before
    }

    /// Whether the actor's own mailbox is part of the merge.
    #[must_use]
    pub const fn includes_mailbox(&self) -> bool {
        self.include_mailbox
    }

    pub(crate) fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    pub(crate) fn map_monitor(&mut self, signal: MonitorSignal) -> Option<M> {
        self.on_monitor.as_mut().map(|map| map(signal))
    }

    /// Polls the extra sources in registration order. Exhausted sources
    /// (sender side dropped) are pruned.
    pub(crate) fn poll_sources(&mut self, cx: &mut Context<'_>) -> Poll<(SourceTag, M)> {
        let mut index = 0;
        while index < self.sources.len() {
            match self.sources[index].source.poll_source(cx) {
                Poll::Ready(Some(message)) => {
                    let tag = self.sources[index].tag.clone();
                    return Poll::Ready((tag, message));
                }
                Poll::Ready(None) => {
                    let tag = self.sources.remove(index).tag;
                    trace!(source = %tag, "selector source exhausted, removed");
                }
                Poll::Pending => index += 1,
            }
        }
        Poll::Pending
    }
}

impl<M: Send + 'static> Default for Selector<M> {
    fn default() -> Self {
        Self::with_mailbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;
    use crate::errors::ExitReason;
    use std::future::poll_fn;

    #[tokio::test]
    async fn sources_are_mapped_and_tagged() {
        let (tx, rx) = mpsc::channel::<u32>(8);
        let mut selector: Selector<String> =
            Selector::with_mailbox().source("ticks", rx, |n| format!("tick-{n}"));

        tx.send(7).await.unwrap();
        let (tag, message) = poll_fn(|cx| selector.poll_sources(cx)).await;
        assert_eq!(tag.as_str(), "ticks");
        assert_eq!(message, "tick-7");
    }

    #[tokio::test]
    async fn exhausted_source_is_pruned() {
        let (tx, rx) = mpsc::channel::<u32>(8);
        let mut selector: Selector<u32> = Selector::with_mailbox().source("ticks", rx, |n| n);
        drop(tx);

        // Drained and removed: the poll stays pending afterwards.
        let pending = poll_fn(|cx| {
            let poll = selector.poll_sources(cx);
            Poll::Ready(matches!(poll, Poll::Pending))
        })
        .await;
        assert!(pending);
        assert!(!selector.has_sources());
    }

    #[test]
    fn monitor_mapping_is_optional() {
        let mut bare: Selector<u32> = Selector::with_mailbox();
        let signal = MonitorSignal {
            id: ActorId::new("watched"),
            generation: 0,
            reason: ExitReason::Normal,
        };
        assert!(bare.map_monitor(signal.clone()).is_none());

        let mut mapped: Selector<u32> = Selector::with_mailbox().on_monitor(|sig| sig.generation as u32);
        assert_eq!(mapped.map_monitor(signal), Some(0));
    }

    #[test]
    fn remove_source_by_tag() {
        let (_tx, rx) = mpsc::channel::<u32>(8);
        let mut selector: Selector<u32> = Selector::new().source("ticks", rx, |n| n);
        assert!(selector.remove_source(&SourceTag::new("ticks")));
        assert!(!selector.remove_source(&SourceTag::new("ticks")));
        assert!(!selector.includes_mailbox());
    }
}

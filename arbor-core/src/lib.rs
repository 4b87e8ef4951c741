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

#![forbid(unsafe_code)]
#![forbid(missing_docs)] // Keep this to enforce coverage

//! # Arbor Core
//!
//! This crate provides the messaging and execution plumbing for the Arbor
//! actor runtime, built on top of Tokio: mailboxes, typed addresses, the
//! actor execution loop, multi-source selectors, the timer service,
//! monitor links, the process registry, and the runtime handle that ties
//! them together.
//!
//! ## Key Concepts
//!
//! - **Actors ([`Actor`])**: isolated units of sequential computation; the
//!   implementing value is the actor's private state.
//! - **Addresses ([`Address`])**: opaque, copyable message-delivery
//!   handles, the only way in from outside.
//! - **Mailboxes**: per-actor FIFO queues, bounded or unbounded per
//!   [`MailboxPolicy`], the runtime's only concurrently shared structure.
//! - **Selectors ([`Selector`])**: merge the mailbox, extra channels, and
//!   monitor signals into one blocking wait.
//! - **Monitors**: one-way termination observation delivering a
//!   [`MonitorSignal`] to each watcher.
//! - **Registry ([`Registry`])**: stable logical names re-bound across
//!   supervised restarts.
//! - **Runtime ([`Runtime`])**: spawning, tracking, and shutdown.
//!
//! Supervision trees live one layer up, in the `arbor` crate.

pub mod actor;
pub mod config;
pub mod errors;
pub mod mailbox;
pub mod message;
pub mod monitor;
pub mod registry;
pub mod runtime;
pub mod selector;
pub mod timer;

pub use actor::{
    Actor, ActorConfig, ActorContext, ActorHandle, ActorId, LifecycleStage, Next,
};
pub use config::{ArborConfig, CONFIG};
pub use errors::{CallError, ExitReason, RegistryError, SendError, StartError};
pub use mailbox::{MailboxPolicy, OverflowPolicy};
pub use message::{Address, Envelope, ReplyTo};
pub use monitor::{MonitorSignal, WatchRef};
pub use registry::Registry;
pub use runtime::{Runtime, Spawned};
pub use selector::{Selector, SourceTag};
pub use timer::{schedule_after, schedule_interval, CancelOutcome, TimerHandle};

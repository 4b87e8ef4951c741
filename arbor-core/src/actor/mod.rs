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

//! The actor abstraction: an isolated unit of sequential computation.
//!
//! An actor owns private state (the [`Actor`] implementation value), a
//! mailbox, and a logical identity. It processes one message at a time to
//! completion; the only way in from outside is a typed
//! [`Address`](crate::message::Address), the only lifecycle control is the
//! untyped [`ActorHandle`]. No state is ever shared between actors, so a
//! crash in one cannot corrupt another.

mod actor_config;
mod cell;
mod context;
mod handle;
mod id;
mod runner;

use async_trait::async_trait;

pub use actor_config::ActorConfig;
pub use cell::LifecycleStage;
pub use context::ActorContext;
pub use handle::ActorHandle;
pub use id::ActorId;

pub(crate) use cell::ActorCell;
pub(crate) use runner::run_actor;

use crate::errors::{ExitReason, StartError};

/// What the loop should do after a handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Keep processing messages.
    Continue,

    /// Stop cleanly with [`ExitReason::Normal`].
    Stop,

    /// Stop abnormally with [`ExitReason::Crashed`] carrying the details.
    /// Supervisors treat this exactly like a panic.
    StopAbnormal(String),
}

/// A stateful, message-driven worker.
///
/// The implementing value IS the actor's private state; the runtime moves
/// it into the actor's own task at spawn and nothing else ever touches it.
/// Handlers must not block inline; delegate slow or blocking work through
/// [`ActorContext::pipe_task`] so the mailbox keeps being serviced. A
/// handler that issues a synchronous [`call`](crate::message::Address::call)
/// to its own address always deadlocks, because the mailbox is not
/// serviced while the handler runs.
#[async_trait]
pub trait Actor: Send + 'static {
    /// The closed set of messages this actor understands.
    type Msg: Send + 'static;

    /// Runs before the first message. Failing, panicking, or exceeding the
    /// configured init bound crashes the actor before it ever runs; a
    /// supervisor treats that exactly like a runtime crash.
    async fn init(&mut self, ctx: &mut ActorContext<Self::Msg>) -> Result<(), StartError> {
        let _ = ctx;
        Ok(())
    }

    /// Processes one message. Runs to completion before the next dequeue.
    async fn handle(&mut self, message: Self::Msg, ctx: &mut ActorContext<Self::Msg>) -> Next;

    /// Runs on every termination path except a forced kill, after the loop
    /// has stopped dequeuing.
    async fn on_stop(&mut self, reason: &ExitReason, ctx: &mut ActorContext<Self::Msg>) {
        let _ = (reason, ctx);
    }
}

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

//! # Arbor
//!
//! An actor runtime with Erlang/OTP-style supervision trees, built on top
//! of Tokio. Actors are isolated, stateful, message-driven workers;
//! supervisors detect child failure and restart children under
//! configurable strategies, with a windowed restart budget that escalates
//! runaway failure up the tree.
//!
//! ## Key Concepts
//!
//! - **Actors**: implement [`Actor`](prelude::Actor): private state, a
//!   typed message enum, one message processed to completion at a time.
//! - **Addresses**: opaque [`Address`](prelude::Address) handles for
//!   `cast` (fire-and-forget) and `call` (bounded request/reply).
//! - **Supervision**: [`Supervisor::start`](prelude::Supervisor::start)
//!   with a [`SupervisorSpec`](prelude::SupervisorSpec): strategies
//!   `OneForOne` / `OneForAll` / `RestForOne`, restart policies
//!   `Permanent` / `Transient` / `Temporary`, intensity/period budgets.
//! - **Monitors, timers, selectors, registry**: re-exported from
//!   `arbor-core`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use arbor::prelude::*;
//!
//! struct Counter(u64);
//!
//! enum CounterMsg {
//!     Add(u64),
//!     Total(ReplyTo<u64>),
//! }
//!
//! #[async_trait]
//! impl Actor for Counter {
//!     type Msg = CounterMsg;
//!
//!     async fn handle(&mut self, msg: CounterMsg, _ctx: &mut ActorContext<CounterMsg>) -> Next {
//!         match msg {
//!             CounterMsg::Add(n) => self.0 += n,
//!             CounterMsg::Total(reply) => {
//!                 let _ = reply.send(self.0);
//!             }
//!         }
//!         Next::Continue
//!     }
//! }
//! ```

/// Application entry point.
pub mod app;

/// Supervision trees: strategies, policies, budgets, the supervisor actor.
pub mod supervision;

/// Tracing bootstrap helpers.
pub mod telemetry;

/// A prelude module for conveniently importing the most commonly used
/// items.
///
/// # Re-exports
///
/// ## External Crates
/// *   [`async_trait::async_trait`]: the macro for defining async
///     functions in traits, required to implement `Actor`.
///
/// ## Core Types (from `arbor-core`)
/// *   Actor surface: `Actor`, `ActorConfig`, `ActorContext`,
///     `ActorHandle`, `ActorId`, `LifecycleStage`, `Next`.
/// *   Messaging: `Address`, `Envelope`, `ReplyTo`, `MailboxPolicy`,
///     `OverflowPolicy`.
/// *   Failure surface: `CallError`, `ExitReason`, `RegistryError`,
///     `SendError`, `StartError`.
/// *   Observation: `MonitorSignal`, `WatchRef`, `Selector`, `SourceTag`.
/// *   Timers: `schedule_after`, `schedule_interval`, `CancelOutcome`,
///     `TimerHandle`.
/// *   System: `Registry`, `Runtime`, `Spawned`.
///
/// ## Supervision
/// *   `ChildSpec`, `ChildStart`, `StartFuture`, `ChildInfo`,
///     `RestartPolicy`, `RestartLimitExceeded`, `RestartWindow`,
///     `SupervisionDecision`, `SupervisionStrategy`, `Supervisor`,
///     `SupervisorHandle`, `SupervisorMsg`, `SupervisorSpec`.
///
/// ## App
/// *   [`crate::app::ArborApp`]: entry point for launching the runtime.
pub mod prelude {
    pub use async_trait::async_trait;

    pub use arbor_core::{
        schedule_after, schedule_interval, Actor, ActorConfig, ActorContext, ActorHandle,
        ActorId, Address, CallError, CancelOutcome, Envelope, ExitReason, LifecycleStage,
        MailboxPolicy, MonitorSignal, Next, OverflowPolicy, Registry, RegistryError, ReplyTo,
        Runtime, SendError, Spawned, StartError, TimerHandle, Selector, SourceTag, WatchRef,
    };

    pub use crate::app::ArborApp;
    pub use crate::supervision::{
        ChildInfo, ChildSpec, ChildStart, RestartLimitExceeded, RestartPolicy, RestartWindow,
        StartFuture, SupervisionDecision, SupervisionStrategy, Supervisor, SupervisorHandle,
        SupervisorMsg, SupervisorSpec,
    };
}

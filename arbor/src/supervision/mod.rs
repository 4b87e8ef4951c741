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

//! Supervision trees: strategies, restart policies, budgets, and the
//! supervisor actor.
//!
//! A supervisor owns an ordered list of [`ChildSpec`]s, watches each
//! running child, and restarts per [`SupervisionStrategy`] and
//! [`RestartPolicy`], accounting every observed exit against a
//! [`RestartWindow`]. Budget exhaustion escalates: the supervisor itself
//! terminates abnormally and its own supervisor takes over: restart from
//! a known-good ancestor rather than limp along.

mod child_spec;
mod restart_policy;
mod restart_window;
mod strategy;
mod supervisor;

pub use child_spec::{ChildSpec, ChildStart, StartFuture};
pub use restart_policy::RestartPolicy;
pub use restart_window::{RestartLimitExceeded, RestartWindow};
pub use strategy::{SupervisionDecision, SupervisionStrategy};
pub use supervisor::{ChildInfo, Supervisor, SupervisorHandle, SupervisorMsg, SupervisorSpec};

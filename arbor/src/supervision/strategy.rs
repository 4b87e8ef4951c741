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

//! Supervision strategies for scoping restarts.
//!
//! When a supervised child exits, the strategy determines which children
//! are affected. The decision combines the strategy with the child's
//! [`RestartPolicy`] and exit reason.
//!
//! # Strategies
//!
//! - [`SupervisionStrategy::OneForOne`]: restart only the failed child
//! - [`SupervisionStrategy::OneForAll`]: restart all children when one fails
//! - [`SupervisionStrategy::RestForOne`]: restart the failed child and all
//!   children started after it

use arbor_core::ExitReason;
use serde::{Deserialize, Serialize};

use crate::supervision::RestartPolicy;

/// Supervision strategy for scoping child restarts.
///
/// These strategies follow Erlang/OTP supervision patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SupervisionStrategy {
    /// Restart only the exited child.
    ///
    /// Appropriate when children are independent and one child's failure
    /// says nothing about the others.
    ///
    /// # Example
    ///
    /// With workers A, B, C and B crashing:
    /// - only B is restarted
    /// - A and C continue untouched, generations unchanged
    #[default]
    OneForOne,

    /// Restart every child when any child exits restartably.
    ///
    /// The other children are shut down first (in reverse start order),
    /// then all children restart in original start order. Appropriate when
    /// children are interdependent and a failure leaves the group in an
    /// inconsistent state.
    ///
    /// # Example
    ///
    /// With workers A, B, C and B crashing:
    /// - A and C are shut down
    /// - A, B, C restart in order; every generation increments
    OneForAll,

    /// Restart the exited child and everything started after it.
    ///
    /// Children started after the failed one are shut down (in reverse
    /// start order), then the failed child and those shut down restart in
    /// original order. Appropriate for pipelines where later children
    /// depend on earlier ones.
    ///
    /// # Example
    ///
    /// With workers A, B, C (started in that order) and B crashing:
    /// - C is shut down
    /// - B then C restart; A's generation is unchanged
    RestForOne,
}

/// The action a supervisor takes after evaluating a child exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisionDecision {
    /// Restart only the exited child.
    RestartChild,

    /// Restart every supervised child.
    RestartAll,

    /// Restart from the given child index (in start order) onwards.
    RestartFrom(usize),

    /// Leave the child down.
    ///
    /// Produced when the child's policy rules a restart out, for example a
    /// `Temporary` child or a `Transient` child that stopped cleanly.
    NoRestart,
}

impl SupervisionStrategy {
    /// Evaluates this strategy for one observed child exit.
    ///
    /// `child_index` is the exited child's position in the supervisor's
    /// ordered child list; it scopes the [`RestForOne`] restart span.
    ///
    /// [`RestForOne`]: SupervisionStrategy::RestForOne
    #[must_use]
    pub const fn decide(
        &self,
        policy: RestartPolicy,
        reason: &ExitReason,
        child_index: usize,
    ) -> SupervisionDecision {
        if !policy.should_restart(reason) {
            return SupervisionDecision::NoRestart;
        }

        match self {
            Self::OneForOne => SupervisionDecision::RestartChild,
            Self::OneForAll => SupervisionDecision::RestartAll,
            Self::RestForOne => SupervisionDecision::RestartFrom(child_index),
        }
    }

    /// Whether this strategy shuts down additional children before
    /// restarting.
    #[must_use]
    pub const fn requires_group_restart(&self) -> bool {
        matches!(self, Self::OneForAll | Self::RestForOne)
    }
}

impl std::fmt::Display for SupervisionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OneForOne => write!(f, "one_for_one"),
            Self::OneForAll => write!(f, "one_for_all"),
            Self::RestForOne => write!(f, "rest_for_one"),
        }
    }
}

impl std::fmt::Display for SupervisionDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RestartChild => write!(f, "restart child"),
            Self::RestartAll => write!(f, "restart all children"),
            Self::RestartFrom(index) => write!(f, "restart from child index {index}"),
            Self::NoRestart => write!(f, "no restart"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crashed() -> ExitReason {
        ExitReason::Crashed("test".to_string())
    }

    #[test]
    fn one_for_one_restarts_single_child_on_crash() {
        let decision =
            SupervisionStrategy::OneForOne.decide(RestartPolicy::Permanent, &crashed(), 0);
        assert_eq!(decision, SupervisionDecision::RestartChild);
    }

    #[test]
    fn one_for_all_restarts_all_children_on_crash() {
        let decision =
            SupervisionStrategy::OneForAll.decide(RestartPolicy::Permanent, &crashed(), 0);
        assert_eq!(decision, SupervisionDecision::RestartAll);
    }

    #[test]
    fn rest_for_one_restarts_from_index() {
        let decision =
            SupervisionStrategy::RestForOne.decide(RestartPolicy::Permanent, &crashed(), 2);
        assert_eq!(decision, SupervisionDecision::RestartFrom(2));
    }

    #[test]
    fn temporary_policy_prevents_restart_for_all_strategies() {
        for strategy in [
            SupervisionStrategy::OneForOne,
            SupervisionStrategy::OneForAll,
            SupervisionStrategy::RestForOne,
        ] {
            let decision = strategy.decide(RestartPolicy::Temporary, &crashed(), 0);
            assert_eq!(decision, SupervisionDecision::NoRestart);
        }
    }

    #[test]
    fn transient_policy_no_restart_on_normal_exit() {
        let decision =
            SupervisionStrategy::OneForOne.decide(RestartPolicy::Transient, &ExitReason::Normal, 0);
        assert_eq!(decision, SupervisionDecision::NoRestart);
    }

    #[test]
    fn transient_policy_restarts_on_crash() {
        let decision =
            SupervisionStrategy::OneForOne.decide(RestartPolicy::Transient, &crashed(), 0);
        assert_eq!(decision, SupervisionDecision::RestartChild);
    }

    #[test]
    fn requires_group_restart_matches_scope() {
        assert!(!SupervisionStrategy::OneForOne.requires_group_restart());
        assert!(SupervisionStrategy::OneForAll.requires_group_restart());
        assert!(SupervisionStrategy::RestForOne.requires_group_restart());
    }

    #[test]
    fn default_strategy_is_one_for_one() {
        assert_eq!(
            SupervisionStrategy::default(),
            SupervisionStrategy::OneForOne
        );
    }
}

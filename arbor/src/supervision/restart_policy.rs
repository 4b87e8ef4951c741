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

//! Restart policies for supervised children.
//!
//! A policy is evaluated against the child's [`ExitReason`] when the
//! supervisor observes an exit it did not itself request. Stops issued by
//! the supervisor never reach the policy: the child is unwatched before
//! the stop, so a `Permanent` child is not resurrected by its own
//! supervisor's shutdown.
//!
//! # Policies
//!
//! - [`RestartPolicy::Permanent`]: always restart
//! - [`RestartPolicy::Temporary`]: never restart
//! - [`RestartPolicy::Transient`]: restart only on abnormal termination

use arbor_core::ExitReason;
use serde::{Deserialize, Serialize};

/// Restart policy for supervised children.
///
/// Determines whether an observed child exit leads to a restart. These
/// policies follow Erlang/OTP supervision semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RestartPolicy {
    /// Always restart the child, whatever the exit reason.
    ///
    /// Appropriate for children that must always be running. A stop issued
    /// by the supervising process itself is not an observed exit and never
    /// triggers a restart.
    #[default]
    Permanent,

    /// Never restart the child.
    ///
    /// Appropriate for one-shot work where the caller handles failure
    /// explicitly.
    Temporary,

    /// Restart only on abnormal termination.
    ///
    /// The child is restarted after a crash (handler failure, panic, or
    /// kill) but not after a clean stop or an externally requested
    /// shutdown.
    Transient,
}

impl RestartPolicy {
    /// Whether a child with this policy should be restarted after exiting
    /// with `reason`.
    #[must_use]
    pub const fn should_restart(&self, reason: &ExitReason) -> bool {
        match self {
            Self::Permanent => true,
            Self::Temporary => false,
            Self::Transient => reason.is_abnormal(),
        }
    }
}

impl std::fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Temporary => write!(f, "temporary"),
            Self::Transient => write!(f, "transient"),
        }
    }
}

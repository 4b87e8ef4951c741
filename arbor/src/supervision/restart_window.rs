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

//! Windowed restart accounting.
//!
//! A supervisor tolerates at most `intensity` child exits within any
//! trailing `period`; one more exhausts the budget and the supervisor
//! terminates abnormally, escalating to its own supervisor. This is the
//! brake on restart loops: a child that keeps crashing takes its subtree
//! down rather than spinning forever.

use std::time::{Duration, Instant};

/// Sliding-window accounting of child exits against an intensity budget.
///
/// The window only ever holds timestamps within the trailing period;
/// recording prunes before checking.
#[derive(Debug, Clone)]
pub struct RestartWindow {
    intensity: u32,
    period: Duration,
    timestamps: Vec<Instant>,
}

impl RestartWindow {
    /// Creates a window tolerating `intensity` exits per trailing `period`.
    #[must_use]
    pub const fn new(intensity: u32, period: Duration) -> Self {
        Self {
            intensity,
            period,
            timestamps: Vec::new(),
        }
    }

    /// Records one child exit at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RestartLimitExceeded`] when this exit pushes the count in
    /// the trailing period past the intensity; the supervisor must then
    /// escalate instead of restarting.
    pub fn record(&mut self, now: Instant) -> Result<(), RestartLimitExceeded> {
        self.timestamps.push(now);
        self.prune(now);
        if self.timestamps.len() > self.intensity as usize {
            Err(RestartLimitExceeded {
                attempts: self.timestamps.len(),
                intensity: self.intensity,
                period: self.period,
            })
        } else {
            Ok(())
        }
    }

    /// Number of exits currently inside the window.
    #[must_use]
    pub fn restarts_in_window(&self) -> usize {
        self.timestamps.len()
    }

    /// The configured intensity.
    #[must_use]
    pub const fn intensity(&self) -> u32 {
        self.intensity
    }

    /// The configured period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    fn prune(&mut self, now: Instant) {
        let period = self.period;
        self.timestamps
            .retain(|stamp| now.saturating_duration_since(*stamp) < period);
    }
}

/// The restart budget is exhausted; the supervisor escalates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartLimitExceeded {
    /// Exits observed inside the window, including the one that tripped.
    pub attempts: usize,
    /// The configured intensity.
    pub intensity: u32,
    /// The configured period.
    pub period: Duration,
}

impl std::fmt::Display for RestartLimitExceeded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "restart limit exceeded: {} exits (max {}) within {:?}",
            self.attempts, self.intensity, self.period
        )
    }
}

impl std::error::Error for RestartLimitExceeded {}

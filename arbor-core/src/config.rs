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

//! Runtime configuration, loaded once from an XDG-compliant TOML file.
//!
//! Every value has a default, so the runtime works with no file present.
//! The file is looked up at `$XDG_CONFIG_HOME/arbor/config.toml`.

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for the Arbor runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArborConfig {
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Limits and capacity configuration.
    pub limits: LimitsConfig,
    /// Default values configuration.
    pub defaults: DefaultsConfig,
}

/// Timeout-related configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on an actor's `init`, in milliseconds.
    pub actor_init_ms: u64,
    /// Grace period for an actor shutdown before it is force-killed,
    /// in milliseconds.
    pub actor_shutdown_ms: u64,
    /// Grace period for a whole-system shutdown, in milliseconds.
    pub system_shutdown_ms: u64,
    /// Default bound for synchronous calls issued without an explicit
    /// timeout, in milliseconds.
    pub call_default_ms: u64,
}

/// Limits and capacity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Default capacity for a bounded actor mailbox.
    pub mailbox_capacity: usize,
}

/// Default configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Name stem used for actors spawned without an explicit name.
    pub actor_name: String,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            actor_init_ms: 5_000,
            actor_shutdown_ms: 10_000,
            system_shutdown_ms: 30_000,
            call_default_ms: 5_000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 255,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            actor_name: "actor".to_string(),
        }
    }
}

impl TimeoutConfig {
    /// The `init` bound as a [`Duration`].
    #[must_use]
    pub const fn actor_init(&self) -> Duration {
        Duration::from_millis(self.actor_init_ms)
    }

    /// The actor shutdown grace period as a [`Duration`].
    #[must_use]
    pub const fn actor_shutdown(&self) -> Duration {
        Duration::from_millis(self.actor_shutdown_ms)
    }

    /// The system shutdown grace period as a [`Duration`].
    #[must_use]
    pub const fn system_shutdown(&self) -> Duration {
        Duration::from_millis(self.system_shutdown_ms)
    }

    /// The default call bound as a [`Duration`].
    #[must_use]
    pub const fn call_default(&self) -> Duration {
        Duration::from_millis(self.call_default_ms)
    }
}

impl ArborConfig {
    /// Loads configuration from the XDG config directory, falling back to
    /// defaults when no file is present or the file does not parse.
    #[must_use]
    pub fn load() -> Self {
        let Ok(dirs) = xdg::BaseDirectories::with_prefix("arbor") else {
            return Self::default();
        };
        match dirs.find_config_file("config.toml") {
            Some(path) => Self::load_from_path(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from an explicit path, falling back to defaults
    /// on read or parse failure.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %path.display(), %err, "malformed config file, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), %err, "unreadable config file, using defaults");
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// The process-wide runtime configuration.
    pub static ref CONFIG: ArborConfig = ArborConfig::load();
}

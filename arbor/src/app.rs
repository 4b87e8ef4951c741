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

use arbor_core::Runtime;

/// Entry point for the Arbor system.
///
/// A process typically launches the runtime, starts its top-level
/// supervisor, and parks on
/// [`Runtime::serve_forever`](arbor_core::Runtime::serve_forever), since the
/// runtime has no lifetime of its own beyond the host process.
///
/// ```rust,ignore
/// use arbor::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let runtime = ArborApp::launch();
///     let supervisor = Supervisor::start(&runtime, top_level_spec()).await?;
///     runtime.serve_forever().await;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ArborApp;

impl ArborApp {
    /// Launches the Arbor system and returns the runtime handle.
    #[must_use]
    pub fn launch() -> Runtime {
        Runtime::new()
    }
}

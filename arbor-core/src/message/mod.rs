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

//! Message-passing surface: envelopes, addresses, and call replies.
//!
//! A message type is a closed set of variants per actor: an ordinary Rust
//! enum carrying whatever payloads the actor understands. Request variants
//! embed a [`ReplyTo`] so callers can use [`Address::call`].

mod address;
mod envelope;
mod reply;

pub use address::Address;
pub use envelope::Envelope;
pub use reply::ReplyTo;

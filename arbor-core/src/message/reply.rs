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

use tokio::sync::oneshot;

/// The reply half of a synchronous [`call`](crate::message::Address::call).
///
/// A fresh `ReplyTo` is created for every call and embedded in the request
/// message by the caller's builder closure. Sending consumes the value, so
/// a reply can be produced at most once. Dropping it without replying makes
/// the call fail with [`CallError::NoReply`](crate::errors::CallError).
#[derive(Debug)]
pub struct ReplyTo<R> {
    tx: oneshot::Sender<R>,
}

impl<R> ReplyTo<R> {
    pub(crate) fn new(tx: oneshot::Sender<R>) -> Self {
        Self { tx }
    }

    /// Delivers the reply to the waiting caller.
    ///
    /// Returns the value back when the caller is no longer listening, which
    /// happens after the call timed out. The callee is free to ignore that
    /// outcome; the runtime has already surfaced the timeout on the caller
    /// side.
    pub fn send(self, value: R) -> Result<(), R> {
        self.tx.send(value)
    }

    /// Returns `true` when the caller has stopped waiting for this reply.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

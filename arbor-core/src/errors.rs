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

//! Error and exit-reason types for the Arbor runtime.
//!
//! Every failure path in the runtime produces one of the typed values in
//! this module; nothing is swallowed. Crashes are contained to the failing
//! actor and surface to watchers and supervisors as an [`ExitReason`].

use std::time::Duration;

/// The reason an actor terminated.
///
/// A reason is attached to every termination, delivered to monitors in a
/// [`MonitorSignal`](crate::monitor::MonitorSignal), and consulted by
/// supervisors when deciding whether to restart a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The actor finished its work and stopped cleanly.
    Normal,

    /// The actor was asked to stop and shut down cleanly.
    Shutdown,

    /// The actor terminated abnormally.
    ///
    /// Produced when a handler returns `Next::StopAbnormal`, when a handler
    /// panics, or when the actor is forcibly killed. The string carries the
    /// failure details.
    Crashed(String),
}

impl ExitReason {
    /// Returns `true` for abnormal terminations.
    #[must_use]
    pub const fn is_abnormal(&self) -> bool {
        matches!(self, Self::Crashed(_))
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::Crashed(details) => write!(f, "crashed: {details}"),
        }
    }
}

/// Errors produced while starting an actor.
///
/// An init failure is reported to watchers exactly like a runtime crash;
/// a supervisor counts it against the restart budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The actor's `init` returned an error.
    InitFailed(String),

    /// The actor's `init` did not complete within the configured bound.
    InitTimeout(Duration),

    /// The actor's `init` panicked.
    InitPanicked(String),
}

impl std::fmt::Display for StartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitFailed(msg) => write!(f, "actor init failed: {msg}"),
            Self::InitTimeout(bound) => {
                write!(f, "actor init did not complete within {bound:?}")
            }
            Self::InitPanicked(msg) => write!(f, "actor init panicked: {msg}"),
        }
    }
}

impl std::error::Error for StartError {}

/// Errors produced when enqueueing a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The target actor has terminated and its mailbox is gone.
    Closed,

    /// The target's bounded mailbox is saturated and its overflow policy
    /// rejects rather than blocks.
    MailboxFull,
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "mailbox closed"),
            Self::MailboxFull => write!(f, "mailbox full"),
        }
    }
}

impl std::error::Error for SendError {}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for SendError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self::Closed
    }
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for SendError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => Self::MailboxFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Errors produced by a synchronous [`call`](crate::message::Address::call).
///
/// A timeout is a hard failure: the runtime never retries a call, and the
/// one-shot reply listener is torn down before the error is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The request could not be enqueued.
    Send(SendError),

    /// No reply arrived within the bound.
    Timeout(Duration),

    /// The callee dropped the reply channel without answering, usually
    /// because it terminated while the request was pending.
    NoReply,
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send(err) => write!(f, "call failed to send: {err}"),
            Self::Timeout(bound) => write!(f, "no reply within {bound:?}"),
            Self::NoReply => write!(f, "callee dropped the reply channel"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Send(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors produced by the process registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is already bound to a live actor with a different identity.
    NameTaken(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTaken(name) => write!(f, "name already registered: {name}"),
        }
    }
}

impl std::error::Error for RegistryError {}

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

use std::any::Any;
use std::future::poll_fn;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};

use crate::actor::cell::LifecycleStage;
use crate::actor::{Actor, ActorContext, Next};
use crate::config::CONFIG;
use crate::errors::{ExitReason, StartError};
use crate::mailbox::MailboxReceiver;
use crate::message::Envelope;
use crate::monitor::MonitorSignal;
use crate::selector::{Selector, SourceTag};

enum LoopEvent<M> {
    Message(Envelope<M>),
    Source(SourceTag, M),
    Down(MonitorSignal),
    InboxClosed,
    Shutdown,
    Killed,
}

enum Flow {
    Continue,
    Break(ExitReason),
    Killed,
}

/// Drives one actor incarnation from `init` to watcher notification.
///
/// Envelopes are processed strictly one at a time: the handler runs to
/// completion before the next dequeue. Handler panics are caught and
/// converted to an abnormal stop, so the actor never disappears without
/// its watchers hearing about it.
pub(crate) async fn run_actor<A: Actor>(
    mut actor: A,
    mut ctx: ActorContext<A::Msg>,
    mut inbox: MailboxReceiver<A::Msg>,
    init_tx: oneshot::Sender<Result<(), StartError>>,
) {
    let cell = ctx.handle().cell.clone();
    let shutdown = ctx.handle().shutdown.clone();
    let kill = ctx.handle().kill.clone();

    let init_bound = CONFIG.timeouts.actor_init();
    let init_result = match tokio::time::timeout(
        init_bound,
        AssertUnwindSafe(actor.init(&mut ctx)).catch_unwind(),
    )
    .await
    {
        Err(_) => Err(StartError::InitTimeout(init_bound)),
        Ok(Err(payload)) => Err(StartError::InitPanicked(panic_message(&payload))),
        Ok(Ok(Err(err))) => Err(err),
        Ok(Ok(Ok(()))) => Ok(()),
    };

    if let Err(err) = init_result {
        // An init failure is indistinguishable from a runtime crash to
        // watchers and supervisors: the actor was never `Running`.
        error!(actor = %cell.id(), %err, "actor init failed");
        cell.set_stage(LifecycleStage::Crashed);
        let reason = ExitReason::Crashed(err.to_string());
        let _ = init_tx.send(Err(err));
        cell.notify_exit(reason);
        return;
    }

    cell.set_stage(LifecycleStage::Running);
    let _ = init_tx.send(Ok(()));
    trace!(actor = %cell.id(), generation = cell.generation(), "actor running");

    let mut forced = false;
    let reason = loop {
        let event = next_event(
            &mut inbox,
            &mut ctx.monitor_rx,
            &mut ctx.selector,
            &shutdown,
            &kill,
        )
        .await;

        let message = match event {
            LoopEvent::Killed => {
                forced = true;
                break ExitReason::Crashed("killed".to_string());
            }
            LoopEvent::Shutdown => break ExitReason::Shutdown,
            LoopEvent::InboxClosed => break ExitReason::Normal,
            LoopEvent::Message(envelope) => {
                if let Some(origin) = envelope.origin_generation() {
                    if origin != cell.generation() {
                        trace!(actor = %cell.id(), origin, "dropping stale envelope");
                        continue;
                    }
                }
                envelope.payload
            }
            LoopEvent::Source(tag, message) => {
                trace!(actor = %cell.id(), source = %tag, "selector source event");
                message
            }
            LoopEvent::Down(signal) => match ctx.selector.map_monitor(signal) {
                Some(message) => message,
                None => {
                    warn!(
                        actor = %cell.id(),
                        "monitor signal dropped: selector has no monitor mapping"
                    );
                    continue;
                }
            },
        };

        match dispatch(&mut actor, message, &mut ctx, &kill).await {
            Flow::Continue => {}
            Flow::Break(reason) => break reason,
            Flow::Killed => {
                forced = true;
                break ExitReason::Crashed("killed".to_string());
            }
        }
    };

    if forced {
        cell.set_stage(LifecycleStage::Crashed);
    } else {
        cell.set_stage(if reason.is_abnormal() {
            LifecycleStage::Crashed
        } else {
            LifecycleStage::Stopping
        });
        // `on_stop` gets the same grace the handlers get: it can be cut
        // short by a kill, and a panic inside it must not mask the reason.
        tokio::select! {
            biased;
            () = kill.cancelled() => {
                warn!(actor = %cell.id(), "killed while running on_stop");
            }
            outcome = AssertUnwindSafe(actor.on_stop(&reason, &mut ctx)).catch_unwind() => {
                if let Err(payload) = outcome {
                    error!(actor = %cell.id(), panic = %panic_message(&payload), "on_stop panicked");
                }
            }
        }
    }

    trace!(actor = %cell.id(), %reason, "actor terminated");
    cell.notify_exit(reason);
}

/// One blocking wait over every input source the actor services.
async fn next_event<M: Send + 'static>(
    inbox: &mut MailboxReceiver<M>,
    monitors: &mut mpsc::UnboundedReceiver<MonitorSignal>,
    selector: &mut Selector<M>,
    shutdown: &CancellationToken,
    kill: &CancellationToken,
) -> LoopEvent<M> {
    let include_mailbox = selector.includes_mailbox();
    let has_sources = selector.has_sources();
    tokio::select! {
        biased;
        () = kill.cancelled() => LoopEvent::Killed,
        () = shutdown.cancelled() => LoopEvent::Shutdown,
        signal = monitors.recv() => match signal {
            Some(signal) => LoopEvent::Down(signal),
            None => {
                warn!("monitor channel closed unexpectedly");
                LoopEvent::Shutdown
            }
        },
        envelope = inbox.dequeue(), if include_mailbox => match envelope {
            Some(envelope) => LoopEvent::Message(envelope),
            None => LoopEvent::InboxClosed,
        },
        tagged = poll_fn(|cx| selector.poll_sources(cx)), if has_sources => {
            LoopEvent::Source(tagged.0, tagged.1)
        }
    }
}

/// Runs one handler invocation to completion, racing only the kill token.
async fn dispatch<A: Actor>(
    actor: &mut A,
    message: A::Msg,
    ctx: &mut ActorContext<A::Msg>,
    kill: &CancellationToken,
) -> Flow {
    let handler = AssertUnwindSafe(actor.handle(message, ctx)).catch_unwind();
    tokio::select! {
        biased;
        () = kill.cancelled() => Flow::Killed,
        outcome = handler => match outcome {
            Ok(Next::Continue) => Flow::Continue,
            Ok(Next::Stop) => Flow::Break(ExitReason::Normal),
            Ok(Next::StopAbnormal(details)) => Flow::Break(ExitReason::Crashed(details)),
            Err(payload) => Flow::Break(ExitReason::Crashed(panic_message(&payload))),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

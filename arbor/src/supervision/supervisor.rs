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

//! The supervisor: an actor that owns child lifecycles.
//!
//! A supervisor starts its children in order, watches each through a
//! monitor, and reacts to exits by restarting per strategy and policy,
//! accounting every observed exit against its restart window. Budget
//! exhaustion terminates the supervisor abnormally; the escalation is an
//! ordinary `Crashed` exit to whatever supervises it, recursively, until
//! some ancestor's budget absorbs the failure. Supervisors nest freely: a
//! child spec may itself start a supervisor.
//!
//! Exit handling is strictly sequential: one child-exit event is processed
//! to completion, including every restart it triggers, before the next is
//! looked at.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, instrument, trace, warn};

use arbor_core::{
    Actor, ActorConfig, ActorContext, ActorHandle, Address, MailboxPolicy, MonitorSignal, Next,
    ReplyTo, Runtime, Selector, StartError, CONFIG,
};

use crate::supervision::{
    ChildSpec, ChildStart, RestartWindow, SupervisionDecision, SupervisionStrategy,
};

/// Messages understood by a supervisor.
///
/// External code never constructs these directly; the
/// [`SupervisorHandle`] client functions are the sanctioned entry point.
#[derive(Debug)]
pub enum SupervisorMsg {
    /// A watched child terminated.
    ChildDown(MonitorSignal),

    /// Add and start a new child.
    StartChild(ChildSpec, ReplyTo<Result<(), StartError>>),

    /// Stop a child by id and drop it from supervision. Replies `false`
    /// when no child carries the id.
    StopChild(String, ReplyTo<bool>),

    /// Report the current children.
    ListChildren(ReplyTo<Vec<ChildInfo>>),
}

/// A snapshot of one supervised child.
#[derive(Debug, Clone)]
pub struct ChildInfo {
    /// The child's id within its supervisor.
    pub id: String,
    /// Generation of the current (or last) incarnation.
    pub generation: u64,
    /// Whether the child is currently running.
    pub alive: bool,
    /// The child's restart policy.
    pub restart_policy: crate::supervision::RestartPolicy,
}

/// Blueprint for a supervisor: strategy, restart budget, and children.
#[derive(Debug)]
pub struct SupervisorSpec {
    name: Option<String>,
    strategy: SupervisionStrategy,
    intensity: u32,
    period: Duration,
    children: Vec<ChildSpec>,
}

impl SupervisorSpec {
    /// Creates a spec with the given strategy, defaulting to an intensity
    /// of 5 restarts per 60-second period and no children.
    #[must_use]
    pub fn new(strategy: SupervisionStrategy) -> Self {
        Self {
            name: None,
            strategy,
            intensity: 5,
            period: Duration::from_secs(60),
            children: Vec::new(),
        }
    }

    /// Names the supervisor actor.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the maximum number of child exits tolerated per period.
    #[must_use]
    pub const fn intensity(mut self, intensity: u32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Sets the trailing window the intensity is measured over.
    #[must_use]
    pub const fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Appends a child; children start in the order they were added.
    #[must_use]
    pub fn child(mut self, spec: ChildSpec) -> Self {
        self.children.push(spec);
        self
    }
}

struct RunningChild {
    handle: ActorHandle,
    watch: arbor_core::WatchRef,
}

struct ChildSlot {
    spec: ChildSpec,
    generation: u64,
    running: Option<RunningChild>,
}

struct SupervisorActor {
    strategy: SupervisionStrategy,
    window: RestartWindow,
    children: Vec<ChildSlot>,
}

#[async_trait]
impl Actor for SupervisorActor {
    type Msg = SupervisorMsg;

    async fn init(&mut self, ctx: &mut ActorContext<SupervisorMsg>) -> Result<(), StartError> {
        ctx.install_selector(Selector::with_mailbox().on_monitor(SupervisorMsg::ChildDown));

        for index in 0..self.children.len() {
            let id = self.children[index].spec.id();
            if self.children[..index].iter().any(|slot| slot.spec.id() == id) {
                return Err(StartError::InitFailed(format!("duplicate child id: {id}")));
            }
        }

        // Children start in declaration order; a start failure rolls back
        // the ones already up and fails the whole supervisor start.
        for index in 0..self.children.len() {
            if let Err(err) = self.start_slot(index, ctx).await {
                error!(child = self.children[index].spec.id(), %err, "child failed to start");
                self.stop_all_children(ctx).await;
                return Err(err);
            }
        }
        Ok(())
    }

    async fn handle(
        &mut self,
        message: SupervisorMsg,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) -> Next {
        match message {
            SupervisorMsg::ChildDown(signal) => self.on_child_down(signal, ctx).await,
            SupervisorMsg::StartChild(spec, reply) => {
                let _ = reply.send(self.add_child(spec, ctx).await);
                Next::Continue
            }
            SupervisorMsg::StopChild(id, reply) => {
                let _ = reply.send(self.remove_child(&id, ctx).await);
                Next::Continue
            }
            SupervisorMsg::ListChildren(reply) => {
                let infos = self
                    .children
                    .iter()
                    .map(|slot| ChildInfo {
                        id: slot.spec.id().to_string(),
                        generation: slot.generation,
                        alive: slot
                            .running
                            .as_ref()
                            .is_some_and(|running| running.handle.is_alive()),
                        restart_policy: slot.spec.policy(),
                    })
                    .collect();
                let _ = reply.send(infos);
                Next::Continue
            }
        }
    }

    async fn on_stop(
        &mut self,
        _reason: &arbor_core::ExitReason,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) {
        self.stop_all_children(ctx).await;
    }
}

impl SupervisorActor {
    /// Starts the child at `index` with its current slot generation.
    async fn start_slot(
        &mut self,
        index: usize,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) -> Result<(), StartError> {
        let start = ChildStart {
            runtime: ctx.runtime().clone(),
            generation: self.children[index].generation,
        };
        let handle = self.children[index].spec.start(start).await?;
        let watch = ctx.watch(&handle);
        trace!(
            child = self.children[index].spec.id(),
            generation = self.children[index].generation,
            "child started"
        );
        self.children[index].running = Some(RunningChild { handle, watch });
        Ok(())
    }

    /// Stops the child at `index` without triggering restart accounting:
    /// the watch is removed before the stop, so the exit is never observed.
    async fn shutdown_slot(&mut self, index: usize, ctx: &mut ActorContext<SupervisorMsg>) {
        if let Some(running) = self.children[index].running.take() {
            ctx.unwatch(&running.handle, running.watch);
            let grace = self.children[index].spec.grace();
            let killed = running.handle.stop_with_grace(grace).await;
            if killed {
                warn!(
                    child = self.children[index].spec.id(),
                    ?grace,
                    "child did not stop within its grace period and was killed"
                );
            }
        }
    }

    /// Handles one observed child exit to completion.
    #[instrument(skip(self, ctx), fields(child = %signal.id, reason = %signal.reason))]
    async fn on_child_down(
        &mut self,
        signal: MonitorSignal,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) -> Next {
        if ctx.handle().is_stopping() {
            return Next::Continue;
        }

        let Some(index) = self.children.iter().position(|slot| {
            slot.running.as_ref().is_some_and(|running| {
                running.handle.id() == &signal.id
                    && running.handle.generation() == signal.generation
            })
        }) else {
            trace!("exit signal for unknown or stale child incarnation, ignoring");
            return Next::Continue;
        };
        self.children[index].running = None;
        warn!(child = self.children[index].spec.id(), "child exited");

        // Budget first: the exit is recorded before any restart decision.
        if let Err(limit) = self.window.record(Instant::now()) {
            error!(%limit, "escalating");
            return Next::StopAbnormal(limit.to_string());
        }

        let policy = self.children[index].spec.policy();
        match self.strategy.decide(policy, &signal.reason, index) {
            SupervisionDecision::NoRestart => Next::Continue,
            SupervisionDecision::RestartChild => {
                match self.start_with_budget(index, ctx).await {
                    Some(escalation) => escalation,
                    None => Next::Continue,
                }
            }
            SupervisionDecision::RestartAll => self.group_restart(index, 0, ctx).await,
            SupervisionDecision::RestartFrom(from) => self.group_restart(index, from, ctx).await,
        }
    }

    /// Shuts down every running child in `[from..]` except the failed one
    /// (already down), in reverse start order, then restarts the failed
    /// child and those shut down, in original start order.
    async fn group_restart(
        &mut self,
        failed: usize,
        from: usize,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) -> Next {
        let mut to_restart = Vec::new();
        for index in (from..self.children.len()).rev() {
            if index == failed {
                continue;
            }
            if self.children[index].running.is_some() {
                self.shutdown_slot(index, ctx).await;
                to_restart.push(index);
            }
        }
        to_restart.push(failed);
        to_restart.sort_unstable();

        for index in to_restart {
            if let Some(escalation) = self.start_with_budget(index, ctx).await {
                return escalation;
            }
        }
        Next::Continue
    }

    /// Bumps the slot generation and starts it, retrying on start failure
    /// with each failure charged against the restart window.
    async fn start_with_budget(
        &mut self,
        index: usize,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) -> Option<Next> {
        loop {
            self.children[index].generation += 1;
            match self.start_slot(index, ctx).await {
                Ok(()) => return None,
                Err(err) => {
                    warn!(child = self.children[index].spec.id(), %err, "restart failed");
                    if let Err(limit) = self.window.record(Instant::now()) {
                        error!(%limit, "escalating");
                        return Some(Next::StopAbnormal(limit.to_string()));
                    }
                    // Let the failed start's resources unwind before the
                    // next attempt.
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    async fn add_child(
        &mut self,
        spec: ChildSpec,
        ctx: &mut ActorContext<SupervisorMsg>,
    ) -> Result<(), StartError> {
        if self.children.iter().any(|slot| slot.spec.id() == spec.id()) {
            return Err(StartError::InitFailed(format!(
                "duplicate child id: {}",
                spec.id()
            )));
        }
        self.children.push(ChildSlot {
            spec,
            generation: 0,
            running: None,
        });
        let index = self.children.len() - 1;
        match self.start_slot(index, ctx).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.children.pop();
                Err(err)
            }
        }
    }

    async fn remove_child(&mut self, id: &str, ctx: &mut ActorContext<SupervisorMsg>) -> bool {
        let Some(index) = self.children.iter().position(|slot| slot.spec.id() == id) else {
            return false;
        };
        self.shutdown_slot(index, ctx).await;
        self.children.remove(index);
        true
    }

    /// Stops every child concurrently, in no particular order beyond each
    /// child's own grace period. Used on supervisor shutdown and
    /// escalation.
    async fn stop_all_children(&mut self, ctx: &mut ActorContext<SupervisorMsg>) {
        let mut stops = Vec::new();
        for slot in self.children.iter_mut().rev() {
            if let Some(running) = slot.running.take() {
                ctx.unwatch(&running.handle, running.watch);
                let grace = slot.spec.grace();
                stops.push(async move {
                    running.handle.stop_with_grace(grace).await;
                });
            }
        }
        join_all(stops).await;
    }
}

/// Starts supervisors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervisor;

impl Supervisor {
    /// Starts a supervisor and all of its children, in order.
    ///
    /// Returns once every child is up. A child start failure rolls the
    /// already-started children back and surfaces here as the error.
    ///
    /// # Errors
    ///
    /// Returns the [`StartError`] of the first child that failed to start,
    /// or of the supervisor actor itself.
    pub async fn start(
        runtime: &Runtime,
        spec: SupervisorSpec,
    ) -> Result<SupervisorHandle, StartError> {
        let SupervisorSpec {
            name,
            strategy,
            intensity,
            period,
            children,
        } = spec;
        let actor = SupervisorActor {
            strategy,
            window: RestartWindow::new(intensity, period),
            children: children
                .into_iter()
                .map(|spec| ChildSlot {
                    spec,
                    generation: 0,
                    running: None,
                })
                .collect(),
        };
        // Supervisors must never lose control traffic to backpressure.
        let mut config = ActorConfig::new().mailbox(MailboxPolicy::unbounded());
        if let Some(name) = name {
            config = config.named(name);
        }
        let spawned = runtime.spawn_with(config, actor).await?;
        Ok(SupervisorHandle {
            address: spawned.address,
            handle: spawned.handle,
        })
    }
}

/// Client handle to a running supervisor.
///
/// The functions here are the sanctioned entry points for supervisor
/// administration; callers never build [`SupervisorMsg`] values directly.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    address: Address<SupervisorMsg>,
    handle: ActorHandle,
}

impl SupervisorHandle {
    /// The supervisor's lifecycle handle, e.g. for watching it or handing
    /// it back from a parent supervisor's child spec.
    #[must_use]
    pub const fn handle(&self) -> &ActorHandle {
        &self.handle
    }

    /// The supervisor's address.
    #[must_use]
    pub const fn address(&self) -> &Address<SupervisorMsg> {
        &self.address
    }

    /// Adds a child and starts it.
    ///
    /// # Errors
    ///
    /// Fails when the id is already supervised, when the child's start
    /// function fails, or when the supervisor is unreachable.
    pub async fn start_child(&self, spec: ChildSpec) -> anyhow::Result<()> {
        let result = self
            .address
            .call(CONFIG.timeouts.call_default(), |reply| {
                SupervisorMsg::StartChild(spec, reply)
            })
            .await?;
        result.map_err(Into::into)
    }

    /// Stops a child by id and drops it from supervision. Returns `false`
    /// when no child carries the id.
    ///
    /// # Errors
    ///
    /// Fails when the supervisor is unreachable.
    pub async fn stop_child(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self
            .address
            .call(CONFIG.timeouts.call_default(), |reply| {
                SupervisorMsg::StopChild(id.to_string(), reply)
            })
            .await?)
    }

    /// Reports the current children.
    ///
    /// # Errors
    ///
    /// Fails when the supervisor is unreachable.
    pub async fn list_children(&self) -> anyhow::Result<Vec<ChildInfo>> {
        Ok(self
            .address
            .call(CONFIG.timeouts.call_default(), SupervisorMsg::ListChildren)
            .await?)
    }

    /// Stops the supervisor gracefully; its children are stopped first,
    /// each within its own grace period.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` mirrors the underlying handle.
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.handle.stop().await
    }
}

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

//! Tests for actor lifecycle plumbing: monitors, timers, selector
//! merging, piped helper tasks, init failures, registry bindings, and
//! system shutdown.

use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use arbor::prelude::*;

/// An idle target that can crash, panic, or stop on demand.
#[derive(Default)]
struct Target;

enum TargetMsg {
    Boom,
    Panic,
}

#[async_trait]
impl Actor for Target {
    type Msg = TargetMsg;

    async fn handle(&mut self, msg: TargetMsg, _ctx: &mut ActorContext<TargetMsg>) -> Next {
        match msg {
            TargetMsg::Boom => Next::StopAbnormal("boom".to_string()),
            TargetMsg::Panic => panic!("kaboom"),
        }
    }
}

/// Watches targets and records the first down-signal it sees.
#[derive(Default)]
struct Watcher {
    seen: Option<MonitorSignal>,
}

enum WatcherMsg {
    Watch(ActorHandle),
    Down(MonitorSignal),
    Seen(ReplyTo<Option<MonitorSignal>>),
}

#[async_trait]
impl Actor for Watcher {
    type Msg = WatcherMsg;

    async fn init(&mut self, ctx: &mut ActorContext<WatcherMsg>) -> Result<(), StartError> {
        ctx.install_selector(Selector::with_mailbox().on_monitor(WatcherMsg::Down));
        Ok(())
    }

    async fn handle(&mut self, msg: WatcherMsg, ctx: &mut ActorContext<WatcherMsg>) -> Next {
        match msg {
            WatcherMsg::Watch(handle) => {
                ctx.watch(&handle);
            }
            WatcherMsg::Down(signal) => {
                if self.seen.is_none() {
                    self.seen = Some(signal);
                }
            }
            WatcherMsg::Seen(reply) => {
                let _ = reply.send(self.seen.clone());
            }
        }
        Next::Continue
    }
}

async fn observed_signal(
    watcher: &Address<WatcherMsg>,
) -> anyhow::Result<Option<MonitorSignal>> {
    Ok(watcher
        .call(Duration::from_secs(1), WatcherMsg::Seen)
        .await?)
}

async fn wait_for_signal(watcher: &Address<WatcherMsg>) -> anyhow::Result<MonitorSignal> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(signal) = observed_signal(watcher).await? {
            return Ok(signal);
        }
        anyhow::ensure!(Instant::now() < deadline, "no monitor signal arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn monitor_reports_graceful_shutdown() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let watcher = runtime.spawn_named("watcher", Watcher::default()).await?;
    let target = runtime.spawn_named("target", Target).await?;

    watcher
        .address
        .cast(WatcherMsg::Watch(target.handle.clone()))
        .await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    target.handle.stop().await?;

    let signal = wait_for_signal(&watcher.address).await?;
    assert_eq!(signal.id, ActorId::new("target"));
    assert_eq!(signal.generation, 0);
    assert_eq!(signal.reason, ExitReason::Shutdown);

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn monitor_reports_crash_details() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let watcher = runtime.spawn_named("crash-watcher", Watcher::default()).await?;
    let target = runtime.spawn_named("crash-target", Target).await?;

    watcher
        .address
        .cast(WatcherMsg::Watch(target.handle.clone()))
        .await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    target.address.cast(TargetMsg::Boom).await?;

    let signal = wait_for_signal(&watcher.address).await?;
    assert_eq!(signal.reason, ExitReason::Crashed("boom".to_string()));

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn handler_panic_is_contained_and_reported() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let watcher = runtime.spawn_named("panic-watcher", Watcher::default()).await?;
    let target = runtime.spawn_named("panic-target", Target).await?;

    watcher
        .address
        .cast(WatcherMsg::Watch(target.handle.clone()))
        .await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    target.address.cast(TargetMsg::Panic).await?;

    let signal = wait_for_signal(&watcher.address).await?;
    match &signal.reason {
        ExitReason::Crashed(details) => assert!(details.contains("kaboom")),
        other => panic!("expected crash, got {other:?}"),
    }

    // The watcher itself is unaffected by its neighbor's panic.
    assert!(watcher.handle.is_alive());

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn watching_a_dead_actor_notifies_immediately() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let watcher = runtime.spawn_named("late-watcher", Watcher::default()).await?;
    let target = runtime.spawn_named("gone-target", Target).await?;

    target.handle.stop().await?;
    assert!(!target.handle.is_alive());

    watcher
        .address
        .cast(WatcherMsg::Watch(target.handle.clone()))
        .await?;

    let signal = wait_for_signal(&watcher.address).await?;
    assert_eq!(signal.reason, ExitReason::Shutdown);

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn kill_reports_an_abnormal_exit() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let watcher = runtime.spawn_named("kill-watcher", Watcher::default()).await?;
    let target = runtime.spawn_named("kill-target", Target).await?;

    watcher
        .address
        .cast(WatcherMsg::Watch(target.handle.clone()))
        .await?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    target.handle.kill();

    let signal = wait_for_signal(&watcher.address).await?;
    assert_eq!(signal.reason, ExitReason::Crashed("killed".to_string()));

    runtime.shutdown_all().await;
    Ok(())
}

/// Counts timer ticks.
#[derive(Default)]
struct Recorder {
    ticks: u32,
}

#[derive(Debug)]
enum RecorderMsg {
    Tick,
    Count(ReplyTo<u32>),
}

#[async_trait]
impl Actor for Recorder {
    type Msg = RecorderMsg;

    async fn handle(&mut self, msg: RecorderMsg, _ctx: &mut ActorContext<RecorderMsg>) -> Next {
        match msg {
            RecorderMsg::Tick => self.ticks += 1,
            RecorderMsg::Count(reply) => {
                let _ = reply.send(self.ticks);
            }
        }
        Next::Continue
    }
}

async fn tick_count(address: &Address<RecorderMsg>) -> anyhow::Result<u32> {
    Ok(address
        .call(Duration::from_secs(1), RecorderMsg::Count)
        .await?)
}

#[tokio::test]
async fn one_shot_timer_delivers_once() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let spawned = runtime.spawn_named("one-shot", Recorder::default()).await?;

    let timer = schedule_after(&spawned.address, Duration::from_millis(30), RecorderMsg::Tick);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(tick_count(&spawned.address).await?, 1);
    assert!(timer.has_fired());
    assert_eq!(timer.cancel(), CancelOutcome::AlreadyFired);

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn cancelled_timer_never_delivers() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let spawned = runtime.spawn_named("cancelled", Recorder::default()).await?;

    let timer = schedule_after(&spawned.address, Duration::from_secs(60), RecorderMsg::Tick);
    match timer.cancel() {
        CancelOutcome::Cancelled { remaining } => {
            assert!(remaining > Duration::from_secs(50));
        }
        CancelOutcome::AlreadyFired => panic!("timer cannot have fired"),
    }

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(tick_count(&spawned.address).await?, 0);

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn interval_timer_fires_until_cancelled() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let spawned = runtime.spawn_named("periodic", Recorder::default()).await?;

    let timer = schedule_interval(&spawned.address, Duration::from_millis(20), || {
        RecorderMsg::Tick
    });

    let mut ticked = false;
    for _ in 0..250 {
        if tick_count(&spawned.address).await? >= 3 {
            ticked = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(ticked, "expected at least 3 periodic deliveries");

    timer.cancel();
    tokio::time::sleep(Duration::from_millis(60)).await;
    let settled = tick_count(&spawned.address).await?;
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(tick_count(&spawned.address).await?, settled);

    runtime.shutdown_all().await;
    Ok(())
}

/// Merges a side channel into its mailbox wait.
struct Merger {
    seen: Vec<String>,
    side: Option<mpsc::Receiver<String>>,
}

enum MergerMsg {
    FromMailbox,
    FromSide(String),
    Dump(ReplyTo<Vec<String>>),
}

#[async_trait]
impl Actor for Merger {
    type Msg = MergerMsg;

    async fn init(&mut self, ctx: &mut ActorContext<MergerMsg>) -> Result<(), StartError> {
        let side = self
            .side
            .take()
            .ok_or_else(|| StartError::InitFailed("side channel missing".to_string()))?;
        ctx.install_selector(
            Selector::with_mailbox().source("side", side, MergerMsg::FromSide),
        );
        Ok(())
    }

    async fn handle(&mut self, msg: MergerMsg, _ctx: &mut ActorContext<MergerMsg>) -> Next {
        match msg {
            MergerMsg::FromMailbox => self.seen.push("mailbox".to_string()),
            MergerMsg::FromSide(value) => self.seen.push(value),
            MergerMsg::Dump(reply) => {
                let _ = reply.send(self.seen.clone());
            }
        }
        Next::Continue
    }
}

#[tokio::test]
async fn selector_services_mailbox_and_extra_sources() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let (side_tx, side_rx) = mpsc::channel(8);
    let spawned = runtime
        .spawn_named(
            "merger",
            Merger {
                seen: Vec::new(),
                side: Some(side_rx),
            },
        )
        .await?;

    side_tx.send("side-1".to_string()).await?;
    spawned.address.cast(MergerMsg::FromMailbox).await?;
    side_tx.send("side-2".to_string()).await?;

    let seen_all = {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let seen = spawned
                .address
                .call(Duration::from_secs(1), MergerMsg::Dump)
                .await?;
            if seen.len() == 3 {
                assert!(seen.contains(&"mailbox".to_string()));
                assert!(seen.contains(&"side-1".to_string()));
                assert!(seen.contains(&"side-2".to_string()));
                break true;
            }
            if Instant::now() > deadline {
                break false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    assert!(seen_all, "all three events should be serviced");

    runtime.shutdown_all().await;
    Ok(())
}

/// Delegates a computation to a helper task and stores the piped result.
#[derive(Default)]
struct Delegator {
    result: Option<u64>,
}

enum DelegatorMsg {
    Kick,
    Computed(u64),
    Get(ReplyTo<Option<u64>>),
}

#[async_trait]
impl Actor for Delegator {
    type Msg = DelegatorMsg;

    async fn handle(&mut self, msg: DelegatorMsg, ctx: &mut ActorContext<DelegatorMsg>) -> Next {
        match msg {
            DelegatorMsg::Kick => {
                // Slow work belongs in a helper task, never inline.
                ctx.pipe_task(
                    async {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        6 * 7u64
                    },
                    DelegatorMsg::Computed,
                );
            }
            DelegatorMsg::Computed(value) => self.result = Some(value),
            DelegatorMsg::Get(reply) => {
                let _ = reply.send(self.result);
            }
        }
        Next::Continue
    }
}

#[tokio::test]
async fn pipe_task_reports_back_as_a_message() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let spawned = runtime.spawn_named("delegator", Delegator::default()).await?;

    spawned.address.cast(DelegatorMsg::Kick).await?;

    let deadline = Instant::now() + Duration::from_secs(5);
    let value = loop {
        let value = spawned
            .address
            .call(Duration::from_secs(1), DelegatorMsg::Get)
            .await?;
        if let Some(value) = value {
            break value;
        }
        anyhow::ensure!(Instant::now() < deadline, "piped result never arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
    };
    assert_eq!(value, 42);

    runtime.shutdown_all().await;
    Ok(())
}

/// Fails or panics during init, depending on its mode.
struct BadInit {
    panic: bool,
}

#[async_trait]
impl Actor for BadInit {
    type Msg = ();

    async fn init(&mut self, _ctx: &mut ActorContext<()>) -> Result<(), StartError> {
        if self.panic {
            panic!("init exploded");
        }
        Err(StartError::InitFailed("refused".to_string()))
    }

    async fn handle(&mut self, _msg: (), _ctx: &mut ActorContext<()>) -> Next {
        Next::Continue
    }
}

#[tokio::test]
async fn init_failure_surfaces_from_spawn() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();

    match runtime.spawn_named("bad-init", BadInit { panic: false }).await {
        Err(StartError::InitFailed(msg)) => assert!(msg.contains("refused")),
        other => panic!("expected InitFailed, got {other:?}"),
    }

    match runtime.spawn_named("panicky-init", BadInit { panic: true }).await {
        Err(StartError::InitPanicked(msg)) => assert!(msg.contains("init exploded")),
        other => panic!("expected InitPanicked, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn registry_guards_live_names_and_allows_rebinding_dead_ones() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let first = runtime.spawn_named("svc-a", Recorder::default()).await?;
    let second = runtime.spawn_named("svc-b", Recorder::default()).await?;

    runtime.registry().register("svc", &first)?;

    // A live binding refuses a different actor.
    match runtime.registry().register("svc", &second) {
        Err(RegistryError::NameTaken(name)) => assert_eq!(name, "svc"),
        other => panic!("expected NameTaken, got {other:?}"),
    }

    // Resolution is typed: asking for the wrong message type yields None.
    assert!(runtime.registry().resolve::<WatcherMsg>("svc").is_none());
    assert!(runtime.registry().resolve::<RecorderMsg>("svc").is_some());

    // Once the holder dies the name is free again.
    first.handle.stop().await?;
    runtime.registry().register("svc", &second)?;
    let resolved = runtime
        .registry()
        .resolve::<RecorderMsg>("svc")
        .expect("rebound");
    assert_eq!(resolved, second.address);

    assert!(runtime.registry().unregister("svc"));
    assert!(!runtime.registry().unregister("svc"));
    assert!(runtime.registry().resolve::<RecorderMsg>("svc").is_none());

    runtime.shutdown_all().await;
    Ok(())
}

#[tokio::test]
async fn shutdown_releases_serve_forever() -> anyhow::Result<()> {
    let runtime = ArborApp::launch();
    let a = runtime.spawn_named("svc-1", Recorder::default()).await?;
    let b = runtime.spawn_named("svc-2", Recorder::default()).await?;
    assert_eq!(runtime.actor_count(), 2);

    let parked = {
        let runtime = runtime.clone();
        tokio::spawn(async move { runtime.serve_forever().await })
    };

    runtime.shutdown_all().await;
    parked.await?;

    assert!(!a.handle.is_alive());
    assert!(!b.handle.is_alive());
    assert!(a.address.is_closed());
    assert!(b.address.is_closed());
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a fully wired control plane with scripted backends and
//! a fake chat channel.

use fd_adapters::{FakeChannelAdapter, InMemoryBindings, InMemoryMemoryStore, ScriptedBackend};
use fd_core::{AgentSpec, FakeClock, ProviderId, UserId};
use fd_engine::{
    ApprovalGate, BreakerConfig, DispatchConfig, EventBus, JobScheduler, LifecycleConfig,
    LifecycleManager, MessageDispatcher, ProviderRouter, RouterEntryConfig, SchedulerConfig,
    StreamManager,
};
use fd_storage::ControlStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Plane {
    pub clock: FakeClock,
    pub bus: EventBus,
    pub store: ControlStore,
    pub streams: Arc<StreamManager>,
    pub lifecycle: Arc<LifecycleManager<FakeClock>>,
    pub gate: Arc<ApprovalGate<FakeClock>>,
    pub router: Arc<ProviderRouter>,
    pub scheduler: Arc<JobScheduler<FakeClock>>,
    pub dispatcher: Arc<MessageDispatcher<FakeClock>>,
    pub bindings: Arc<InMemoryBindings>,
    pub channel: FakeChannelAdapter,
    pub primary: ScriptedBackend,
    pub secondary: ScriptedBackend,
    pub _dir: tempfile::TempDir,
}

/// Breaker tuned to the failover scenarios: three strikes, 30 s open.
pub fn test_breaker() -> BreakerConfig {
    BreakerConfig {
        failure_threshold: 3,
        open_duration: std::time::Duration::from_secs(30),
        half_open_max_attempts: 1,
        success_threshold_to_close: 2,
    }
}

/// Build a control plane with providers `p1` (priority 1) and `p2`
/// (priority 2), one registered test agent, and a fake telegram channel.
pub fn plane() -> Plane {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);
    let bus = EventBus::default();
    let store = ControlStore::new();
    store.upsert_agent(AgentSpec::builder().build());
    let dir = tempfile::tempdir().expect("tempdir");

    let primary = ScriptedBackend::new();
    let secondary = ScriptedBackend::new();
    let mut router = ProviderRouter::new(bus.clone());
    router.register(RouterEntryConfig {
        provider_id: ProviderId::new("p1"),
        backend: Arc::new(primary.clone()),
        priority: 1,
        breaker: test_breaker(),
        max_concurrency: 2,
    });
    router.register(RouterEntryConfig {
        provider_id: ProviderId::new("p2"),
        backend: Arc::new(secondary.clone()),
        priority: 2,
        breaker: test_breaker(),
        max_concurrency: 2,
    });
    let router = Arc::new(router);

    let streams = Arc::new(StreamManager::default());
    let lifecycle = Arc::new(LifecycleManager::new(
        LifecycleConfig::default(),
        clock.clone(),
        bus.clone(),
        store.clone(),
        dir.path().to_path_buf(),
        Arc::new(InMemoryMemoryStore::new()),
    ));
    let gate = Arc::new(ApprovalGate::new(
        store.clone(),
        bus.clone(),
        clock.clone(),
        b"spec-master-key".to_vec(),
    ));
    let scheduler = Arc::new(JobScheduler::new(
        SchedulerConfig::new(dir.path().to_path_buf()),
        store.clone(),
        router.clone(),
        lifecycle.clone(),
        streams.clone(),
        gate.clone(),
        bus.clone(),
        clock.clone(),
        CancellationToken::new(),
    ));

    let bindings = Arc::new(InMemoryBindings::new());
    let dispatcher = Arc::new(MessageDispatcher::new(
        DispatchConfig::default(),
        store.clone(),
        bindings.clone(),
        bus.clone(),
        clock.clone(),
    ));
    let channel = FakeChannelAdapter::new("telegram");
    dispatcher.attach_channel(Arc::new(channel.clone()));

    Plane {
        clock,
        bus,
        store,
        streams,
        lifecycle,
        gate,
        router,
        scheduler,
        dispatcher,
        bindings,
        channel,
        primary,
        secondary,
        _dir: dir,
    }
}

pub fn inbound(text: &str) -> fd_adapters::RoutedMessage {
    fd_adapters::RoutedMessage {
        channel_type: "telegram".to_string(),
        chat_id: "100".to_string(),
        user_account_id: UserId::from_string("usr-u1"),
        text: text.to_string(),
    }
}

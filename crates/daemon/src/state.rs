// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application wiring: every component built once, in dependency order,
//! and torn down in reverse.

use crate::config::DaemonConfig;
use fd_adapters::{EchoBackend, InMemoryBindings, InMemoryMemoryStore};
use fd_core::{ProviderId, SystemClock};
use fd_engine::{
    ApprovalGate, DispatchConfig, EventBus, JobScheduler, LifecycleConfig, LifecycleManager,
    MessageDispatcher, ProviderRouter, RouterEntryConfig, StreamManager,
};
use fd_storage::ControlStore;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shared state handed to every HTTP handler and background task.
pub struct AppContext {
    pub config: DaemonConfig,
    pub store: ControlStore,
    pub bus: EventBus,
    pub streams: Arc<StreamManager>,
    pub lifecycle: Arc<LifecycleManager<SystemClock>>,
    pub gate: Arc<ApprovalGate<SystemClock>>,
    pub scheduler: Arc<JobScheduler<SystemClock>>,
    pub dispatcher: Arc<MessageDispatcher<SystemClock>>,
    pub router: Arc<ProviderRouter>,
    pub bindings: Arc<InMemoryBindings>,
    pub cancel: CancellationToken,
    pub started_at: Instant,
}

impl AppContext {
    /// Build the component graph from configuration.
    ///
    /// Leaves first: store and bus, then streams, lifecycle, gate, router,
    /// scheduler, dispatcher. The cancellation token is the single shutdown
    /// signal every loop observes.
    pub fn build(config: DaemonConfig) -> Arc<AppContext> {
        let clock = SystemClock;
        let store = ControlStore::new();
        let bus = EventBus::default();
        let cancel = CancellationToken::new();

        let streams = Arc::new(StreamManager::new(config.stream_config()));

        let lifecycle = Arc::new(LifecycleManager::new(
            LifecycleConfig::default(),
            clock.clone(),
            bus.clone(),
            store.clone(),
            config.buffer_root(),
            Arc::new(InMemoryMemoryStore::new()),
        ));

        let master_key = match &config.master_key {
            Some(key) => key.clone().into_bytes(),
            None => {
                let mut key = vec![0u8; 32];
                rand::rng().fill_bytes(&mut key);
                tracing::warn!("no master_key configured, using ephemeral key");
                key
            }
        };
        let gate =
            Arc::new(ApprovalGate::new(store.clone(), bus.clone(), clock.clone(), master_key));

        let mut router = ProviderRouter::new(bus.clone());
        for provider in &config.providers {
            router.register(RouterEntryConfig {
                provider_id: ProviderId::new(provider.id.clone()),
                backend: Arc::new(EchoBackend::new()),
                priority: provider.priority,
                breaker: provider.breaker_config(),
                max_concurrency: provider.max_concurrency,
            });
        }
        if config.providers.is_empty() {
            tracing::warn!("no providers configured, registering echo fallback");
            router.register(RouterEntryConfig {
                provider_id: ProviderId::new("echo"),
                backend: Arc::new(EchoBackend::new()),
                priority: 99,
                breaker: Default::default(),
                max_concurrency: 4,
            });
        }
        let router = Arc::new(router);

        let scheduler = Arc::new(JobScheduler::new(
            config.scheduler_config(),
            store.clone(),
            router.clone(),
            lifecycle.clone(),
            streams.clone(),
            gate.clone(),
            bus.clone(),
            clock.clone(),
            cancel.clone(),
        ));

        let bindings = Arc::new(InMemoryBindings::new());
        for agent in &config.agents {
            let spec = fd_core::AgentSpec {
                id: fd_core::AgentId::new(),
                slug: agent.slug.clone(),
                role: agent.role.clone(),
                model_config: fd_core::ModelConfig {
                    model: agent.model.clone(),
                    max_output_tokens: agent.max_output_tokens,
                    provider_hint: None,
                },
                resource_limits: fd_core::ResourceLimits::default(),
                active: true,
            };
            for binding in &agent.bindings {
                bindings.bind(&binding.channel_type, &binding.chat_id, spec.id);
            }
            tracing::info!(slug = %spec.slug, agent_id = %spec.id, "agent registered");
            store.upsert_agent(spec);
        }

        let dispatcher = Arc::new(MessageDispatcher::new(
            DispatchConfig::default(),
            store.clone(),
            bindings.clone(),
            bus.clone(),
            clock,
        ));

        Arc::new(AppContext {
            config,
            store,
            bus,
            streams,
            lifecycle,
            gate,
            scheduler,
            dispatcher,
            router,
            bindings,
            cancel,
            started_at: Instant::now(),
        })
    }
}

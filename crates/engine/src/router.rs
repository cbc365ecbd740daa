// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Priority-ordered provider routing with failure isolation.
//!
//! The router walks the provider table in ascending priority, asks each
//! provider's breaker for admission, and hands back the first admissible
//! backend. Per-provider concurrency is bounded by a semaphore whose
//! acquisition carries the task deadline.

use crate::breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker};
use crate::bus::EventBus;
use fd_adapters::ExecutionBackend;
use fd_core::{AgentId, ErrorClass, Event, ProviderId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Routing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Every provider's breaker rejected the call.
    #[error("no_provider_available")]
    NoProviderAvailable,
    /// Semaphore acquisition did not complete within the deadline.
    #[error("provider slot acquisition timed out: {0}")]
    SlotTimeout(ProviderId),
}

/// Registration-time description of one provider.
pub struct RouterEntryConfig {
    pub provider_id: ProviderId,
    pub backend: Arc<dyn ExecutionBackend>,
    /// Lower is preferred.
    pub priority: u32,
    pub breaker: BreakerConfig,
    /// Concurrent task ceiling for this provider.
    pub max_concurrency: usize,
}

struct ProviderEntry {
    provider_id: ProviderId,
    backend: Arc<dyn ExecutionBackend>,
    priority: u32,
    breaker: CircuitBreaker,
    slots: Arc<Semaphore>,
}

/// A routing decision: which backend will run the task.
#[derive(Clone)]
pub struct Route {
    pub provider_id: ProviderId,
    pub backend: Arc<dyn ExecutionBackend>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("provider_id", &self.provider_id)
            .finish_non_exhaustive()
    }
}

/// Priority-ordered provider table. Registration happens at bootstrap;
/// routing and outcome recording are concurrent afterwards.
pub struct ProviderRouter {
    providers: Vec<ProviderEntry>,
    bus: EventBus,
}

impl ProviderRouter {
    pub fn new(bus: EventBus) -> Self {
        Self { providers: Vec::new(), bus }
    }

    /// Register a provider. Ties in priority keep registration order.
    pub fn register(&mut self, config: RouterEntryConfig) {
        self.providers.push(ProviderEntry {
            provider_id: config.provider_id,
            backend: config.backend,
            priority: config.priority,
            breaker: CircuitBreaker::new(config.breaker),
            slots: Arc::new(Semaphore::new(config.max_concurrency)),
        });
        self.providers.sort_by_key(|p| p.priority);
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.provider_id.clone()).collect()
    }

    /// Pick the admissible provider with the lowest priority number.
    pub fn route(&self, agent_id: &AgentId, now: Instant) -> Result<Route, RouteError> {
        self.route_inner(agent_id, now, false)
    }

    /// Same as [`route`](Self::route), but emits `route:failover` when the
    /// chosen provider is not the top-priority one.
    pub fn route_with_failover(
        &self,
        agent_id: &AgentId,
        now: Instant,
    ) -> Result<Route, RouteError> {
        self.route_inner(agent_id, now, true)
    }

    fn route_inner(
        &self,
        agent_id: &AgentId,
        now: Instant,
        emit_failover: bool,
    ) -> Result<Route, RouteError> {
        let mut skipped = 0u32;
        for entry in &self.providers {
            if !entry.breaker.admit(now) {
                skipped += 1;
                self.bus.emit(Event::RouteSkipped {
                    agent_id: *agent_id,
                    provider_id: entry.provider_id.clone(),
                    reason: "circuit_open".to_string(),
                });
                continue;
            }
            if emit_failover && skipped > 0 {
                // Safe: skipped > 0 implies at least one earlier entry
                let preferred = self.providers[0].provider_id.clone();
                self.bus.emit(Event::RouteFailover {
                    agent_id: *agent_id,
                    provider_id: entry.provider_id.clone(),
                    preferred,
                });
            }
            return Ok(Route {
                provider_id: entry.provider_id.clone(),
                backend: entry.backend.clone(),
            });
        }

        self.bus.emit(Event::RouteExhausted {
            agent_id: *agent_id,
            skipped,
            reason: "all_circuits_open".to_string(),
        });
        Err(RouteError::NoProviderAvailable)
    }

    /// Record one call outcome on exactly one provider's breaker. Unknown
    /// providers are ignored.
    pub fn record_outcome(
        &self,
        provider_id: &ProviderId,
        success: bool,
        error_class: Option<ErrorClass>,
        now: Instant,
    ) {
        let Some(entry) = self.providers.iter().find(|p| p.provider_id == *provider_id) else {
            return;
        };
        if success {
            entry.breaker.record_success();
        } else if error_class.is_some_and(|c| c.counts_toward_breaker()) {
            entry.breaker.record_failure(now);
        } else {
            entry.breaker.record_neutral();
        }
    }

    /// Acquire a concurrency slot for a provider, bounded by `timeout`.
    pub async fn acquire_slot(
        &self,
        provider_id: &ProviderId,
        timeout: Duration,
    ) -> Result<OwnedSemaphorePermit, RouteError> {
        let entry = self
            .providers
            .iter()
            .find(|p| p.provider_id == *provider_id)
            .ok_or(RouteError::NoProviderAvailable)?;
        let slots = entry.slots.clone();
        match tokio::time::timeout(timeout, slots.acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            // Closed semaphores do not happen (never closed); treat like timeout
            Ok(Err(_)) | Err(_) => Err(RouteError::SlotTimeout(provider_id.clone())),
        }
    }

    /// Breaker snapshots for the status surface, in priority order.
    pub fn snapshots(&self, now: Instant) -> Vec<(ProviderId, BreakerSnapshot)> {
        self.providers
            .iter()
            .map(|p| (p.provider_id.clone(), p.breaker.snapshot(now)))
            .collect()
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

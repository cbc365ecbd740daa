// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent lifecycle state machine.
//!
//! The manager exclusively owns in-memory agent state. Transitions for one
//! agent are linearized under the context lock; different agents proceed in
//! parallel. Every transition is published on the event bus.

mod crash;

use crate::bus::EventBus;
use crash::CrashTracker;
use fd_adapters::MemoryStore;
use fd_core::{
    AgentId, AgentSpec, AgentState, Clock, Event, Job, JobId, SteerId,
};
use fd_storage::{ControlStore, RecoveredSession, SessionBuffer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

/// Lifecycle tuning.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Sliding window for crash counting.
    pub crash_window: Duration,
    pub cooldown_base: Duration,
    pub cooldown_max: Duration,
    /// Idle time in `Ready` before scale-to-zero drain.
    pub idle_timeout: Duration,
    /// Expected heartbeat cadence.
    pub heartbeat_interval: Duration,
    /// Missed heartbeats before the agent is unhealthy.
    pub unhealthy_after_missed: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            crash_window: Duration::from_secs(30 * 60),
            cooldown_base: Duration::from_secs(60),
            cooldown_max: Duration::from_secs(15 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
            heartbeat_interval: Duration::from_secs(15),
            unhealthy_after_missed: 3,
        }
    }
}

/// Lifecycle operation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("invalid_state: {from} → {to}")]
    InvalidState { from: AgentState, to: AgentState },
    #[error("in_cooldown: {remaining_ms}ms remaining")]
    InCooldown { remaining_ms: u64 },
    #[error("agent busy: {0}")]
    Busy(String),
    #[error("unknown agent: {0}")]
    UnknownAgent(String),
    #[error("hydration failed: {0}")]
    Hydration(String),
}

/// A steering message queued for a running agent.
#[derive(Debug, Clone, PartialEq)]
pub struct SteerMessage {
    pub id: SteerId,
    pub message: String,
    pub priority: String,
}

/// Everything hydration loaded before the agent may execute.
#[derive(Debug)]
pub struct HydrationContext {
    pub spec: AgentSpec,
    pub job: Option<Job>,
    pub recovered: RecoveredSession,
    /// Context snippets from the vector-memory store. Empty when the fetch
    /// failed or found nothing; hydration proceeds either way.
    pub memory_context: Vec<String>,
}

struct AgentContext {
    state: AgentState,
    last_activity: Instant,
    last_heartbeat: Instant,
    unhealthy_reported: bool,
    current_job: Option<JobId>,
    steer_listeners: Vec<mpsc::UnboundedSender<SteerMessage>>,
}

impl AgentContext {
    fn new(now: Instant) -> Self {
        Self {
            state: AgentState::Booting,
            last_activity: now,
            last_heartbeat: now,
            unhealthy_reported: false,
            current_job: None,
            steer_listeners: Vec::new(),
        }
    }
}

/// Owner of all in-memory agent state.
pub struct LifecycleManager<C: Clock> {
    config: LifecycleConfig,
    clock: C,
    bus: EventBus,
    store: ControlStore,
    buffer_root: PathBuf,
    memory: Arc<dyn MemoryStore>,
    contexts: Mutex<HashMap<String, AgentContext>>,
    crash_trackers: Mutex<HashMap<String, CrashTracker>>,
}

impl<C: Clock> LifecycleManager<C> {
    pub fn new(
        config: LifecycleConfig,
        clock: C,
        bus: EventBus,
        store: ControlStore,
        buffer_root: PathBuf,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            config,
            clock,
            bus,
            store,
            buffer_root,
            memory,
            contexts: Mutex::new(HashMap::new()),
            crash_trackers: Mutex::new(HashMap::new()),
        }
    }

    /// Current state, `None` for agents never booted in this process.
    pub fn state(&self, agent_id: &AgentId) -> Option<AgentState> {
        self.contexts.lock().get(agent_id.as_str()).map(|ctx| ctx.state)
    }

    /// All known agents and their states, for the status surface.
    pub fn snapshot(&self) -> Vec<(String, AgentState)> {
        self.contexts
            .lock()
            .iter()
            .map(|(id, ctx)| (id.clone(), ctx.state))
            .collect()
    }

    /// Boot an agent into `Booting`. Rejected while crash-loop cooldown is
    /// in effect or while a previous incarnation is still live.
    pub fn boot(&self, agent_id: &AgentId) -> Result<(), LifecycleError> {
        let now = self.clock.now();
        if let Some(remaining) = self.cooldown_remaining(agent_id) {
            return Err(LifecycleError::InCooldown {
                remaining_ms: remaining.as_millis() as u64,
            });
        }

        let mut contexts = self.contexts.lock();
        match contexts.get(agent_id.as_str()) {
            Some(ctx) if !ctx.state.is_terminal() => {
                return Err(LifecycleError::Busy(agent_id.to_string()));
            }
            _ => {}
        }
        contexts.insert(agent_id.to_string(), AgentContext::new(now));
        drop(contexts);

        self.emit(agent_id, AgentState::Terminated, AgentState::Booting, None);
        Ok(())
    }

    /// Hydrate a booting agent: three concurrent loads, then an optional
    /// memory fetch. Leaves the agent in `Ready`.
    pub async fn hydrate(
        &self,
        agent_id: &AgentId,
        job_id: Option<&JobId>,
    ) -> Result<HydrationContext, LifecycleError> {
        self.transition(agent_id, AgentState::Hydrating, None)?;

        let spec_load = async {
            self.store
                .get_agent(agent_id.as_str())
                .ok_or_else(|| LifecycleError::Hydration(format!("agent not registered: {agent_id}")))
        };
        let job_load = async { job_id.and_then(|id| self.store.get_job(id.as_str())) };
        let recovery_load = async {
            match job_id {
                Some(id) => {
                    let root = self.buffer_root.clone();
                    let id = *id;
                    tokio::task::spawn_blocking(move || SessionBuffer::recover(&root, &id))
                        .await
                        .map_err(|e| LifecycleError::Hydration(e.to_string()))?
                        .map_err(|e| LifecycleError::Hydration(e.to_string()))
                }
                None => Ok(RecoveredSession {
                    last_checkpoint: None,
                    events_since_checkpoint: Vec::new(),
                    session_file: None,
                }),
            }
        };

        let (spec, job, recovered) = tokio::join!(spec_load, job_load, recovery_load);
        let spec = spec?;
        let recovered = recovered?;

        // Memory fetch is best-effort: failure logs and proceeds
        let query = match &job {
            Some(job) => format!("{} {}", spec.role, job.payload.prompt()),
            None => spec.role.clone(),
        };
        let memory_context: Vec<String> = self
            .memory
            .search_text(&query, 5)
            .into_iter()
            .map(|(record, _)| record.text)
            .collect();
        if memory_context.is_empty() {
            tracing::debug!(agent_id = %agent_id, "no memory context found");
        }

        self.transition(agent_id, AgentState::Ready, None)?;
        Ok(HydrationContext { spec, job, recovered, memory_context })
    }

    /// Bring an agent to `Executing` on behalf of a job, booting and
    /// hydrating as needed. Returns the hydration context when a fresh
    /// hydration happened.
    pub async fn ensure_executing(
        &self,
        agent_id: &AgentId,
        job_id: &JobId,
    ) -> Result<Option<HydrationContext>, LifecycleError> {
        let state = self.state(agent_id);
        match state {
            None | Some(AgentState::Terminated) => {
                self.boot(agent_id)?;
                let context = match self.hydrate(agent_id, Some(job_id)).await {
                    Ok(context) => context,
                    Err(err) => {
                        // A half-hydrated agent must not stay parked in a
                        // non-terminal state
                        let _ = self.crash(agent_id, "hydration failed");
                        return Err(err);
                    }
                };
                self.begin_execution(agent_id, job_id)?;
                Ok(Some(context))
            }
            Some(AgentState::Ready) => {
                self.begin_execution(agent_id, job_id)?;
                Ok(None)
            }
            Some(state @ (AgentState::Executing
            | AgentState::Booting
            | AgentState::Hydrating
            | AgentState::Draining)) => {
                tracing::debug!(agent_id = %agent_id, state = %state, "agent busy");
                Err(LifecycleError::Busy(agent_id.to_string()))
            }
        }
    }

    fn begin_execution(&self, agent_id: &AgentId, job_id: &JobId) -> Result<(), LifecycleError> {
        self.transition(agent_id, AgentState::Executing, None)?;
        let mut contexts = self.contexts.lock();
        if let Some(ctx) = contexts.get_mut(agent_id.as_str()) {
            ctx.current_job = Some(*job_id);
            ctx.last_activity = self.clock.now();
        }
        Ok(())
    }

    /// Release an executing agent back to `Ready` after its job finishes.
    pub fn release(&self, agent_id: &AgentId) -> Result<(), LifecycleError> {
        self.transition(agent_id, AgentState::Ready, None)?;
        let mut contexts = self.contexts.lock();
        if let Some(ctx) = contexts.get_mut(agent_id.as_str()) {
            ctx.current_job = None;
            ctx.last_activity = self.clock.now();
        }
        Ok(())
    }

    /// Graceful drain: `Ready`/`Executing` → `Draining` → `Terminated`.
    pub fn drain(&self, agent_id: &AgentId) -> Result<(), LifecycleError> {
        self.transition(agent_id, AgentState::Draining, None)?;
        self.transition(agent_id, AgentState::Terminated, Some("drained".to_string()))?;
        Ok(())
    }

    /// Crash: force any non-terminal state to `Terminated`, record the
    /// crash, and return the imposed cooldown.
    pub fn crash(&self, agent_id: &AgentId, reason: &str) -> Result<Duration, LifecycleError> {
        let now = self.clock.now();
        let from = {
            let mut contexts = self.contexts.lock();
            let ctx = contexts
                .get_mut(agent_id.as_str())
                .ok_or_else(|| LifecycleError::UnknownAgent(agent_id.to_string()))?;
            if ctx.state.is_terminal() {
                return Err(LifecycleError::InvalidState {
                    from: ctx.state,
                    to: AgentState::Terminated,
                });
            }
            let from = ctx.state;
            ctx.state = AgentState::Terminated;
            ctx.current_job = None;
            ctx.steer_listeners.clear();
            from
        };
        self.emit(agent_id, from, AgentState::Terminated, Some(reason.to_string()));

        let cooldown = self.crash_trackers.lock().entry(agent_id.to_string()).or_default().record_crash(
            now,
            self.config.crash_window,
            self.config.cooldown_base,
            self.config.cooldown_max,
        );
        tracing::warn!(
            agent_id = %agent_id,
            reason,
            cooldown_ms = cooldown.as_millis() as u64,
            "agent crashed"
        );
        Ok(cooldown)
    }

    /// Time left in the agent's crash-loop cooldown.
    pub fn cooldown_remaining(&self, agent_id: &AgentId) -> Option<Duration> {
        self.crash_trackers
            .lock()
            .get(agent_id.as_str())
            .and_then(|t| t.remaining(self.clock.now()))
    }

    /// Deliver a steering message. Legal only while `Executing`.
    pub fn steer(
        &self,
        agent_id: &AgentId,
        message: &str,
        priority: &str,
    ) -> Result<SteerId, LifecycleError> {
        let steer = SteerMessage {
            id: SteerId::new(),
            message: message.to_string(),
            priority: priority.to_string(),
        };
        {
            let mut contexts = self.contexts.lock();
            let ctx = contexts
                .get_mut(agent_id.as_str())
                .ok_or_else(|| LifecycleError::UnknownAgent(agent_id.to_string()))?;
            if ctx.state != AgentState::Executing {
                return Err(LifecycleError::InvalidState {
                    from: ctx.state,
                    to: AgentState::Executing,
                });
            }
            ctx.last_activity = self.clock.now();
            ctx.steer_listeners.retain(|tx| tx.send(steer.clone()).is_ok());
        }
        self.bus.emit(Event::AgentSteer {
            agent_id: *agent_id,
            steer_message_id: steer.id.to_string(),
            priority: steer.priority.clone(),
        });
        Ok(steer.id)
    }

    /// Register for steering messages of one agent. The scheduler registers
    /// while driving a job and forwards messages to the backend handle.
    pub fn register_steer_listener(
        &self,
        agent_id: &AgentId,
    ) -> mpsc::UnboundedReceiver<SteerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut contexts = self.contexts.lock();
        if let Some(ctx) = contexts.get_mut(agent_id.as_str()) {
            ctx.steer_listeners.push(tx);
        }
        rx
    }

    /// Record a heartbeat. Heartbeats keep the agent healthy; they do not
    /// count as activity, or an idle agent could never scale to zero.
    pub fn heartbeat(&self, agent_id: &AgentId) {
        let mut contexts = self.contexts.lock();
        if let Some(ctx) = contexts.get_mut(agent_id.as_str()) {
            ctx.last_heartbeat = self.clock.now();
            ctx.unhealthy_reported = false;
        }
    }

    /// Reset the idle timer (run/resume/steer touchpoints).
    pub fn touch(&self, agent_id: &AgentId) {
        let mut contexts = self.contexts.lock();
        if let Some(ctx) = contexts.get_mut(agent_id.as_str()) {
            ctx.last_activity = self.clock.now();
        }
    }

    /// Periodic sweep: flag agents with missed heartbeats, terminate
    /// unhealthy ones, and drain idle `Ready` agents.
    pub fn tick(&self) {
        let now = self.clock.now();
        let unhealthy_after =
            self.config.heartbeat_interval * self.config.unhealthy_after_missed;

        let mut unhealthy = Vec::new();
        let mut idle = Vec::new();
        {
            let mut contexts = self.contexts.lock();
            for (id, ctx) in contexts.iter_mut() {
                if ctx.state.is_terminal() {
                    continue;
                }
                if now.duration_since(ctx.last_heartbeat) >= unhealthy_after
                    && !ctx.unhealthy_reported
                {
                    ctx.unhealthy_reported = true;
                    unhealthy.push(AgentId::from_string(id));
                } else if ctx.state == AgentState::Ready
                    && now.duration_since(ctx.last_activity) >= self.config.idle_timeout
                {
                    idle.push(AgentId::from_string(id));
                }
            }
        }

        for agent_id in unhealthy {
            self.bus.emit(Event::AgentUnhealthy {
                agent_id,
                missed_heartbeats: self.config.unhealthy_after_missed,
            });
            if let Err(err) = self.crash(&agent_id, "missed heartbeats") {
                tracing::debug!(agent_id = %agent_id, error = %err, "unhealthy crash skipped");
            }
        }
        for agent_id in idle {
            tracing::info!(agent_id = %agent_id, "idle timeout, scaling to zero");
            if let Err(err) = self.drain(&agent_id) {
                tracing::debug!(agent_id = %agent_id, error = %err, "idle drain skipped");
            }
        }
    }

    /// Guarded transition along the lifecycle graph.
    fn transition(
        &self,
        agent_id: &AgentId,
        to: AgentState,
        reason: Option<String>,
    ) -> Result<(), LifecycleError> {
        let from = {
            let mut contexts = self.contexts.lock();
            let ctx = contexts
                .get_mut(agent_id.as_str())
                .ok_or_else(|| LifecycleError::UnknownAgent(agent_id.to_string()))?;
            if !ctx.state.can_transition_to(to) {
                return Err(LifecycleError::InvalidState { from: ctx.state, to });
            }
            let from = ctx.state;
            ctx.state = to;
            from
        };
        self.emit(agent_id, from, to, reason);
        Ok(())
    }

    fn emit(&self, agent_id: &AgentId, from: AgentState, to: AgentState, reason: Option<String>) {
        tracing::info!(agent_id = %agent_id, from = %from, to = %to, "lifecycle transition");
        self.bus.emit(Event::AgentState { agent_id: *agent_id, from, to, reason });
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

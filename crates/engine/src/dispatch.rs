// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat-to-job dispatch.
//!
//! Inbound messages resolve to (agent, session), become `CHAT_RESPONSE`
//! jobs, and the completion is relayed back to the originating channel.
//! User-visible failures are fixed strings; internals never leak to chat.

use crate::bus::EventBus;
use fd_adapters::{
    ApprovalNotification, BindingResolver, ChannelAdapter, OutboundMessage, RoutedMessage,
};
use fd_core::{
    Clock, Event, HistoryEntry, Job, JobConfig, JobId, JobPayload, JobStatus, MessageRole,
    SessionId,
};
use fd_storage::ControlStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Reply for chats with no bound agent.
pub const NO_AGENT_REPLY: &str = "No agent is assigned to this chat.";
/// Reply for failed or timed-out jobs.
pub const ERROR_REPLY: &str =
    "Something went wrong while handling your message. Please try again.";

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Prior messages loaded as conversation history.
    pub max_history_messages: usize,
    /// Completion-watch poll cadence.
    pub poll_interval: Duration,
    /// Completion-watch deadline.
    pub watch_timeout: Duration,
    pub job_max_attempts: u32,
    pub job_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_history_messages: 50,
            poll_interval: Duration::from_secs(2),
            watch_timeout: Duration::from_secs(120),
            job_max_attempts: 3,
            job_timeout_ms: 120_000,
        }
    }
}

/// Maps inbound channel traffic to jobs and relays completions back.
pub struct MessageDispatcher<C: Clock> {
    config: DispatchConfig,
    store: ControlStore,
    bindings: Arc<dyn BindingResolver>,
    channels: Mutex<HashMap<String, Arc<dyn ChannelAdapter>>>,
    bus: EventBus,
    clock: C,
    inbound_tx: mpsc::UnboundedSender<RoutedMessage>,
    inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<RoutedMessage>>>,
}

impl<C: Clock> MessageDispatcher<C> {
    pub fn new(
        config: DispatchConfig,
        store: ControlStore,
        bindings: Arc<dyn BindingResolver>,
        bus: EventBus,
        clock: C,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            config,
            store,
            bindings,
            channels: Mutex::new(HashMap::new()),
            bus,
            clock,
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
        }
    }

    /// Wire a channel adapter into the dispatcher: inbound messages are
    /// queued for [`run`](Self::run), outbound replies go through the
    /// adapter by channel type.
    pub fn attach_channel(&self, adapter: Arc<dyn ChannelAdapter>) {
        let tx = self.inbound_tx.clone();
        adapter.on_message(Arc::new(move |message| {
            // Handlers never throw; a closed queue means shutdown
            let _ = tx.send(message);
        }));
        self.channels
            .lock()
            .insert(adapter.channel_type().to_string(), adapter);
    }

    /// Consume inbound messages and forward approval prompts until
    /// cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let Some(mut inbound) = self.inbound_rx.lock().take() else {
            tracing::error!("dispatcher run() called twice");
            return;
        };
        let mut bus_rx = self.bus.subscribe();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                message = inbound.recv() => {
                    let Some(message) = message else { return };
                    self.handle_message(message).await;
                }
                event = bus_rx.recv() => {
                    if let Ok(Event::ApprovalRequested { approval_id, job_id, .. }) = event {
                        self.forward_approval(approval_id.as_str(), &job_id).await;
                    }
                }
            }
        }
    }

    /// Dispatch one inbound message. Returns the created job, if any.
    pub async fn handle_message(self: &Arc<Self>, message: RoutedMessage) -> Option<JobId> {
        let Some(agent_id) = self.bindings.resolve(&message.channel_type, &message.chat_id)
        else {
            self.send_text(&message.channel_type, &message.chat_id, NO_AGENT_REPLY).await;
            return None;
        };

        let now = self.clock.epoch_ms();
        let channel_id = message.channel_id();
        let (session, created) = self.store.find_or_create_session(
            agent_id,
            message.user_account_id,
            Some(&channel_id),
            now,
        );
        if created {
            tracing::info!(session_id = %session.id, channel_id, "session created");
        }

        if let Err(err) =
            self.store.append_message(&session.id, MessageRole::User, &message.text, now)
        {
            tracing::error!(session_id = %session.id, error = %err, "user message not stored");
            self.send_text(&message.channel_type, &message.chat_id, ERROR_REPLY).await;
            return None;
        }

        let conversation_history: Vec<HistoryEntry> = self
            .store
            .history_excluding_latest(session.id.as_str(), self.config.max_history_messages)
            .into_iter()
            .map(|m| HistoryEntry { role: m.role, content: m.content })
            .collect();

        let job = Job::new(
            JobConfig::new(
                agent_id,
                session.id,
                JobPayload::ChatResponse {
                    prompt: message.text.clone(),
                    goal_type: "research".to_string(),
                    conversation_history,
                },
            )
            .max_attempts(self.config.job_max_attempts)
            .timeout_ms(self.config.job_timeout_ms),
            &self.clock,
        );
        let job_id = job.id;
        self.store.insert_job(job);
        if let Err(err) = self.store.transition_job(&job_id, JobStatus::Scheduled, now) {
            tracing::error!(job_id = %job_id, error = %err, "job not schedulable");
            return None;
        }
        self.bus.emit(Event::JobCreated { job_id, agent_id, session_id: session.id });
        tracing::info!(job_id = %job_id, agent_id = %agent_id, "chat job enqueued");

        let dispatcher = self.clone();
        let channel_type = message.channel_type.clone();
        let chat_id = message.chat_id.clone();
        let session_id = session.id;
        tokio::spawn(async move {
            dispatcher.watch_job(job_id, session_id, &channel_type, &chat_id).await;
        });

        Some(job_id)
    }

    /// Poll a job to terminal status and relay the outcome to the channel.
    async fn watch_job(
        &self,
        job_id: JobId,
        session_id: SessionId,
        channel_type: &str,
        chat_id: &str,
    ) {
        let deadline = tokio::time::Instant::now() + self.config.watch_timeout;
        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let Some(job) = self.store.get_job(job_id.as_str()) else {
                tracing::warn!(job_id = %job_id, "watched job disappeared");
                return;
            };
            if job.is_terminal() {
                self.relay_outcome(&job, session_id, channel_type, chat_id).await;
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(job_id = %job_id, "completion watch timed out");
                self.send_text(channel_type, chat_id, ERROR_REPLY).await;
                return;
            }
        }
    }

    async fn relay_outcome(
        &self,
        job: &Job,
        session_id: SessionId,
        channel_type: &str,
        chat_id: &str,
    ) {
        let reply = match job.status {
            JobStatus::Completed => job
                .result
                .as_ref()
                .and_then(|r| r.reply_text())
                .map(str::to_string),
            _ => None,
        };

        match reply {
            Some(text) => {
                let now = self.clock.epoch_ms();
                if let Err(err) = self.store.append_message(
                    &session_id,
                    MessageRole::Assistant,
                    &text,
                    now,
                ) {
                    tracing::error!(
                        session_id = %session_id,
                        error = %err,
                        "assistant message not stored"
                    );
                }
                self.send_text(channel_type, chat_id, &text).await;
            }
            None => {
                self.send_text(channel_type, chat_id, ERROR_REPLY).await;
            }
        }
    }

    /// Push an approval prompt to the chat bound to the job's session.
    async fn forward_approval(&self, approval_id: &str, job_id: &JobId) {
        let Some(approval) = self.store.get_approval(approval_id) else { return };
        let Some(job) = self.store.get_job(job_id.as_str()) else { return };
        let Some(session) = self.store.get_session(job.session_id.as_str()) else { return };
        let Some(channel_id) = session.channel_id else { return };
        let Some((channel_type, chat_id)) = channel_id.split_once(':') else { return };

        let adapter = self.channels.lock().get(channel_type).cloned();
        if let Some(adapter) = adapter {
            let notification = ApprovalNotification {
                approval_id: approval.id,
                summary: approval.action_summary.clone(),
                risk_level: approval.risk_level,
                expires_at_ms: approval.expires_at_ms,
            };
            if let Err(err) = adapter.send_approval_request(chat_id, notification).await {
                tracing::warn!(approval_id, error = %err, "approval prompt not delivered");
            }
        }
    }

    async fn send_text(&self, channel_type: &str, chat_id: &str, text: &str) {
        let adapter = self.channels.lock().get(channel_type).cloned();
        match adapter {
            Some(adapter) => {
                if let Err(err) =
                    adapter.send_message(chat_id, OutboundMessage::text(text)).await
                {
                    tracing::warn!(channel_type, chat_id, error = %err, "send failed");
                }
            }
            None => tracing::warn!(channel_type, "no adapter attached"),
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-in-the-loop approval gate.
//!
//! A pending approval suspends its job until a signed decision arrives or
//! the TTL lapses. Decision tokens are random, returned to the caller
//! exactly once, and stored only as keyed hashes; decisions are linearized
//! under the approval row lock.

use crate::bus::EventBus;
use base64::Engine as _;
use fd_core::{
    AgentId, ApprovalId, ApprovalRequest, ApprovalStatus, AuditAction, AuditEntry, Clock, Event,
    JobId, JobStatus, RiskLevel, MAX_TTL_SECONDS, MIN_TTL_SECONDS,
};
use fd_storage::{ControlStore, StoreError};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Approval-gate failures, named for their HTTP mapping.
///
/// Authorization lives at the HTTP layer (bearer-token roles); an
/// unauthorized caller never reaches the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("not_found")]
    NotFound,
    #[error("already_decided")]
    AlreadyDecided,
    #[error("expired")]
    Expired,
    #[error("invalid decision: {0}")]
    InvalidDecision(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Inputs for creating an approval request.
pub struct CreateApproval {
    pub job_id: JobId,
    pub agent_id: AgentId,
    pub action_type: String,
    pub action_summary: String,
    pub action_detail: serde_json::Value,
    pub ttl_seconds: u64,
    pub risk_level: RiskLevel,
    pub resume_payload: Option<serde_json::Value>,
    /// Actor principal recorded in the audit trail.
    pub requested_by: String,
}

/// A created request plus its one-time plaintext token.
pub struct CreatedApproval {
    pub request: ApprovalRequest,
    /// Returned exactly once; only the keyed hash is stored.
    pub token: String,
}

/// Who is deciding, and how they identified the request.
pub enum DecideBy {
    Id(String),
    Token(String),
}

/// Inputs for deciding an approval.
pub struct DecideApproval {
    pub selector: DecideBy,
    pub decision: ApprovalStatus,
    pub decided_by: String,
    pub channel: String,
    pub reason: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The approval gate. Cheap to clone-free share behind an `Arc`.
pub struct ApprovalGate<C: Clock> {
    store: ControlStore,
    bus: EventBus,
    clock: C,
    master_key: Vec<u8>,
}

impl<C: Clock> ApprovalGate<C> {
    pub fn new(store: ControlStore, bus: EventBus, clock: C, master_key: Vec<u8>) -> Self {
        Self { store, bus, clock, master_key }
    }

    /// Create a pending approval and suspend its job.
    ///
    /// The job moves to `WAITING_FOR_APPROVAL` (releasing the scheduler's
    /// lease) and an `approval:requested` event is published.
    pub fn create_request(
        &self,
        input: CreateApproval,
    ) -> Result<CreatedApproval, ApprovalError> {
        let now = self.clock.epoch_ms();
        let ttl = input.ttl_seconds.clamp(MIN_TTL_SECONDS, MAX_TTL_SECONDS);

        let mut token_bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut token_bytes);
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes);

        let request = ApprovalRequest {
            id: ApprovalId::new(),
            job_id: input.job_id,
            agent_id: input.agent_id,
            action_type: input.action_type,
            action_summary: input.action_summary.clone(),
            action_detail: input.action_detail,
            token_hash: self.hash_token(&token),
            risk_level: input.risk_level,
            status: ApprovalStatus::Pending,
            resume_payload: input.resume_payload,
            created_at_ms: now,
            expires_at_ms: now + ttl * 1_000,
            decided_at_ms: None,
            decided_by: None,
        };

        self.store.transition_job(&input.job_id, JobStatus::WaitingForApproval, now)?;
        self.store.insert_approval(request.clone());
        self.audit(&request.id, AuditAction::Created, &input.requested_by, None, None, None, now);

        self.emit_job_status(&request, JobStatus::WaitingForApproval, None);
        self.bus.emit(Event::ApprovalRequested {
            approval_id: request.id,
            job_id: input.job_id,
            agent_id: input.agent_id,
            risk_level: request.risk_level,
            action_summary: input.action_summary,
        });

        tracing::info!(
            approval_id = %request.id,
            job_id = %request.job_id,
            risk = %request.risk_level,
            "approval requested"
        );
        Ok(CreatedApproval { request, token })
    }

    /// Record a decision, resuming or failing the suspended job.
    pub fn decide(&self, input: DecideApproval) -> Result<ApprovalRequest, ApprovalError> {
        if !matches!(input.decision, ApprovalStatus::Approved | ApprovalStatus::Rejected) {
            return Err(ApprovalError::InvalidDecision(input.decision.to_string()));
        }

        let request = match &input.selector {
            DecideBy::Id(id) => self.store.get_approval(id).ok_or(ApprovalError::NotFound)?,
            DecideBy::Token(token) => self
                .store
                .find_approval_by_token_hash(&self.hash_token(token))
                .ok_or(ApprovalError::NotFound)?,
        };

        let now = self.clock.epoch_ms();
        // Check-and-set under the row lock so a racing second decision
        // observes AlreadyDecided, never a double transition
        let mut outcome = Err(ApprovalError::AlreadyDecided);
        let updated = self.store.update_approval(&request.id, |row| {
            if row.status != ApprovalStatus::Pending {
                outcome = Err(ApprovalError::AlreadyDecided);
                return;
            }
            if now >= row.expires_at_ms {
                outcome = Err(ApprovalError::Expired);
                return;
            }
            row.status = input.decision;
            row.decided_at_ms = Some(now);
            row.decided_by = Some(input.decided_by.clone());
            outcome = Ok(());
        })?;
        outcome?;

        match input.decision {
            ApprovalStatus::Approved => {
                if let Some(payload) = &updated.resume_payload {
                    let payload = payload.clone();
                    self.store
                        .update_job(&updated.job_id, |job| job.resume_payload = Some(payload))?;
                }
                self.store.update_job(&updated.job_id, |job| job.run_at_ms = now)?;
                self.store.transition_job(&updated.job_id, JobStatus::Scheduled, now)?;
                self.emit_job_status(&updated, JobStatus::Scheduled, None);
            }
            ApprovalStatus::Rejected => {
                self.store
                    .update_job(&updated.job_id, |job| {
                        job.last_error = Some("approval_rejected".to_string());
                    })?;
                self.store.transition_job(&updated.job_id, JobStatus::Failed, now)?;
                self.emit_job_status(&updated, JobStatus::Failed, Some("approval_rejected"));
            }
            _ => {}
        }

        let audit_action = if input.decision == ApprovalStatus::Approved {
            AuditAction::Approved
        } else {
            AuditAction::Rejected
        };
        self.audit(
            &updated.id,
            audit_action,
            &input.decided_by,
            input.ip.as_deref(),
            input.user_agent.as_deref(),
            input.reason.as_deref(),
            now,
        );
        self.bus.emit(Event::ApprovalDecided {
            approval_id: updated.id,
            job_id: updated.job_id,
            agent_id: updated.agent_id,
            decision: input.decision,
        });

        tracing::info!(
            approval_id = %updated.id,
            decision = %input.decision,
            decided_by = %input.decided_by,
            channel = %input.channel,
            "approval decided"
        );
        Ok(updated)
    }

    /// Sweep pending approvals past their deadline: mark them expired and
    /// fail their waiting jobs. Returns the expired requests.
    pub fn expire_due(&self) -> Vec<ApprovalRequest> {
        let now = self.clock.epoch_ms();
        let mut expired = Vec::new();
        for request in self.store.expired_approvals(now) {
            let result = self.store.update_approval(&request.id, |row| {
                if row.status == ApprovalStatus::Pending {
                    row.status = ApprovalStatus::Expired;
                    row.decided_at_ms = Some(now);
                }
            });
            let Ok(updated) = result else { continue };
            if updated.status != ApprovalStatus::Expired {
                continue;
            }

            let _ = self.store.update_job(&updated.job_id, |job| {
                job.last_error = Some("approval_expired".to_string());
            });
            if let Err(err) = self.store.transition_job(&updated.job_id, JobStatus::Failed, now)
            {
                tracing::warn!(
                    approval_id = %updated.id,
                    job_id = %updated.job_id,
                    error = %err,
                    "expired approval had no waiting job"
                );
            } else {
                self.emit_job_status(&updated, JobStatus::Failed, Some("approval_expired"));
            }

            self.audit(&updated.id, AuditAction::Expired, "system", None, None, None, now);
            self.bus.emit(Event::ApprovalExpired {
                approval_id: updated.id,
                job_id: updated.job_id,
                agent_id: updated.agent_id,
            });
            tracing::info!(approval_id = %updated.id, "approval expired");
            expired.push(updated);
        }
        expired
    }

    fn hash_token(&self, token: &str) -> String {
        // Key length is unconstrained for HMAC; new_from_slice cannot fail
        let mut mac = match HmacSha256::new_from_slice(&self.master_key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts any key length"),
        };
        mac.update(token.as_bytes());
        base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }

    fn emit_job_status(&self, request: &ApprovalRequest, status: JobStatus, error: Option<&str>) {
        let attempt = self.store.get_job(request.job_id.as_str()).map_or(0, |j| j.attempt);
        self.bus.emit(Event::JobStatusChanged {
            job_id: request.job_id,
            agent_id: request.agent_id,
            status,
            attempt,
            last_error: error.map(str::to_string),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn audit(
        &self,
        approval_id: &ApprovalId,
        action: AuditAction,
        actor: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        reason: Option<&str>,
        at_ms: u64,
    ) {
        self.store.append_audit(AuditEntry {
            id: uuid::Uuid::new_v4(),
            approval_id: *approval_id,
            action,
            actor: actor.to_string(),
            ip: ip.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            reason: reason.map(str::to_string),
            at_ms,
        });
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: TOML file plus `FD_*` environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_listen_addr() -> String {
    "127.0.0.1:8800".to_string()
}

fn default_workers() -> usize {
    2
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_sweep_interval_ms() -> u64 {
    1_000
}

fn default_replay_capacity() -> usize {
    256
}

fn default_pending_capacity() -> usize {
    256
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_priority() -> u32 {
    1
}

fn default_max_concurrency() -> usize {
    4
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_duration_ms() -> u64 {
    30_000
}

fn default_half_open_max_attempts() -> u32 {
    1
}

fn default_success_threshold_to_close() -> u32 {
    2
}

/// Bearer-token role lists. Empty lists mean open (development) mode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub operator_tokens: Vec<String>,
    #[serde(default)]
    pub approver_tokens: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self { workers: default_workers(), poll_interval_ms: default_poll_interval_ms() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamSection {
    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: usize,
    #[serde(default = "default_pending_capacity")]
    pub pending_capacity: usize,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            replay_capacity: default_replay_capacity(),
            pending_capacity: default_pending_capacity(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

/// One chat binding for an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingSection {
    pub channel_type: String,
    pub chat_id: String,
}

fn default_model() -> String {
    "claude-sonnet".to_string()
}

fn default_max_output_tokens() -> u32 {
    4_096
}

/// One fleet agent registered at bootstrap.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    pub slug: String,
    pub role: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub bindings: Vec<BindingSection>,
}

/// One provider entry in the routing table. The only in-tree backend kind
/// is `echo`; real provider backends register through the bootstrap API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    pub id: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_open_duration_ms")]
    pub open_duration_ms: u64,
    #[serde(default = "default_half_open_max_attempts")]
    pub half_open_max_attempts: u32,
    #[serde(default = "default_success_threshold_to_close")]
    pub success_threshold_to_close: u32,
}

impl ProviderSection {
    pub fn breaker_config(&self) -> fd_engine::BreakerConfig {
        fd_engine::BreakerConfig {
            failure_threshold: self.failure_threshold,
            open_duration: Duration::from_millis(self.open_duration_ms),
            half_open_max_attempts: self.half_open_max_attempts,
            success_threshold_to_close: self.success_threshold_to_close,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Root for session buffers and logs. Defaults to the platform data dir.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Master key for approval-token hashing. A random per-process key is
    /// generated when absent (tokens then die with the process).
    #[serde(default)]
    pub master_key: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub stream: StreamSection,
    #[serde(default)]
    pub providers: Vec<ProviderSection>,
    #[serde(default)]
    pub agents: Vec<AgentSection>,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            state_dir: None,
            master_key: None,
            auth: AuthConfig::default(),
            scheduler: SchedulerSection::default(),
            stream: StreamSection::default(),
            providers: Vec::new(),
            agents: Vec::new(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl DaemonConfig {
    /// Load from an optional TOML file, then apply `FD_*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => DaemonConfig::default(),
        };

        if let Ok(addr) = std::env::var("FD_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(dir) = std::env::var("FD_STATE_DIR") {
            config.state_dir = Some(PathBuf::from(dir));
        }
        if let Ok(key) = std::env::var("FD_MASTER_KEY") {
            config.master_key = Some(key);
        }
        Ok(config)
    }

    /// Resolved state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::data_dir().unwrap_or_else(std::env::temp_dir).join("flightdeck")
        })
    }

    /// Session-buffer root under the state directory.
    pub fn buffer_root(&self) -> PathBuf {
        self.state_dir().join("sessions")
    }

    pub fn stream_config(&self) -> fd_engine::StreamConfig {
        fd_engine::StreamConfig {
            replay_capacity: self.stream.replay_capacity,
            pending_capacity: self.stream.pending_capacity,
            heartbeat_interval: Duration::from_millis(self.stream.heartbeat_interval_ms),
        }
    }

    pub fn scheduler_config(&self) -> fd_engine::SchedulerConfig {
        let mut config = fd_engine::SchedulerConfig::new(self.buffer_root());
        config.workers = self.scheduler.workers;
        config.poll_interval = Duration::from_millis(self.scheduler.poll_interval_ms);
        config
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

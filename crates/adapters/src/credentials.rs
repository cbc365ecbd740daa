// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential-storage boundary.
//!
//! The control plane only ever sees decrypted material through this KV
//! interface, per call, and never caches plaintext beyond the call.
//! Encryption at rest (per-user key wrapped by the master key) lives behind
//! the implementation.

use fd_core::UserId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A secret string that never appears in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the plaintext. Callers must not persist or log it.
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[redacted]")
    }
}

/// How the credential was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    OAuth,
    ApiKey,
}

/// Serving state of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Active,
    Error,
    Expired,
}

/// Decrypted credential material for one (user, provider) pair.
#[derive(Debug, Clone)]
pub struct ProviderCredential {
    pub user_id: UserId,
    pub provider: String,
    pub kind: CredentialKind,
    pub access_token: Secret,
    pub refresh_token: Option<Secret>,
    pub expires_at_ms: Option<u64>,
    pub status: CredentialStatus,
}

impl ProviderCredential {
    pub fn needs_refresh(&self, now_ms: u64, margin_ms: u64) -> bool {
        match self.expires_at_ms {
            Some(expires) => now_ms + margin_ms >= expires,
            None => false,
        }
    }
}

/// KV interface over encrypted credential storage.
pub trait CredentialStore: Send + Sync {
    /// Decrypt and return the credential for `(user, provider)`.
    fn get(&self, user_id: &UserId, provider: &str) -> Option<ProviderCredential>;

    /// Store (encrypting at rest) a credential.
    fn put(&self, credential: ProviderCredential);

    /// Update the serving status of a stored credential.
    fn set_status(&self, user_id: &UserId, provider: &str, status: CredentialStatus);
}

/// In-memory credential store for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<HashMap<(UserId, String), ProviderCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, user_id: &UserId, provider: &str) -> Option<ProviderCredential> {
        self.credentials.lock().get(&(*user_id, provider.to_string())).cloned()
    }

    fn put(&self, credential: ProviderCredential) {
        self.credentials
            .lock()
            .insert((credential.user_id, credential.provider.clone()), credential);
    }

    fn set_status(&self, user_id: &UserId, provider: &str, status: CredentialStatus) {
        if let Some(credential) =
            self.credentials.lock().get_mut(&(*user_id, provider.to_string()))
        {
            credential.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expires_at_ms: Option<u64>) -> ProviderCredential {
        ProviderCredential {
            user_id: UserId::from_string("usr-1"),
            provider: "anthropic".to_string(),
            kind: CredentialKind::OAuth,
            access_token: Secret::new("tok-plain"),
            refresh_token: Some(Secret::new("ref-plain")),
            expires_at_ms,
            status: CredentialStatus::Active,
        }
    }

    #[test]
    fn secret_never_prints_plaintext() {
        let secret = Secret::new("tok-plain");
        assert!(!format!("{secret}").contains("tok-plain"));
        assert!(!format!("{secret:?}").contains("tok-plain"));
        assert_eq!(secret.reveal(), "tok-plain");
    }

    #[test]
    fn store_round_trip_and_status() {
        let store = InMemoryCredentialStore::new();
        store.put(credential(None));

        let user = UserId::from_string("usr-1");
        assert!(store.get(&user, "anthropic").is_some());
        assert!(store.get(&user, "openai").is_none());

        store.set_status(&user, "anthropic", CredentialStatus::Expired);
        assert_eq!(store.get(&user, "anthropic").unwrap().status, CredentialStatus::Expired);
    }

    #[test]
    fn refresh_margin() {
        let cred = credential(Some(10_000));
        assert!(!cred.needs_refresh(5_000, 1_000));
        assert!(cred.needs_refresh(9_500, 1_000));
        assert!(!credential(None).needs_refresh(u64::MAX, 0));
    }
}

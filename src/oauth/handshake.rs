//! Three-legged handshake state
//!
//! A started handshake leaves its request token secret in [`PendingHandshakes`],
//! keyed by the request token the authorization server will echo back on the
//! callback. Completing the handshake removes the entry, so every request token is
//! usable at most once. Entries older than the configured TTL are dropped.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::BridgeError;
use crate::models::{AccessToken, RequestToken};
use crate::oauth::provider::AuthorizationProvider;
use crate::utils::logging::LoggingHelper;

/// Default lifetime of a started handshake
pub const DEFAULT_PENDING_TTL_SECONDS: i64 = 600;

struct PendingHandshake {
    secret: String,
    created_at: DateTime<Utc>,
}

/// Request tokens awaiting their callback
pub struct PendingHandshakes {
    entries: Mutex<HashMap<String, PendingHandshake>>,
    ttl: Duration,
}

impl PendingHandshakes {
    #[must_use]
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Remember a request token; returns the number of handshakes now pending
    pub fn insert(&self, request_token: RequestToken) -> usize {
        self.insert_at(request_token, Utc::now())
    }

    fn insert_at(&self, request_token: RequestToken, created_at: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock();
        let expired = Self::purge(&mut entries, self.ttl);
        LoggingHelper::log_pending_expired(expired);

        entries.insert(
            request_token.token,
            PendingHandshake {
                secret: request_token.secret,
                created_at,
            },
        );
        entries.len()
    }

    /// Remove and return the pending request token, unless unknown or expired
    pub fn take(&self, token: &str) -> Option<RequestToken> {
        let entry = self.entries.lock().remove(token)?;
        if Utc::now() - entry.created_at > self.ttl {
            return None;
        }
        Some(RequestToken::new(token, entry.secret))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn purge(entries: &mut HashMap<String, PendingHandshake>, ttl: Duration) -> usize {
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at <= ttl);
        before - entries.len()
    }
}

/// Drives the handshake against an [`AuthorizationProvider`]
pub struct HandshakeEngine {
    provider: Arc<dyn AuthorizationProvider>,
    pending: PendingHandshakes,
}

impl HandshakeEngine {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthorizationProvider>, pending_ttl_seconds: i64) -> Self {
        Self {
            provider,
            pending: PendingHandshakes::new(pending_ttl_seconds),
        }
    }

    #[must_use]
    pub const fn pending(&self) -> &PendingHandshakes {
        &self.pending
    }

    /// Obtain a request token and return the URL the user must visit
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UpstreamAuth`] if no request token could be obtained
    pub async fn start(&self) -> Result<String, BridgeError> {
        let request_token = self.provider.request_token().await.inspect_err(|e| {
            LoggingHelper::log_handshake_failed("request token", &e.to_string());
        })?;

        let url = self.provider.authorization_url(&request_token);
        let pending = self.pending.insert(request_token);
        LoggingHelper::log_handshake_started(pending);
        Ok(url)
    }

    /// Exchange the callback's token and verifier for an access token
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UpstreamAuth`] if the token is unknown or expired, or
    /// the exchange is rejected
    pub async fn complete(&self, token: &str, verifier: &str) -> Result<AccessToken, BridgeError> {
        let Some(request_token) = self.pending.take(token) else {
            LoggingHelper::log_handshake_failed("callback", "unknown or expired request token");
            return Err(BridgeError::UpstreamAuth(
                "unknown or expired request token".to_string(),
            ));
        };

        let access_token = self
            .provider
            .access_token(&request_token, verifier)
            .await
            .inspect_err(|e| LoggingHelper::log_handshake_failed("access token", &e.to_string()))?;

        LoggingHelper::log_handshake_completed();
        Ok(access_token)
    }
}

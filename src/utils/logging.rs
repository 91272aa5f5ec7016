// Centralized logging for the recurring handshake and session events
use log::{debug, info, warn};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the start of a new handshake
    pub fn log_handshake_started(pending: usize) {
        info!("🔄 Starting OAuth handshake ({pending} pending)");
    }

    /// Log a handshake that reached the access-token step
    pub fn log_handshake_completed() {
        info!("✅ OAuth handshake completed");
    }

    /// Log a handshake step rejected by the authorization server
    pub fn log_handshake_failed(step: &str, reason: &str) {
        warn!("❌ OAuth handshake failed at {step}: {reason}");
    }

    /// Log expiry sweep of abandoned handshakes
    pub fn log_pending_expired(count: usize) {
        if count > 0 {
            debug!("Dropped {count} expired pending handshake(s)");
        }
    }

    /// Log session creation success
    pub fn log_session_established(user_id: &str) {
        info!("Session established for user {user_id}");
    }

    /// Log cookie re-issue for an existing session
    pub fn log_session_refreshed(user_id: &str) {
        debug!("Session refreshed for user {user_id}");
    }

    /// Log explicit logout
    pub fn log_session_cleared(user_id: &str) {
        info!("Session cleared for user {user_id}");
    }

    /// Log a rejected session cookie
    pub fn log_session_rejected(reason: &str) {
        debug!("Session rejected: {reason}");
    }

    /// Log a failed or malformed call to the expense API
    pub fn log_upstream_failure(endpoint: &str, reason: &str) {
        warn!("Upstream call to {endpoint} failed: {reason}");
    }

    /// Log the identity lookup result that aborts a login
    pub fn log_identity_unresolved(reason: &str) {
        warn!("Could not resolve user identity: {reason}");
    }
}

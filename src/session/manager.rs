//! Session Manager
//!
//! Single owner of the session lifecycle: issuing a cookie when a handshake
//! completes, validating the cookie on every protected request, re-issuing it under
//! a fresh session id, and clearing it on logout.
//!
//! The cookie proves nothing on its own. A decoded cookie is only accepted when its
//! `sessionid` equals the id held in the [`SessionStore`] for its `username`, so a
//! new login or a logout invalidates every cookie issued before it.

use actix_web::{cookie::Cookie, HttpRequest};
use std::sync::Arc;

use crate::error::BridgeError;
use crate::models::{AccessToken, CookiePayload, SessionRecord};
use crate::session::codec::CookieCodec;
use crate::session::cookie::{CookieFactory, CookieOptions};
use crate::session::id::new_session_id;
use crate::session::store::SessionStore;
use crate::utils::logging::LoggingHelper;

#[derive(Clone)]
pub struct SessionManager {
    codec: Arc<CookieCodec>,
    store: Arc<SessionStore>,
    cookie_factory: CookieFactory,
}

// =============================================================================
// Construction
// =============================================================================

impl SessionManager {
    /// Create a manager with freshly generated cookie keys
    #[must_use]
    pub fn new(
        options: CookieOptions,
        token_max_age_seconds: i64,
        store: Arc<SessionStore>,
    ) -> Self {
        let codec = CookieCodec::generate(options.name.clone(), token_max_age_seconds);
        Self {
            codec: Arc::new(codec),
            store,
            cookie_factory: CookieFactory::new(options),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    #[must_use]
    pub const fn cookie_factory(&self) -> &CookieFactory {
        &self.cookie_factory
    }

    #[must_use]
    pub fn codec(&self) -> &CookieCodec {
        &self.codec
    }
}

// =============================================================================
// Validation
// =============================================================================

impl SessionManager {
    /// Resolve a raw cookie value to the live session it names
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Decoding`] if the value is malformed, expired or tampered with
    /// - [`BridgeError::InvalidSession`] if no record exists for the user or the
    ///   session id does not match the stored one
    pub fn validate(&self, cookie_value: &str) -> Result<SessionRecord, BridgeError> {
        let payload: CookiePayload = self.codec.decode(cookie_value).inspect_err(|e| {
            LoggingHelper::log_session_rejected(&e.to_string());
        })?;

        let Some(record) = self.store.get(&payload.username) else {
            LoggingHelper::log_session_rejected("no session for user");
            return Err(BridgeError::InvalidSession(
                "no session for user".to_string(),
            ));
        };

        if record.session_id != payload.sessionid {
            LoggingHelper::log_session_rejected("session id superseded");
            return Err(BridgeError::InvalidSession(
                "session id superseded".to_string(),
            ));
        }

        Ok(record)
    }

    /// Validate the session cookie carried by `req`
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidSession`] if the cookie is missing, otherwise
    /// whatever [`Self::validate`] returns
    pub fn validate_request(&self, req: &HttpRequest) -> Result<SessionRecord, BridgeError> {
        let value = self
            .cookie_factory
            .extract_value(req)
            .ok_or_else(|| BridgeError::InvalidSession("session cookie missing".to_string()))?;
        self.validate(&value)
    }
}

// =============================================================================
// Issuing, refreshing and clearing
// =============================================================================

impl SessionManager {
    /// Start a session for a user whose identity was just resolved
    ///
    /// Any previous record for the user is replaced. Nothing is stored if the cookie
    /// cannot be encoded.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encoding`] if the cookie cannot be encoded
    pub fn establish(
        &self,
        user_id: String,
        access_token: AccessToken,
    ) -> Result<Cookie<'static>, BridgeError> {
        let record = SessionRecord::new(user_id, new_session_id(), access_token);
        self.issue(record)
    }

    /// Re-issue the cookie for a validated session under a new session id
    ///
    /// The store only moves to the new id if `record` is still the live session, so
    /// a refresh racing a logout or a newer login never brings the old one back.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Encoding`] if the cookie cannot be encoded
    /// - [`BridgeError::InvalidSession`] if `record` was superseded or cleared
    ///
    /// The stored record is left untouched in both cases.
    pub fn refresh(
        &self,
        record: &SessionRecord,
    ) -> Result<(SessionRecord, Cookie<'static>), BridgeError> {
        let next = record.refreshed(new_session_id());
        let value = self.encode(&next)?;

        if !self.store.replace_if_current(&record.session_id, next.clone()) {
            LoggingHelper::log_session_rejected("session superseded before refresh");
            return Err(BridgeError::InvalidSession(
                "session superseded before refresh".to_string(),
            ));
        }

        LoggingHelper::log_session_refreshed(&next.user_id);
        Ok((next, self.cookie_factory.create_session_cookie(value)))
    }

    /// End the session named by the request's cookie
    ///
    /// # Errors
    ///
    /// Returns the validation error unchanged, or [`BridgeError::InvalidSession`] if
    /// the session was replaced between validation and removal; no state is touched
    /// in either case
    pub fn logout(&self, req: &HttpRequest) -> Result<Cookie<'static>, BridgeError> {
        let record = self.validate_request(req)?;
        if self
            .store
            .delete_if_current(&record.user_id, &record.session_id)
            .is_none()
        {
            return Err(BridgeError::InvalidSession(
                "session superseded before logout".to_string(),
            ));
        }
        LoggingHelper::log_session_cleared(&record.user_id);
        Ok(self.cookie_factory.create_expired_cookie())
    }

    fn issue(&self, record: SessionRecord) -> Result<Cookie<'static>, BridgeError> {
        let value = self.encode(&record)?;
        self.store.put(record);
        Ok(self.cookie_factory.create_session_cookie(value))
    }

    fn encode(&self, record: &SessionRecord) -> Result<String, BridgeError> {
        self.codec
            .encode(&record.cookie_payload())
            .inspect_err(|e| log::error!("Failed to encode session cookie: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::codec::DEFAULT_TOKEN_MAX_AGE_SECONDS;
    use actix_web::test::TestRequest;

    fn manager() -> SessionManager {
        SessionManager::new(
            CookieOptions::default(),
            DEFAULT_TOKEN_MAX_AGE_SECONDS,
            Arc::new(SessionStore::new()),
        )
    }

    fn token() -> AccessToken {
        AccessToken::new("access", "secret")
    }

    #[test]
    fn test_fresh_cookie_validates() {
        let manager = manager();
        let cookie = manager.establish("42".to_string(), token()).unwrap();

        let record = manager.validate(cookie.value()).unwrap();
        assert_eq!(record.user_id, "42");
        assert_eq!(record.access_token, token());
    }

    #[test]
    fn test_relogin_invalidates_previous_cookie() {
        let manager = manager();
        let first = manager.establish("42".to_string(), token()).unwrap();
        let second = manager.establish("42".to_string(), token()).unwrap();

        assert_eq!(manager.store().len(), 1);
        assert!(matches!(
            manager.validate(first.value()),
            Err(BridgeError::InvalidSession(_))
        ));
        assert!(manager.validate(second.value()).is_ok());
    }

    #[test]
    fn test_refresh_keeps_access_token() {
        let manager = manager();
        let cookie = manager.establish("42".to_string(), token()).unwrap();
        let mut record = manager.validate(cookie.value()).unwrap();
        let mut latest = cookie;

        for _ in 0..5 {
            let (next, next_cookie) = manager.refresh(&record).unwrap();
            assert_ne!(next.session_id, record.session_id);
            assert_eq!(next.access_token, token());
            assert!(manager.validate(latest.value()).is_err());
            record = next;
            latest = next_cookie;
        }

        assert_eq!(manager.validate(latest.value()).unwrap(), record);
    }

    #[test]
    fn test_cookie_for_unknown_user_is_rejected() {
        let manager = manager();
        let value = manager
            .codec()
            .encode(&CookiePayload {
                username: "99".to_string(),
                sessionid: "whatever".to_string(),
            })
            .unwrap();

        assert!(matches!(
            manager.validate(&value),
            Err(BridgeError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_logout_clears_record() {
        let manager = manager();
        let cookie = manager.establish("42".to_string(), token()).unwrap();
        let req = TestRequest::default().cookie(cookie.clone()).to_http_request();

        let expired = manager.logout(&req).unwrap();
        assert_eq!(expired.name(), cookie.name());
        assert!(expired.max_age().unwrap().whole_seconds() < 0);
        assert!(!manager.store().contains("42"));
        assert!(manager.validate(cookie.value()).is_err());
    }

    #[test]
    fn test_logout_without_cookie_changes_nothing() {
        let manager = manager();
        manager.establish("42".to_string(), token()).unwrap();
        let req = TestRequest::default().to_http_request();

        assert!(manager.logout(&req).is_err());
        assert!(manager.store().contains("42"));
    }

    #[test]
    fn test_refresh_after_logout_does_not_restore_session() {
        let manager = manager();
        let cookie = manager.establish("42".to_string(), token()).unwrap();
        let record = manager.validate(cookie.value()).unwrap();

        let req = TestRequest::default().cookie(cookie).to_http_request();
        manager.logout(&req).unwrap();

        assert!(matches!(
            manager.refresh(&record),
            Err(BridgeError::InvalidSession(_))
        ));
        assert!(!manager.store().contains("42"));
    }

    #[test]
    fn test_stale_refresh_keeps_newer_login() {
        let manager = manager();
        let first = manager
            .establish("42".to_string(), AccessToken::new("old", "old-secret"))
            .unwrap();
        let stale = manager.validate(first.value()).unwrap();
        let second = manager
            .establish("42".to_string(), AccessToken::new("new", "new-secret"))
            .unwrap();

        assert!(manager.refresh(&stale).is_err());

        let live = manager.validate(second.value()).unwrap();
        assert_eq!(live.access_token.token, "new");
        assert_eq!(manager.store().get("42").unwrap().access_token.token, "new");
    }

    #[test]
    fn test_logout_with_superseded_cookie_keeps_newer_login() {
        let manager = manager();
        let first = manager.establish("42".to_string(), token()).unwrap();
        let second = manager.establish("42".to_string(), token()).unwrap();

        let req = TestRequest::default().cookie(first).to_http_request();
        assert!(manager.logout(&req).is_err());
        assert!(manager.validate(second.value()).is_ok());
    }
}

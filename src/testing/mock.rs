//! Mock upstreams for isolated handler and engine tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::constants::{MOCK_AUTHORIZE_URL, MOCK_VERIFIER};
use crate::api::ExpenseApi;
use crate::error::BridgeError;
use crate::models::{AccessToken, RequestToken};
use crate::oauth::AuthorizationProvider;

/// Authorization server issuing `request-<n>` tokens
///
/// Access tokens are derived from the request token (`access-for-<token>`) and its
/// secret, so a test can tell which handshake produced which access token.
#[derive(Default)]
pub struct MockAuthorizationProvider {
    issued: AtomicUsize,
    exchanges: AtomicUsize,
    fail_request_token: bool,
    fail_access_token: bool,
}

impl MockAuthorizationProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every request-token call
    #[must_use]
    pub fn failing_request_token(mut self) -> Self {
        self.fail_request_token = true;
        self
    }

    /// Reject every access-token exchange
    #[must_use]
    pub fn failing_access_token(mut self) -> Self {
        self.fail_access_token = true;
        self
    }

    /// Number of access-token exchanges attempted
    #[must_use]
    pub fn exchanges(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationProvider for MockAuthorizationProvider {
    async fn request_token(&self) -> Result<RequestToken, BridgeError> {
        if self.fail_request_token {
            return Err(BridgeError::UpstreamAuth("request token refused".to_string()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(RequestToken::new(
            format!("request-{n}"),
            format!("request-secret-{n}"),
        ))
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        format!("{MOCK_AUTHORIZE_URL}?oauth_token={}", request_token.token)
    }

    async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, BridgeError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if self.fail_access_token || verifier != MOCK_VERIFIER {
            return Err(BridgeError::UpstreamAuth("verifier rejected".to_string()));
        }
        Ok(AccessToken::new(
            format!("access-for-{}", request_token.token),
            format!("access-secret-for-{}", request_token.secret),
        ))
    }
}

/// Expense API answering from canned bodies
///
/// `get_current_user` can be answered per access token so several users can log in
/// against one mock. Endpoints without a canned body fail with `UpstreamData`.
#[derive(Default)]
pub struct MockExpenseApi {
    responses: HashMap<String, String>,
    users_by_token: HashMap<String, u64>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockExpenseApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` with `body` for every caller
    #[must_use]
    pub fn with_response(mut self, endpoint: &str, body: impl Into<String>) -> Self {
        self.responses.insert(endpoint.to_string(), body.into());
        self
    }

    /// Answer `get_current_user` with `user_id` for one access token
    #[must_use]
    pub fn with_user_for_token(mut self, access_token: &str, user_id: u64) -> Self {
        self.users_by_token.insert(access_token.to_string(), user_id);
        self
    }

    /// Every call made so far, as `(endpoint, query)`
    #[must_use]
    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(called, _)| called == endpoint)
            .count()
    }
}

#[async_trait]
impl ExpenseApi for MockExpenseApi {
    async fn get(
        &self,
        access_token: &AccessToken,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<String, BridgeError> {
        self.calls
            .lock()
            .push((endpoint.to_string(), query.to_vec()));

        if endpoint == "get_current_user" {
            if let Some(user_id) = self.users_by_token.get(&access_token.token) {
                return Ok(format!(r#"{{"user":{{"id":{user_id}}}}}"#));
            }
        }

        self.responses
            .get(endpoint)
            .cloned()
            .ok_or_else(|| BridgeError::UpstreamData(format!("{endpoint} returned 404")))
    }
}

//! HTTP client for the Splitwise authorization server and REST API
//!
//! Every outbound request is signed with [`OAuthSigner`]. Handshake requests are
//! signed with the request token (or no token); data requests with the user's
//! access token.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use url::Url;

use crate::api::ExpenseApi;
use crate::error::BridgeError;
use crate::models::{AccessToken, RequestToken};
use crate::oauth::provider::{parse_token_response, AuthorizationProvider};
use crate::oauth::signer::{OAuthSigner, TokenCredentials};
use crate::settings::{ApiSettings, OAuthSettings};
use crate::utils::logging::LoggingHelper;

pub struct SplitwiseClient {
    http: reqwest::Client,
    signer: OAuthSigner,
    request_token_url: Url,
    authorize_url: Url,
    access_token_url: Url,
    callback_url: String,
    api_base: String,
}

impl SplitwiseClient {
    /// Build a client from validated settings
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if a URL does not parse or the HTTP
    /// client cannot be built
    pub fn new(oauth: &OAuthSettings, api: &ApiSettings) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()
            .map_err(|e| BridgeError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            signer: OAuthSigner::new(&oauth.consumer_key, &oauth.consumer_secret),
            request_token_url: parse_url("oauth.request_token_url", &oauth.request_token_url)?,
            authorize_url: parse_url("oauth.authorize_url", &oauth.authorize_url)?,
            access_token_url: parse_url("oauth.access_token_url", &oauth.access_token_url)?,
            callback_url: oauth.callback_url.clone(),
            api_base: api.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_for_token(
        &self,
        url: &Url,
        credentials: TokenCredentials<'_>,
        extra_oauth: &[(&str, &str)],
    ) -> Result<String, BridgeError> {
        let header = self
            .signer
            .authorization_header("POST", url, &[], credentials, extra_oauth)?;

        let response = self
            .http
            .post(url.clone())
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| BridgeError::UpstreamAuth(describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::UpstreamAuth(format!(
                "{} returned {status}",
                url.path()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| BridgeError::UpstreamAuth(describe_transport_error(&e)))
    }
}

#[async_trait]
impl AuthorizationProvider for SplitwiseClient {
    async fn request_token(&self) -> Result<RequestToken, BridgeError> {
        let body = self
            .post_for_token(
                &self.request_token_url,
                TokenCredentials::default(),
                &[("oauth_callback", self.callback_url.as_str())],
            )
            .await?;

        let response = parse_token_response(&body)?;
        if !response.callback_confirmed {
            return Err(BridgeError::UpstreamAuth(
                "callback was not confirmed".to_string(),
            ));
        }
        Ok(RequestToken::new(response.token, response.secret))
    }

    fn authorization_url(&self, request_token: &RequestToken) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("oauth_token", &request_token.token);
        url.into()
    }

    async fn access_token(
        &self,
        request_token: &RequestToken,
        verifier: &str,
    ) -> Result<AccessToken, BridgeError> {
        let body = self
            .post_for_token(
                &self.access_token_url,
                TokenCredentials {
                    token: Some(&request_token.token),
                    secret: &request_token.secret,
                },
                &[("oauth_verifier", verifier)],
            )
            .await?;

        let response = parse_token_response(&body)?;
        Ok(AccessToken::new(response.token, response.secret))
    }
}

#[async_trait]
impl ExpenseApi for SplitwiseClient {
    async fn get(
        &self,
        access_token: &AccessToken,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<String, BridgeError> {
        let mut url = Url::parse(&format!("{}/{endpoint}", self.api_base))
            .map_err(|e| BridgeError::UpstreamData(format!("{endpoint}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let header = self.signer.authorization_header(
            "GET",
            &url,
            &[],
            TokenCredentials {
                token: Some(&access_token.token),
                secret: &access_token.secret,
            },
            &[],
        )?;

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, header)
            .send()
            .await
            .map_err(|e| {
                let reason = describe_transport_error(&e);
                LoggingHelper::log_upstream_failure(endpoint, &reason);
                BridgeError::UpstreamData(reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            LoggingHelper::log_upstream_failure(endpoint, status.as_str());
            return Err(BridgeError::UpstreamData(format!(
                "{endpoint} returned {status}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| BridgeError::UpstreamData(describe_transport_error(&e)))
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, BridgeError> {
    Url::parse(value).map_err(|e| BridgeError::Configuration(format!("{field}: {e}")))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else {
        format!("request failed: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SplitwiseClient {
        let oauth = OAuthSettings {
            consumer_key: "key".to_string(),
            consumer_secret: "secret".to_string(),
            ..OAuthSettings::default()
        };
        SplitwiseClient::new(&oauth, &ApiSettings::default()).unwrap()
    }

    #[test]
    fn test_authorization_url_carries_request_token() {
        let url = client().authorization_url(&RequestToken::new("abc def", "secret"));

        assert!(url.starts_with("https://secure.splitwise.com/oauth/authorize?"));
        assert!(url.ends_with("oauth_token=abc+def"));
        assert!(!url.contains("secret"));
    }

    #[test]
    fn test_invalid_url_is_configuration_error() {
        let oauth = OAuthSettings {
            request_token_url: "not a url".to_string(),
            ..OAuthSettings::default()
        };
        let result = SplitwiseClient::new(&oauth, &ApiSettings::default());
        assert!(matches!(result, Err(BridgeError::Configuration(_))));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn client_for(server: &MockServer, timeout_seconds: u64) -> SplitwiseClient {
            let base = server.uri();
            let oauth = OAuthSettings {
                request_token_url: format!("{base}/oauth/request_token"),
                authorize_url: format!("{base}/oauth/authorize"),
                access_token_url: format!("{base}/oauth/access_token"),
                consumer_key: "key".to_string(),
                consumer_secret: "secret".to_string(),
                ..OAuthSettings::default()
            };
            let api = ApiSettings {
                base_url: format!("{base}/api/v3.0"),
                timeout_seconds,
            };
            SplitwiseClient::new(&oauth, &api).unwrap()
        }

        fn authorization_of(request: &wiremock::Request) -> String {
            request
                .headers
                .get("authorization")
                .unwrap()
                .to_str()
                .unwrap()
                .to_string()
        }

        #[tokio::test]
        async fn test_request_token_is_signed_with_callback() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/oauth/request_token"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    "oauth_token=req&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
                ))
                .mount(&server)
                .await;

            let token = client_for(&server, 10).await.request_token().await.unwrap();
            assert_eq!(token.token, "req");
            assert_eq!(token.secret, "req-secret");

            let requests = server.received_requests().await.unwrap();
            let header = authorization_of(&requests[0]);
            assert!(header.starts_with("OAuth "));
            assert!(header.contains("oauth_callback="));
            assert!(header.contains("oauth_signature="));
            assert!(!header.contains("oauth_token="));
        }

        #[tokio::test]
        async fn test_unconfirmed_callback_is_rejected() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/oauth/request_token"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    "oauth_token=req&oauth_token_secret=req-secret&oauth_callback_confirmed=false",
                ))
                .mount(&server)
                .await;

            let result = client_for(&server, 10).await.request_token().await;
            assert!(matches!(result, Err(BridgeError::UpstreamAuth(_))));
        }

        #[tokio::test]
        async fn test_rejected_exchange_is_upstream_auth() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/oauth/access_token"))
                .respond_with(ResponseTemplate::new(401).set_body_string("invalid verifier"))
                .mount(&server)
                .await;

            let result = client_for(&server, 10)
                .await
                .access_token(&RequestToken::new("req", "req-secret"), "verifier")
                .await;
            assert!(matches!(result, Err(BridgeError::UpstreamAuth(_))));

            let requests = server.received_requests().await.unwrap();
            let header = authorization_of(&requests[0]);
            assert!(header.contains("oauth_token=\"req\""));
            assert!(header.contains("oauth_verifier=\"verifier\""));
        }

        #[tokio::test]
        async fn test_slow_authorization_server_times_out() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/oauth/request_token"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(
                            "oauth_token=req&oauth_token_secret=s&oauth_callback_confirmed=true",
                        )
                        .set_delay(Duration::from_secs(3)),
                )
                .mount(&server)
                .await;

            let result = client_for(&server, 1).await.request_token().await;
            match result {
                Err(BridgeError::UpstreamAuth(reason)) => assert_eq!(reason, "request timed out"),
                other => panic!("expected a timeout, got {:?}", other.map(|t| t.token)),
            }
        }

        #[tokio::test]
        async fn test_data_server_error_is_upstream_data() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/v3.0/get_groups"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let result = client_for(&server, 10)
                .await
                .get(&AccessToken::new("access", "access-secret"), "get_groups", &[])
                .await;
            assert!(matches!(result, Err(BridgeError::UpstreamData(_))));
        }

        #[tokio::test]
        async fn test_data_request_is_signed_with_access_token() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/v3.0/get_expenses"))
                .and(query_param("group_id", "7"))
                .and(query_param("limit", "0"))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"expenses":[]}"#))
                .mount(&server)
                .await;

            let query = [
                ("group_id".to_string(), "7".to_string()),
                ("limit".to_string(), "0".to_string()),
            ];
            let body = client_for(&server, 10)
                .await
                .get(&AccessToken::new("access", "access-secret"), "get_expenses", &query)
                .await
                .unwrap();
            assert_eq!(body, r#"{"expenses":[]}"#);

            let requests = server.received_requests().await.unwrap();
            let header = authorization_of(&requests[0]);
            assert!(header.starts_with("OAuth "));
            assert!(header.contains("oauth_token=\"access\""));
            assert!(!header.contains("access-secret"));
        }
    }
}

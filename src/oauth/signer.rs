//! OAuth 1.0a request signing (HMAC-SHA1, RFC 5849 section 3.4)

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use crate::error::BridgeError;
use crate::utils::crypto::generate_token;

type HmacSha1 = Hmac<Sha1>;

/// Protocol parameters that are added to every signed request
const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Percent-encode with the RFC 3986 unreserved set (`A-Z a-z 0-9 - . _ ~`)
#[must_use]
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Scheme, authority and path of `url`, without query or fragment
#[must_use]
pub fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}{}", url.scheme(), url.path()),
        None => format!("{}://{host}{}", url.scheme(), url.path()),
    }
}

/// Encode every pair, sort, and join as `k=v&k=v`
#[must_use]
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(base_uri)&enc(normalized params)`
///
/// `params` must already contain the body parameters and the oauth parameters; the
/// query string of `url` is added here.
#[must_use]
pub fn signature_base_string(method: &str, url: &Url, params: &[(String, String)]) -> String {
    let mut all: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    all.extend_from_slice(params);

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&base_string_uri(url)),
        percent_encode(&normalize_parameters(&all))
    )
}

/// Base64 HMAC-SHA1 of the base string under `enc(consumer_secret)&enc(token_secret)`
///
/// # Errors
///
/// Returns [`BridgeError::Encoding`] if the MAC rejects the key
pub fn sign(
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, BridgeError> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = <HmacSha1 as Mac>::new_from_slice(key.as_bytes())
        .map_err(|e| BridgeError::Encoding(format!("signing key rejected: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Token half of the signing key, if the request is made on behalf of one
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCredentials<'a> {
    pub token: Option<&'a str>,
    pub secret: &'a str,
}

/// Signs requests for one consumer (client application)
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl OAuthSigner {
    #[must_use]
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// `Authorization` header value for a request, with a fresh nonce and timestamp
    ///
    /// `body_params` are form parameters sent in the request body; `extra_oauth`
    /// carries protocol parameters such as `oauth_callback` or `oauth_verifier`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encoding`] if the request cannot be signed
    pub fn authorization_header(
        &self,
        method: &str,
        url: &Url,
        body_params: &[(String, String)],
        credentials: TokenCredentials<'_>,
        extra_oauth: &[(&str, &str)],
    ) -> Result<String, BridgeError> {
        let nonce = generate_token(24);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(
            method,
            url,
            body_params,
            credentials,
            extra_oauth,
            &nonce,
            &timestamp,
        )
    }

    /// Deterministic variant of [`Self::authorization_header`]
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encoding`] if the request cannot be signed
    #[allow(clippy::too_many_arguments)]
    pub fn authorization_header_with(
        &self,
        method: &str,
        url: &Url,
        body_params: &[(String, String)],
        credentials: TokenCredentials<'_>,
        extra_oauth: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, BridgeError> {
        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                SIGNATURE_METHOD.to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = credentials.token {
            oauth.push(("oauth_token".to_string(), token.to_string()));
        }
        oauth.extend(
            extra_oauth
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );

        let mut signed = oauth.clone();
        signed.extend_from_slice(body_params);
        let base = signature_base_string(method, url, &signed);
        let signature = sign(&base, &self.consumer_secret, credentials.secret)?;

        oauth.push(("oauth_signature".to_string(), signature));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }
}

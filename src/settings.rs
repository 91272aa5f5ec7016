use actix_web::cookie::{time::Duration, SameSite};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::BridgeError;
use crate::oauth::DEFAULT_PENDING_TTL_SECONDS;
use crate::session::codec::DEFAULT_TOKEN_MAX_AGE_SECONDS;
use crate::session::cookie::{parse_same_site, CookieOptions, COOKIE_NAME};

/// Environment variable naming an alternative settings file
pub const CONFIG_PATH_ENV: &str = "SPLITGATE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeSettings {
    pub application: ApplicationSettings,
    pub oauth: OAuthSettings,
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Origin of the single-page client: redirect target and the only CORS origin
    pub spa_origin: String,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthSettings {
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub callback_url: String,
    /// Seconds a started handshake waits for its callback
    pub pending_ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    /// Max-Age of the session cookie in the browser
    pub cookie_max_age_seconds: i64,
    /// Age after which the codec rejects a cookie value regardless of Max-Age
    pub token_max_age_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
    pub same_site: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9094,
            spa_origin: "http://localhost:4200".to_string(),
        }
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            request_token_url: "https://secure.splitwise.com/oauth/request_token".to_string(),
            authorize_url: "https://secure.splitwise.com/oauth/authorize".to_string(),
            access_token_url: "https://secure.splitwise.com/oauth/access_token".to_string(),
            consumer_key: String::new(),
            consumer_secret: String::new(),
            callback_url: "http://localhost:9094/expenses".to_string(),
            pending_ttl_seconds: DEFAULT_PENDING_TTL_SECONDS,
        }
    }
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("request_token_url", &self.request_token_url)
            .field("authorize_url", &self.authorize_url)
            .field("access_token_url", &self.access_token_url)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[redacted]")
            .field("callback_url", &self.callback_url)
            .field("pending_ttl_seconds", &self.pending_ttl_seconds)
            .finish()
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://secure.splitwise.com/api/v3.0".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: COOKIE_NAME.to_string(),
            cookie_max_age_seconds: 300,
            token_max_age_seconds: DEFAULT_TOKEN_MAX_AGE_SECONDS,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: "lax".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BridgeSettings {
    /// Load settings from the settings file and environment, then validate them
    ///
    /// The file is `$SPLITGATE_CONFIG` if set, otherwise `Settings.toml` in the
    /// working directory when present. Environment variables override the file.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if:
    /// - The settings file cannot be read or parsed
    /// - The resulting settings fail [`Self::validate`]
    pub fn load() -> Result<Self, BridgeError> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.validate()?;

        Ok(settings)
    }

    fn load_base_settings() -> Result<Self, BridgeError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load_from_path(Path::new(&path));
        }

        let default_config_path = PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            return Self::load_from_path(&default_config_path);
        }

        Ok(Self::default())
    }

    /// Parse a TOML settings file; sections and keys it omits keep their defaults
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if the file cannot be read or parsed
    pub fn load_from_path(path: &Path) -> Result<Self, BridgeError> {
        let toml_content = fs::read_to_string(path).map_err(|e| {
            BridgeError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = basic_toml::from_str(&toml_content).map_err(|e| {
            BridgeError::Configuration(format!("cannot parse {}: {e}", path.display()))
        })?;

        println!("✓ Loaded settings from {}", path.display());
        Ok(settings)
    }

    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_oauth_env_overrides(&mut settings.oauth);
        Self::apply_api_env_overrides(&mut settings.api);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        Self::apply_parsed_env_override("PORT", &mut app_settings.port);
        if let Ok(spa_origin) = std::env::var("SPA_ORIGIN") {
            app_settings.spa_origin = spa_origin;
        }
    }

    fn apply_oauth_env_overrides(oauth_settings: &mut OAuthSettings) {
        if let Ok(key) = std::env::var("OAUTH_CONSUMER_KEY") {
            oauth_settings.consumer_key = key;
        }
        if let Ok(secret) = std::env::var("OAUTH_CONSUMER_SECRET") {
            oauth_settings.consumer_secret = secret;
        }
        if let Ok(callback_url) = std::env::var("OAUTH_CALLBACK_URL") {
            oauth_settings.callback_url = callback_url;
        }
    }

    fn apply_api_env_overrides(api_settings: &mut ApiSettings) {
        if let Ok(base_url) = std::env::var("API_BASE_URL") {
            api_settings.base_url = base_url;
        }
        Self::apply_parsed_env_override("API_TIMEOUT_SECONDS", &mut api_settings.timeout_seconds);
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        Self::apply_parsed_env_override(
            "SESSION_COOKIE_MAX_AGE_SECONDS",
            &mut session_settings.cookie_max_age_seconds,
        );
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        Self::apply_parsed_env_override("COOKIE_SECURE", &mut cookie_settings.secure);
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Replace `target` when `env_var` is set and parses; otherwise leave it alone
    fn apply_parsed_env_override<T: std::str::FromStr>(env_var: &str, target: &mut T) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<T>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Reject settings the bridge cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] naming the first offending setting
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.oauth.consumer_key.trim().is_empty() {
            return Err(config_error("oauth.consumer_key is required"));
        }
        if self.oauth.consumer_secret.trim().is_empty() {
            return Err(config_error("oauth.consumer_secret is required"));
        }

        for (field, value) in [
            ("application.spa_origin", &self.application.spa_origin),
            ("oauth.request_token_url", &self.oauth.request_token_url),
            ("oauth.authorize_url", &self.oauth.authorize_url),
            ("oauth.access_token_url", &self.oauth.access_token_url),
            ("oauth.callback_url", &self.oauth.callback_url),
            ("api.base_url", &self.api.base_url),
        ] {
            Url::parse(value)
                .map_err(|e| BridgeError::Configuration(format!("{field}: {e}")))?;
        }

        if self.session.cookie_name.is_empty() {
            return Err(config_error("session.cookie_name must not be empty"));
        }
        if self.session.cookie_max_age_seconds <= 0 || self.session.token_max_age_seconds <= 0 {
            return Err(config_error("session ages must be positive"));
        }
        if self.oauth.pending_ttl_seconds <= 0 {
            return Err(config_error("oauth.pending_ttl_seconds must be positive"));
        }
        if self.api.timeout_seconds == 0 {
            return Err(config_error("api.timeout_seconds must be positive"));
        }

        let same_site = self.same_site()?;
        if same_site == SameSite::None && !self.cookies.secure {
            return Err(config_error("cookies.same_site = \"none\" requires cookies.secure"));
        }

        Ok(())
    }

    /// Parsed `cookies.same_site`
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] for anything but strict, lax or none
    pub fn same_site(&self) -> Result<SameSite, BridgeError> {
        parse_same_site(&self.cookies.same_site).ok_or_else(|| {
            BridgeError::Configuration(format!(
                "cookies.same_site: unknown value {:?}",
                self.cookies.same_site
            ))
        })
    }

    /// Attributes of the session cookie
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Configuration`] if `cookies.same_site` is invalid
    pub fn cookie_options(&self) -> Result<CookieOptions, BridgeError> {
        Ok(CookieOptions {
            name: self.session.cookie_name.clone(),
            secure: self.cookies.secure,
            same_site: self.same_site()?,
            max_age: Duration::seconds(self.session.cookie_max_age_seconds),
            ..CookieOptions::default()
        })
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

fn config_error(message: &str) -> BridgeError {
    BridgeError::Configuration(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    // Helper function to clean all relevant environment variables for tests
    fn clean_env_vars() {
        for var in [
            "HOST",
            "PORT",
            "SPA_ORIGIN",
            "OAUTH_CONSUMER_KEY",
            "OAUTH_CONSUMER_SECRET",
            "OAUTH_CALLBACK_URL",
            "API_BASE_URL",
            "API_TIMEOUT_SECONDS",
            "SESSION_COOKIE_MAX_AGE_SECONDS",
            "COOKIE_SECURE",
            CONFIG_PATH_ENV,
        ] {
            std::env::remove_var(var);
        }
    }

    fn configured() -> BridgeSettings {
        let mut settings = BridgeSettings::default();
        settings.oauth.consumer_key = "key".to_string();
        settings.oauth.consumer_secret = "secret".to_string();
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = BridgeSettings::default();
        assert_eq!(settings.application.port, 9094);
        assert_eq!(settings.session.cookie_name, "clientMap");
        assert_eq!(settings.session.cookie_max_age_seconds, 300);
        assert_eq!(settings.get_bind_address(), "0.0.0.0:9094");
    }

    #[test]
    fn test_missing_consumer_credentials_rejected() {
        let result = BridgeSettings::default().validate();
        assert!(matches!(result, Err(BridgeError::Configuration(ref msg)) if msg.contains("consumer_key")));
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut settings = configured();
        settings.api.base_url = "splitwise".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_same_site_none_requires_secure() {
        let mut settings = configured();
        settings.cookies.same_site = "none".to_string();
        settings.cookies.secure = false;
        assert!(settings.validate().is_err());

        settings.cookies.secure = true;
        assert!(settings.validate().is_ok());

        settings.cookies.same_site = "sometimes".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cookie_options_follow_settings() {
        let mut settings = configured();
        settings.session.cookie_name = "sid".to_string();
        settings.session.cookie_max_age_seconds = 60;
        settings.cookies.secure = false;
        settings.cookies.same_site = "strict".to_string();

        let options = settings.cookie_options().unwrap();
        assert_eq!(options.name, "sid");
        assert_eq!(options.max_age, Duration::seconds(60));
        assert!(!options.secure);
        assert_eq!(options.same_site, SameSite::Strict);
        assert!(options.http_only);
        assert_eq!(options.path, "/");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[application]\nport = 8000\n\n[oauth]\nconsumer_key = \"k\"\nconsumer_secret = \"s\""
        )
        .unwrap();

        let settings = BridgeSettings::load_from_path(file.path()).unwrap();
        assert_eq!(settings.application.port, 8000);
        assert_eq!(settings.application.spa_origin, "http://localhost:4200");
        assert_eq!(settings.oauth.consumer_key, "k");
        assert_eq!(settings.session.cookie_name, "clientMap");
    }

    #[test]
    fn test_unreadable_file_is_configuration_error() {
        let result = BridgeSettings::load_from_path(Path::new("/nonexistent/Settings.toml"));
        assert!(matches!(result, Err(BridgeError::Configuration(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clean_env_vars();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[oauth]\nconsumer_key = \"file-key\"\nconsumer_secret = \"file-secret\"\n\n[api]\ntimeout_seconds = 5"
        )
        .unwrap();

        std::env::set_var(CONFIG_PATH_ENV, file.path());
        std::env::set_var("OAUTH_CONSUMER_KEY", "env-key");
        std::env::set_var("PORT", "7000");
        std::env::set_var("API_TIMEOUT_SECONDS", "not-a-number");
        std::env::set_var("COOKIE_SECURE", "false");

        let settings = BridgeSettings::load().unwrap();
        assert_eq!(settings.oauth.consumer_key, "env-key");
        assert_eq!(settings.oauth.consumer_secret, "file-secret");
        assert_eq!(settings.application.port, 7000);
        assert_eq!(settings.api.timeout_seconds, 5);
        assert!(!settings.cookies.secure);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings::default();
        std::env::set_var("SESSION_COOKIE_MAX_AGE_SECONDS", "900");
        BridgeSettings::apply_session_env_overrides(&mut session_settings);
        assert_eq!(session_settings.cookie_max_age_seconds, 900);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_missing_config_path_is_fatal() {
        clean_env_vars();
        std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/splitgate.toml");

        assert!(BridgeSettings::load().is_err());

        clean_env_vars();
    }
}

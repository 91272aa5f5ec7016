use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

/// Default name of the session cookie
pub const COOKIE_NAME: &str = "clientMap";

/// Attributes shared by every session cookie the bridge issues
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: COOKIE_NAME.to_string(),
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Duration::seconds(300),
        }
    }
}

/// Builds the session cookie and its removal counterpart from one set of options
#[derive(Debug, Clone)]
pub struct CookieFactory {
    options: CookieOptions,
}

impl CookieFactory {
    #[must_use]
    pub const fn new(options: CookieOptions) -> Self {
        Self { options }
    }

    /// Name of the session cookie
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.options.name
    }

    /// Session cookie carrying an encoded value
    #[must_use]
    pub fn create_session_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build(self.options.name.clone(), value)
            .http_only(self.options.http_only)
            .secure(self.options.secure)
            .same_site(self.options.same_site)
            .path(self.options.path.clone())
            .max_age(self.options.max_age)
            .finish()
    }

    /// Immediately-expiring cookie with the same name and path
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.options.name.clone(), "")
            .http_only(self.options.http_only)
            .secure(self.options.secure)
            .same_site(self.options.same_site)
            .path(self.options.path.clone())
            .max_age(Duration::seconds(-1))
            .finish()
    }

    /// Raw value of the session cookie on `req`, if present
    #[must_use]
    pub fn extract_value(&self, req: &HttpRequest) -> Option<String> {
        req.cookie(&self.options.name)
            .map(|cookie| cookie.value().to_string())
    }
}

/// Parse a `SameSite` attribute from configuration, case-insensitively
#[must_use]
pub fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_session_cookie_attributes() {
        let factory = CookieFactory::new(CookieOptions::default());
        let cookie = factory.create_session_cookie("value".to_string());

        assert_eq!(cookie.name(), "clientMap");
        assert_eq!(cookie.value(), "value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(300)));
    }

    #[test]
    fn test_expired_cookie_matches_name_and_path() {
        let factory = CookieFactory::new(CookieOptions {
            name: "custom".to_string(),
            secure: false,
            ..CookieOptions::default()
        });
        let cookie = factory.create_expired_cookie();

        assert_eq!(cookie.name(), "custom");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(false));
        assert!(cookie.max_age().unwrap().whole_seconds() < 0);
    }

    #[test]
    fn test_extract_value() {
        let factory = CookieFactory::new(CookieOptions::default());
        let req = TestRequest::default()
            .cookie(Cookie::new("clientMap", "abc"))
            .to_http_request();
        let other = TestRequest::default()
            .cookie(Cookie::new("other", "abc"))
            .to_http_request();

        assert_eq!(factory.extract_value(&req).as_deref(), Some("abc"));
        assert!(factory.extract_value(&other).is_none());
    }

    #[test]
    fn test_parse_same_site() {
        assert_eq!(parse_same_site("Strict"), Some(SameSite::Strict));
        assert_eq!(parse_same_site("lax"), Some(SameSite::Lax));
        assert_eq!(parse_same_site("NONE"), Some(SameSite::None));
        assert_eq!(parse_same_site("sometimes"), None);
    }
}

use axum::http::{header, HeaderMap};
use marquee_config::Config;

/// Attributes of the admin session cookie
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.auth.cookie_name.clone(),
            max_age_secs: config.auth.session_ttl_secs,
            secure: config.server.secure_cookies,
        }
    }

    fn build(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value carrying a fresh session token
    pub fn session(&self, token: &str) -> String {
        self.build(token, self.max_age_secs)
    }

    /// `Set-Cookie` value that makes the browser drop the session
    pub fn cleared(&self) -> String {
        self.build("", 0)
    }

    /// The session token from the request's `Cookie` headers, if any
    pub fn read<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn settings(secure: bool) -> CookieSettings {
        CookieSettings {
            name: "admin-session".to_string(),
            max_age_secs: 1800,
            secure,
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = settings(true).session("a@b.com.abc");
        assert_eq!(
            cookie,
            "admin-session=a@b.com.abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=1800; Secure"
        );
        assert!(!settings(false).session("t").contains("Secure"));
        assert!(settings(false).cleared().contains("Max-Age=0"));
    }

    #[test]
    fn test_read_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; admin-session=a@b.com.sig; other=1"),
        );
        assert_eq!(settings(true).read(&headers), Some("a@b.com.sig"));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("admin-session="));
        assert_eq!(settings(true).read(&empty), None);
        assert_eq!(settings(true).read(&HeaderMap::new()), None);
    }
}

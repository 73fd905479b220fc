use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

pub const SESSION_COOKIE: &str = "jwt";

pub fn session_cookie(token: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build()
}

/// Empty session cookie that has already expired; browsers drop it.
pub fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// Token from the session cookie. An empty value counts as absent.
pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_security_flags() {
        let rendered = session_cookie("abc".into(), Duration::days(30), true).to_string();
        assert!(rendered.starts_with("jwt=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Max-Age=2592000"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn insecure_cookie_omits_secure_flag() {
        let rendered = session_cookie("abc".into(), Duration::days(1), false).to_string();
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn cleared_cookie_is_empty_and_expired() {
        let cookie = cleared_session_cookie();
        assert_eq!(cookie.value(), "");
        assert!(cookie.http_only().unwrap_or(false));
        let rendered = cookie.to_string();
        assert!(rendered.contains("1970"));
    }

    #[test]
    fn empty_cookie_value_is_no_token() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, ""));
        assert_eq!(session_token(&jar), None);

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "tok"));
        assert_eq!(session_token(&jar).as_deref(), Some("tok"));
    }
}

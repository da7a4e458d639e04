use axum::http::{header, HeaderMap};
use chrono::Duration;

pub const SESSION_COOKIE: &str = "anticafe_session";

/// Session token from the session cookie or an `Authorization: Bearer` header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string());

    from_cookie
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
        })
        .filter(|token| !token.is_empty())
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; anticafe_session=abc-123; lang=ru"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok-9"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok-9"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());
        headers.insert(header::COOKIE, HeaderValue::from_static("anticafe_session="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn test_cookie_strings() {
        let cookie = session_cookie("abc", Duration::hours(1));
        assert!(cookie.starts_with("anticafe_session=abc;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}

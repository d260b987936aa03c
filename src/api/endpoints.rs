//! Backend endpoint paths
//!
//! Shared by the native client and the browser client so both address the
//! same routes. Path segments are percent-encoded.

/// Default REST base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default chat WebSocket URL
pub const DEFAULT_WS_URL: &str = "ws://localhost:9090/chat/chat";

pub fn cities() -> String {
    "/api/cities".to_string()
}

pub fn city(slug: &str) -> String {
    format!("/api/cities/{}", urlencoding::encode(slug))
}

pub fn city_ratings(city_id: &str) -> String {
    format!("/api/cities/{}/ratings", urlencoding::encode(city_id))
}

pub fn incidents() -> String {
    "/api/incidents".to_string()
}

pub fn user(user_id: &str) -> String {
    format!("/api/users/{}", urlencoding::encode(user_id))
}

pub fn chat_history(city_id: &str) -> String {
    format!("/api/chat/history/city/{}", urlencoding::encode(city_id))
}

/// Join a base URL and a path
pub fn url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(city("nuwara eliya"), "/api/cities/nuwara%20eliya");
        assert_eq!(city_ratings("12"), "/api/cities/12/ratings");
        assert_eq!(chat_history("12"), "/api/chat/history/city/12");
        assert_eq!(user("a/b"), "/api/users/a%2Fb");
    }

    #[test]
    fn test_url_join() {
        assert_eq!(
            url("http://localhost:8080/", &cities()),
            "http://localhost:8080/api/cities"
        );
        assert_eq!(url(DEFAULT_API_URL, &incidents()), "http://localhost:8080/api/incidents");
    }
}

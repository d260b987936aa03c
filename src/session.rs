//! Session and Identity
//!
//! The auth provider is external: it hands the client an opaque bearer token
//! and a few profile claims. This module only reads them. A missing token
//! means "operate as an anonymous guest", never an error.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Identity used when no session is available
pub const GUEST_ID: &str = "guest-user";

/// Display name used when no session is available
pub const GUEST_NAME: &str = "Guest";

/// Who is speaking in a chat room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
}

impl ChatUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The stable guest identity
    pub fn guest() -> Self {
        Self::new(GUEST_ID, GUEST_NAME)
    }
}

impl Default for ChatUser {
    fn default() -> Self {
        Self::guest()
    }
}

/// Profile claims supplied by the auth provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
}

/// Current user session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    access_token: Option<String>,
    user: SessionUser,
    guest: ChatUser,
}

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
}

impl Session {
    /// Session without credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session from a bearer token and profile claims
    pub fn new(access_token: Option<String>, user: SessionUser) -> Self {
        Self {
            access_token: access_token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            user,
            guest: ChatUser::guest(),
        }
    }

    /// Replace the guest identity used when the session has no user
    pub fn with_guest(mut self, guest: ChatUser) -> Self {
        self.guest = guest;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Value for the `Authorization` header, if any
    pub fn authorization_header(&self) -> Option<String> {
        self.access_token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// The `sub` claim of the bearer token, falling back to the profile id
    pub fn subject(&self) -> Option<String> {
        self.access_token
            .as_deref()
            .and_then(token_subject)
            .or_else(|| non_blank(self.user.id.as_deref()))
    }

    /// Backend user id for ratings, incidents and profile calls
    pub fn user_id(&self) -> String {
        self.subject().unwrap_or_else(|| self.guest.id.clone())
    }

    /// Human readable name: given + family, either alone, email, then guest
    pub fn display_name(&self) -> String {
        let given = non_blank(self.user.given_name.as_deref());
        let family = non_blank(self.user.family_name.as_deref());

        match (given, family) {
            (Some(g), Some(f)) => format!("{} {}", g, f),
            (Some(g), None) => g,
            (None, Some(f)) => f,
            (None, None) => non_blank(self.user.email.as_deref())
                .unwrap_or_else(|| self.guest.name.clone()),
        }
    }

    /// Identity announced in chat rooms
    ///
    /// Chat keys authors by email so the same person is recognised across
    /// devices; without one the stable guest id keeps `is_own` deterministic.
    pub fn chat_user(&self) -> ChatUser {
        let id = non_blank(self.user.email.as_deref())
            .or_else(|| self.subject())
            .unwrap_or_else(|| self.guest.id.clone());
        ChatUser::new(id, self.display_name())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extract the `sub` claim from a JWT without verifying it
///
/// Verification is the backend's job; the client only needs the id to build
/// request paths.
pub fn token_subject(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Bearer token payload is not base64url");
            return None;
        }
    };

    match serde_json::from_slice::<Claims>(&bytes) {
        Ok(claims) => claims.sub.filter(|s| !s.is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "Bearer token payload is not JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn test_anonymous_session_is_guest() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert_eq!(session.authorization_header(), None);
        assert_eq!(session.user_id(), GUEST_ID);
        assert_eq!(session.chat_user(), ChatUser::guest());
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        let session = Session::new(Some("   ".to_string()), SessionUser::default());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_subject_from_token() {
        let token = token_with(r#"{"sub":"3f0c31a8","name":"x"}"#);
        let session = Session::new(Some(token.clone()), SessionUser::default());

        assert_eq!(session.subject().as_deref(), Some("3f0c31a8"));
        assert_eq!(session.user_id(), "3f0c31a8");
        assert_eq!(
            session.authorization_header(),
            Some(format!("Bearer {}", token))
        );
    }

    #[test]
    fn test_garbage_token_falls_back_to_profile_id() {
        let user = SessionUser {
            id: Some("u-1".to_string()),
            ..Default::default()
        };
        let session = Session::new(Some("not-a-jwt".to_string()), user);
        assert_eq!(session.user_id(), "u-1");
    }

    #[test]
    fn test_display_name_precedence() {
        let mut user = SessionUser {
            given_name: Some(" Nimal ".to_string()),
            family_name: Some("Perera".to_string()),
            email: Some("nimal@example.com".to_string()),
            id: None,
        };
        let session = Session::new(None, user.clone());
        assert_eq!(session.display_name(), "Nimal Perera");

        user.family_name = None;
        assert_eq!(Session::new(None, user.clone()).display_name(), "Nimal");

        user.given_name = None;
        assert_eq!(
            Session::new(None, user.clone()).display_name(),
            "nimal@example.com"
        );

        user.email = None;
        assert_eq!(Session::new(None, user).display_name(), GUEST_NAME);
    }

    #[test]
    fn test_chat_user_prefers_email() {
        let user = SessionUser {
            email: Some("ayesha@example.com".to_string()),
            given_name: Some("Ayesha".to_string()),
            ..Default::default()
        };
        let session = Session::new(Some(token_with(r#"{"sub":"abc"}"#)), user);
        assert_eq!(
            session.chat_user(),
            ChatUser::new("ayesha@example.com", "Ayesha")
        );
    }

    #[test]
    fn test_custom_guest_identity() {
        let session = Session::anonymous().with_guest(ChatUser::new("guest-42", "Guest"));
        assert_eq!(session.chat_user().id, "guest-42");
        assert_eq!(session.user_id(), "guest-42");
    }
}

//! Global Application State
//!
//! Reactive state shared by every page: the session and toast messages.
//! Everything page-specific (listings, drafts, chat) lives in the page that
//! owns it and is discarded on unmount.

use leptos::*;
use wayfarer::session::{Session, SessionUser};

const TOKEN_KEY: &str = "wayfarer_access_token";
const USER_KEY: &str = "wayfarer_user";

/// Global application state provided to all components
#[derive(Clone, Copy)]
pub struct GlobalState {
    /// Current session; anonymous when no credential is stored
    pub session: RwSignal<Session>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        session: create_rw_signal(load_session()),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state);
}

pub fn use_global_state() -> GlobalState {
    use_context::<GlobalState>().expect("GlobalState not found")
}

impl GlobalState {
    /// Store a credential issued by the auth provider
    pub fn sign_in(&self, token: &str, user: SessionUser) {
        let session = Session::new(Some(token.to_string()), user.clone());
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(TOKEN_KEY, token.trim());
            if let Ok(json) = serde_json::to_string(&user) {
                let _ = storage.set_item(USER_KEY, &json);
            }
        }
        self.session.set(session);
    }

    pub fn sign_out(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(TOKEN_KEY);
            let _ = storage.remove_item(USER_KEY);
        }
        self.session.set(Session::anonymous());
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

fn load_session() -> Session {
    let Some(storage) = local_storage() else {
        return Session::anonymous();
    };
    session_from_stored(
        storage.get_item(TOKEN_KEY).ok().flatten(),
        storage.get_item(USER_KEY).ok().flatten(),
    )
}

/// Rebuild the session from stored values; unreadable claims are dropped
fn session_from_stored(token: Option<String>, user_json: Option<String>) -> Session {
    let user = user_json
        .and_then(|json| match serde_json::from_str::<SessionUser>(&json) {
            Ok(user) => Some(user),
            Err(e) => {
                web_sys::console::warn_1(&format!("Ignoring stored profile claims: {}", e).into());
                None
            }
        })
        .unwrap_or_default();
    Session::new(token, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_stored_is_anonymous() {
        let session = session_from_stored(None, None);
        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), "guest-user");
    }

    #[test]
    fn test_stored_claims() {
        let session = session_from_stored(
            Some("tok".to_string()),
            Some(r#"{"email":"ama@example.com","given_name":"Ama"}"#.to_string()),
        );
        assert!(session.is_authenticated());
        assert_eq!(session.display_name(), "Ama");
        assert_eq!(session.chat_user().id, "ama@example.com");
    }
}

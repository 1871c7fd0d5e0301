//! Identity session contract.
//!
//! Authentication itself is delegated wholesale to an external identity
//! provider. The core consumes only a stable user identifier, a display
//! name, and the signed-in/signed-out lifecycle: entries are loaded on
//! login and cleared on logout. [`SessionHandle`] broadcasts those
//! transitions over a watch channel so the sync layer and the journal can
//! key off the same signal.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The active user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    /// Stable identifier; also the persistence key namespace.
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Broadcasts session transitions to every interested component.
///
/// `None` means signed out. Subscribers see the current state immediately
/// and every transition afterwards.
#[derive(Debug)]
pub struct SessionHandle {
    tx: watch::Sender<Option<UserSession>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, user: UserSession) {
        tracing::info!(uid = %user.uid, "session signed in");
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        tracing::info!("session signed out");
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<UserSession> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserSession>> {
        self.tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an identity-provider failure code to a user-readable message.
///
/// Known codes get specific guidance; unknown codes pass through labeled
/// rather than being swallowed. The optional `auth/` prefix some providers
/// attach is accepted either way.
pub fn auth_failure_message(code: &str) -> String {
    let code = code.strip_prefix("auth/").unwrap_or(code);
    match code {
        "email-already-in-use" => {
            "This email is already registered. Please sign in instead.".to_string()
        }
        "invalid-email" => "Invalid email address.".to_string(),
        "operation-not-allowed" => {
            "Email/password accounts are not enabled. Please contact support.".to_string()
        }
        "weak-password" => "Password should be at least 6 characters.".to_string(),
        "user-disabled" => "This account has been disabled.".to_string(),
        "user-not-found" => "No account found with this email.".to_string(),
        "wrong-password" => "Incorrect password.".to_string(),
        "invalid-credential" => "Invalid email or password.".to_string(),
        "too-many-requests" => "Too many failed attempts. Please try again later.".to_string(),
        other => format!("Authentication error: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str) -> UserSession {
        UserSession {
            uid: uid.to_string(),
            email: format!("{uid}@example.com"),
            display_name: Some(uid.to_string()),
        }
    }

    #[tokio::test]
    async fn subscribers_observe_login_and_logout() {
        let handle = SessionHandle::new();
        let mut rx = handle.subscribe();
        assert!(rx.borrow().is_none());

        handle.sign_in(user("alice"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().uid, "alice");

        handle.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[test]
    fn current_reflects_the_latest_transition() {
        let handle = SessionHandle::new();
        assert!(handle.current().is_none());
        handle.sign_in(user("bob"));
        assert_eq!(handle.current().unwrap().uid, "bob");
    }

    #[test]
    fn known_failure_codes_get_specific_messages() {
        assert_eq!(
            auth_failure_message("auth/wrong-password"),
            "Incorrect password."
        );
        assert_eq!(
            auth_failure_message("weak-password"),
            "Password should be at least 6 characters."
        );
    }

    #[test]
    fn unknown_failure_codes_pass_through_labeled() {
        assert_eq!(
            auth_failure_message("auth/quantum-flux"),
            "Authentication error: quantum-flux"
        );
    }
}

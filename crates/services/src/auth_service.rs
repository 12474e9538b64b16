use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quiz_core::model::Username;
use tracing::info;
use uuid::Uuid;

use crate::error::AuthError;

/// Logged-in player and the token issued for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub username: Username,
    pub token: String,
}

/// Username-only login that hands out opaque tokens.
///
/// Tokens live in memory for the lifetime of the service.
#[derive(Clone, Default)]
pub struct AuthService {
    tokens: Arc<Mutex<HashMap<String, Username>>>,
}

impl AuthService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log in with a username and issue a fresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingUsername` for blank names and
    /// `AuthError::TokenStore` if the token table is unusable.
    pub fn login(&self, username: &str) -> Result<UserSession, AuthError> {
        let username = Username::new(username).map_err(|_| AuthError::MissingUsername)?;
        let token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .map_err(|_| AuthError::TokenStore)?
            .insert(token.clone(), username.clone());
        info!(user = %username, "logged in");
        Ok(UserSession { username, token })
    }

    /// Resolve a previously issued token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownToken` if the token was never issued or was revoked.
    pub fn authenticate(&self, token: &str) -> Result<UserSession, AuthError> {
        let guard = self.tokens.lock().map_err(|_| AuthError::UnknownToken)?;
        guard
            .get(token)
            .map(|username| UserSession {
                username: username.clone(),
                token: token.to_string(),
            })
            .ok_or(AuthError::UnknownToken)
    }

    /// Revoke a token. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        if let Ok(mut guard) = self.tokens.lock() {
            guard.remove(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_issues_a_resolvable_token() {
        let auth = AuthService::new();
        let session = auth.login("  ada ").unwrap();
        assert_eq!(session.username.as_str(), "ada");

        let resolved = auth.authenticate(&session.token).unwrap();
        assert_eq!(resolved, session);
    }

    #[test]
    fn blank_username_is_rejected() {
        let auth = AuthService::new();
        assert_eq!(auth.login("   ").unwrap_err(), AuthError::MissingUsername);
    }

    #[test]
    fn logout_revokes_the_token() {
        let auth = AuthService::new();
        let session = auth.login("bob").unwrap();
        auth.logout(&session.token);
        assert_eq!(
            auth.authenticate(&session.token).unwrap_err(),
            AuthError::UnknownToken
        );
    }

    #[test]
    fn login_fails_when_token_table_is_poisoned() {
        let auth = AuthService::new();
        let tokens = Arc::clone(&auth.tokens);
        let _ = std::thread::spawn(move || {
            let _guard = tokens.lock().unwrap();
            panic!("holder crashed");
        })
        .join();

        assert_eq!(auth.login("ada").unwrap_err(), AuthError::TokenStore);
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let auth = AuthService::new();
        let a = auth.login("ada").unwrap();
        let b = auth.login("ada").unwrap();
        assert_ne!(a.token, b.token);
    }
}

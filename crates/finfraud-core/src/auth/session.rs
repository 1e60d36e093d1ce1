//! In-memory session state and its transitions.
//!
//! A session is either `Anonymous` (no credential, no user) or
//! `Authenticated` (credential stored and user known). The only other shape,
//! credential stored but no user yet, exists between startup and the end of
//! the startup refresh.
//!
//! Transitions:
//! - `login` / `signup` with a token: Anonymous -> Authenticated
//! - `logout`: any -> Anonymous
//! - `refresh_user` failure: Authenticated -> Anonymous
//!
//! A failed login or signup leaves the session exactly as it was.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{SignupResponse, User};

use super::store::{SharedTokenStore, StoreError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to persist credential: {0}")]
    Store(#[from] StoreError),
}

/// Snapshot of the credential/user pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub credential: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        match self.user {
            Some(ref user) => SessionState::Authenticated(user.clone()),
            None => SessionState::Anonymous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(User),
}

/// Result of a signup. `response` is what the server sent, untouched.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub session: Session,
    pub response: SignupResponse,
}

impl SignupOutcome {
    /// Whether the signup also signed the user in
    pub fn authenticated(&self) -> bool {
        self.response.token().is_some() && self.response.user_id.is_some()
    }
}

/// Read-only view of the session consumed by the route gate and UI surfaces.
pub trait SessionView {
    fn current_user(&self) -> Option<&User>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

impl SessionView for Session {
    fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

/// Owns the session for one application lifetime.
///
/// Operations take `&mut self`; callers that share a store across tasks must
/// serialize access themselves.
pub struct SessionStore {
    api: ApiClient,
    user: Option<User>,
}

impl SessionStore {
    /// A store with no user, whatever the token store holds. No network call.
    pub fn new(api: ApiClient) -> Self {
        Self { api, user: None }
    }

    /// Start a session for a fresh process.
    ///
    /// If a credential survived from an earlier run it is revalidated with
    /// exactly one `refresh_user`; otherwise the session starts anonymous
    /// without touching the network.
    pub async fn restore(api: ApiClient) -> Self {
        let mut store = Self::new(api);
        if store.credential().is_some() {
            debug!("Stored credential found, revalidating");
            store.refresh_user().await;
        } else {
            debug!("No stored credential, starting anonymous");
        }
        store
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn token_store(&self) -> &SharedTokenStore {
        self.api.store()
    }

    /// The credential currently in the durable store
    pub fn credential(&self) -> Option<String> {
        match self.token_store().load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn session(&self) -> Session {
        Session {
            credential: self.credential(),
            user: self.user.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        match self.user {
            Some(ref user) => SessionState::Authenticated(user.clone()),
            None => SessionState::Anonymous,
        }
    }

    /// Persist a freshly issued credential and adopt the user.
    ///
    /// The user is only set once the credential is safely stored, so a store
    /// failure leaves the session untouched.
    fn establish(&mut self, token: &str, user: User) -> Result<(), SessionError> {
        self.token_store().save(token)?;
        info!(user_id = user.id, "Session established");
        self.user = Some(user);
        Ok(())
    }

    /// Sign in with email and password.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, SessionError> {
        let resp = match self.api.login(email, password).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        if resp.access_token.is_empty() {
            warn!("Login response carried an empty token");
            return Err(ApiError::InvalidResponse("Login returned an empty access token".to_string()).into());
        }

        self.establish(
            &resp.access_token,
            User {
                id: resp.user_id,
                email: Some(email.to_string()),
            },
        )?;
        Ok(self.session())
    }

    /// Register a new account.
    ///
    /// If the server issues a token the user is signed in as with `login`.
    /// Otherwise the session is left as it was and the caller has to sign in
    /// separately.
    pub async fn signup(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<SignupOutcome, SessionError> {
        let response = match self.api.signup(name, email, password).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Signup failed");
                return Err(e.into());
            }
        };

        match (response.token(), response.user_id) {
            (Some(token), Some(user_id)) => {
                let token = token.to_string();
                self.establish(
                    &token,
                    User {
                        id: user_id,
                        email: Some(email.to_string()),
                    },
                )?;
            }
            (Some(_), None) => {
                warn!("Signup issued a token without a user id, not signing in");
                debug!(extra = ?response.extra, "Signup response without user id");
            }
            (None, _) => {
                info!("Signup succeeded without a token, sign-in required");
            }
        }

        Ok(SignupOutcome {
            session: self.session(),
            response,
        })
    }

    /// Drop the credential and forget the user. Never fails, never touches
    /// the network, safe to repeat.
    pub fn logout(&mut self) {
        if let Err(e) = self.token_store().clear() {
            warn!(error = %e, "Failed to remove stored credential");
        }
        if self.user.take().is_some() {
            info!("Logged out");
        }
    }

    /// Re-read the user behind the stored credential.
    ///
    /// Any failure (no credential, transport error, non-2xx, unexpected body)
    /// means the credential can no longer be trusted, so the session is
    /// logged out. Nothing is reported to the caller.
    pub async fn refresh_user(&mut self) {
        if self.credential().is_none() {
            debug!("No credential to refresh");
            self.logout();
            return;
        }

        match self.api.me().await {
            Ok(me) => {
                debug!(user_id = me.id, "User refreshed");
                self.user = Some(me.into());
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh user, dropping session");
                self.logout();
            }
        }
    }
}

impl SessionView for SessionStore {
    fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockito::{Matcher, Server};
    use serde_json::json;

    use super::*;
    use crate::auth::{MemoryTokenStore, TokenStore};

    fn session_store(url: String, store: Arc<MemoryTokenStore>) -> SessionStore {
        SessionStore::new(ApiClient::new(url, store).unwrap())
    }

    #[tokio::test]
    async fn test_login_success_scenario() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::Json(json!({"email": "a@x.com", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"access_token":"t1","user_id":7}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        let session = store.login("a@x.com", "pw").await.unwrap();

        let expected_user = User {
            id: 7,
            email: Some("a@x.com".to_string()),
        };
        assert_eq!(session.credential.as_deref(), Some("t1"));
        assert_eq!(session.user.as_ref(), Some(&expected_user));
        assert_eq!(store.state(), SessionState::Authenticated(expected_user));
        assert_eq!(tokens.load().unwrap().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_anonymous() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(r#"{"detail":"Invalid credentials"}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        let err = store.login("a@x.com", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(store.session(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_session() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::PartialJson(json!({"password": "pw"})))
            .with_status(200)
            .with_body(r#"{"access_token":"t1","user_id":7}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/auth/login")
            .match_body(Matcher::PartialJson(json!({"password": "bad"})))
            .with_status(401)
            .with_body(r#"{"detail":"Invalid credentials"}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());
        store.login("a@x.com", "pw").await.unwrap();
        let before = store.session();

        assert!(store.login("b@x.com", "bad").await.is_err());

        assert_eq!(store.session(), before);
        assert_eq!(tokens.load().unwrap().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"user_id":7}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        let err = store.login("a@x.com", "pw").await.unwrap_err();

        assert!(matches!(err, SessionError::Api(ApiError::InvalidResponse(_))));
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_rejects_empty_token() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_body(r#"{"access_token":"","user_id":7}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        assert!(store.login("a@x.com", "pw").await.is_err());
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_without_token_stays_anonymous() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/signup")
            .match_body(Matcher::Json(
                json!({"name": "Bob", "email": "b@x.com", "password": "pw"}),
            ))
            .with_status(200)
            .with_body(r#"{"user_id":9}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        let outcome = store.signup("Bob", "b@x.com", "pw").await.unwrap();

        assert!(!outcome.authenticated());
        assert_eq!(outcome.response.user_id, Some(9));
        assert_eq!(outcome.session, Session::default());
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_with_token_authenticates() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/signup")
            .with_status(200)
            .with_body(r#"{"access_token":"s1","user_id":9,"token_type":"bearer"}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        let outcome = store.signup("Bob", "b@x.com", "pw").await.unwrap();

        assert!(outcome.authenticated());
        assert_eq!(
            store.user(),
            Some(&User {
                id: 9,
                email: Some("b@x.com".to_string())
            })
        );
        assert_eq!(tokens.load().unwrap().as_deref(), Some("s1"));
        // Unknown fields survive in the raw response
        assert!(outcome.response.extra.contains_key("token_type"));
    }

    #[tokio::test]
    async fn test_signup_token_without_user_id_stays_anonymous() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/signup")
            .with_status(200)
            .with_body(r#"{"access_token":"s1","name":"Bob"}"#)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        let mut store = session_store(server.url(), tokens.clone());

        let outcome = store.signup("Bob", "b@x.com", "pw").await.unwrap();

        assert!(!outcome.authenticated());
        assert_eq!(outcome.response.token(), Some("s1"));
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_error_surfaces_detail() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/signup")
            .with_status(400)
            .with_body(r#"{"detail":"Email already registered"}"#)
            .create_async()
            .await;

        let mut store = session_store(server.url(), Arc::new(MemoryTokenStore::new()));

        let err = store.signup("Bob", "b@x.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let tokens = Arc::new(MemoryTokenStore::with_token("t1"));
        let mut store = session_store("http://127.0.0.1:1".to_string(), tokens.clone());
        store.user = Some(User { id: 7, email: None });

        store.logout();
        assert_eq!(store.session(), Session::default());

        store.logout();
        assert_eq!(store.session(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_stale_credential_logs_out() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .with_body(r#"{"detail":"Invalid authentication token"}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
        let store = SessionStore::restore(ApiClient::new(server.url(), tokens.clone()).unwrap()).await;

        m.assert_async().await;
        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_undecodable_body_logs_out() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/auth/me")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::with_token("t1"));
        let mut store = session_store(server.url(), tokens.clone());
        store.user = Some(User { id: 7, email: None });

        store.refresh_user().await;

        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_network_failure_logs_out() {
        let tokens = Arc::new(MemoryTokenStore::with_token("t1"));
        let store =
            SessionStore::restore(ApiClient::new("http://127.0.0.1:1", tokens.clone()).unwrap()).await;

        assert_eq!(store.state(), SessionState::Anonymous);
        assert_eq!(tokens.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_valid_credential() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer good")
            .with_status(200)
            .with_body(r#"{"id":7,"email":"a@x.com","name":"A"}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = Arc::new(MemoryTokenStore::with_token("good"));
        let store = SessionStore::restore(ApiClient::new(server.url(), tokens.clone()).unwrap()).await;

        assert_eq!(
            store.state(),
            SessionState::Authenticated(User {
                id: 7,
                email: Some("a@x.com".to_string())
            })
        );
        assert_eq!(store.credential().as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_restore_without_credential_skips_network() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .expect(0)
            .create_async()
            .await;

        let store = SessionStore::restore(
            ApiClient::new(server.url(), Arc::new(MemoryTokenStore::new())).unwrap(),
        )
        .await;

        m.assert_async().await;
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_refresh_without_credential_clears_user() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .expect(0)
            .create_async()
            .await;

        let mut store = session_store(server.url(), Arc::new(MemoryTokenStore::new()));
        store.user = Some(User { id: 1, email: None });

        store.refresh_user().await;

        m.assert_async().await;
        assert_eq!(store.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_session_view_on_snapshot() {
        let session = Session {
            credential: Some("t".to_string()),
            user: Some(User { id: 1, email: None }),
        };
        assert!(session.is_authenticated());
        assert!(!Session::default().is_authenticated());
        assert_eq!(Session::default().state(), SessionState::Anonymous);
    }
}

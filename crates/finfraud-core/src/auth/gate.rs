//! Route gate for protected views.
//!
//! The decision is recomputed from the session on every call and never
//! cached, so a logout or a failed revalidation shows up on the next render.

use crate::models::User;

use super::session::SessionView;

/// Views the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Public entry view
    Home,
    /// Protected view, requires a signed-in user
    Dashboard,
}

impl Route {
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision<'a> {
    /// Render the protected view for this user
    Render(&'a User),
    /// Send the visitor elsewhere
    Redirect(Route),
}

/// Decide whether the protected view may render.
pub fn guard<S: SessionView + ?Sized>(session: &S) -> GateDecision<'_> {
    match session.current_user() {
        Some(user) => GateDecision::Render(user),
        None => GateDecision::Redirect(Route::Home),
    }
}

/// The route actually shown when `requested` is asked for.
pub fn resolve<S: SessionView + ?Sized>(requested: Route, session: &S) -> Route {
    if !requested.is_protected() {
        return requested;
    }
    match guard(session) {
        GateDecision::Render(_) => requested,
        GateDecision::Redirect(to) => to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stand-in session so the gate can be exercised without a backend
    struct FakeSession(Option<User>);

    impl SessionView for FakeSession {
        fn current_user(&self) -> Option<&User> {
            self.0.as_ref()
        }
    }

    fn user() -> User {
        User {
            id: 7,
            email: Some("a@x.com".to_string()),
        }
    }

    #[test]
    fn test_guard_renders_for_user() {
        let session = FakeSession(Some(user()));
        assert_eq!(guard(&session), GateDecision::Render(&user()));
    }

    #[test]
    fn test_guard_redirects_anonymous() {
        let session = FakeSession(None);
        assert_eq!(guard(&session), GateDecision::Redirect(Route::Home));
    }

    #[test]
    fn test_guard_follows_session_changes() {
        let mut session = FakeSession(Some(user()));
        assert!(matches!(guard(&session), GateDecision::Render(_)));

        // Logging out takes effect on the very next evaluation
        session.0 = None;
        assert_eq!(guard(&session), GateDecision::Redirect(Route::Home));
    }

    #[test]
    fn test_resolve() {
        let anonymous = FakeSession(None);
        let signed_in = FakeSession(Some(user()));

        assert_eq!(resolve(Route::Home, &anonymous), Route::Home);
        assert_eq!(resolve(Route::Dashboard, &anonymous), Route::Home);
        assert_eq!(resolve(Route::Home, &signed_in), Route::Home);
        assert_eq!(resolve(Route::Dashboard, &signed_in), Route::Dashboard);
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Dashboard.path(), "/dashboard");
        assert!(!Route::Home.is_protected());
    }
}

//! Route protection decisions.
//!
//! [`RouteGuard::decide`] is pure: it sees a path and whether the caller has a
//! session, nothing else. The web middleware resolves the session and turns
//! the decision into a response.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(String),
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    /// Paths under this prefix belong to the sign-in flow and always pass.
    pub auth_prefix: String,
    /// Paths under this prefix require a session.
    pub protected_prefix: String,
    /// Unauthenticated landing page.
    pub landing_path: String,
    /// Where signed-in visitors of the landing page are sent.
    pub home_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            auth_prefix: "/auth/".to_string(),
            protected_prefix: "/dashboard".to_string(),
            landing_path: "/".to_string(),
            home_path: "/dashboard".to_string(),
        }
    }
}

impl RouteGuard {
    fn is_protected(&self, path: &str) -> bool {
        match path.strip_prefix(self.protected_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Whether the guard needs to look at `path` at all.
    pub fn matches(&self, path: &str) -> bool {
        path == self.landing_path || self.is_protected(path)
    }

    pub fn decide(&self, path: &str, has_session: bool) -> GuardDecision {
        if path.starts_with(self.auth_prefix.as_str()) {
            return GuardDecision::Pass;
        }
        if !has_session && self.is_protected(path) {
            return GuardDecision::Redirect(self.landing_path.clone());
        }
        if has_session && path == self.landing_path {
            return GuardDecision::Redirect(self.home_path.clone());
        }
        GuardDecision::Pass
    }

    /// Like [`decide`](Self::decide), but with the session check's own result.
    /// A failed check passes the request through.
    pub fn decide_checked<E: std::fmt::Display>(
        &self,
        path: &str,
        session_check: Result<bool, E>,
    ) -> GuardDecision {
        match session_check {
            Ok(has_session) => self.decide(path, has_session),
            Err(e) => {
                tracing::warn!("Session check failed for {}, letting it through: {}", path, e);
                GuardDecision::Pass
            }
        }
    }
}

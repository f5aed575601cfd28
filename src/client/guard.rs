//! Route guard for protected views

use std::collections::HashSet;

use super::session::{SessionState, LOGIN_PATH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Send the user to `to`, remembering the location they asked for.
    /// The original location is not resumed automatically after login.
    Redirect { to: String, from: String },
}

/// Admits every view for an authenticated session, and only the public views
/// for an anonymous one
#[derive(Debug, Clone)]
pub struct RouteGuard {
    public: HashSet<String>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new([LOGIN_PATH, "/register"])
    }
}

impl RouteGuard {
    pub fn new<I, S>(public: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            public: public.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_public(&self, location: &str) -> bool {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        self.public.contains(path)
    }

    pub fn check(&self, session: &SessionState, location: &str) -> GuardDecision {
        if session.is_authenticated() || self.is_public(location) {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect {
                to: LOGIN_PATH.to_string(),
                from: location.to_string(),
            }
        }
    }
}

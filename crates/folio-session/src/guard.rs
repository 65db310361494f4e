//! Navigation access policy.

use crate::routes::{NavigationTarget, RouteName};
use crate::session::SessionStore;
use crate::types::{AuthUser, ADMIN_ROLE};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a refused navigation should go instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Route {
        name: RouteName,
        query: BTreeMap<String, String>,
    },
    /// A raw path taken from a `redirect` query parameter.
    Path(String),
}

impl Redirect {
    pub fn route(name: RouteName) -> Self {
        Redirect::Route {
            name,
            query: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Redirect),
}

/// Decide whether `user` may enter `to`. Rules apply in order; the first
/// that matches wins.
///
/// 1. Auth-only routes send anonymous users to login, remembering where they
///    were going unless that was the root path.
/// 2. Admin-only routes send non-admins home.
/// 3. Guest-only routes send signed-in users to the `redirect` query target,
///    or home.
pub fn evaluate(to: &NavigationTarget, user: Option<&AuthUser>) -> GuardDecision {
    if to.meta.requires_auth && user.is_none() {
        let mut query = BTreeMap::new();
        if !to.full_path.is_empty() && to.full_path != "/" {
            query.insert("redirect".to_string(), to.full_path.clone());
        }
        return GuardDecision::Redirect(Redirect::Route {
            name: RouteName::Login,
            query,
        });
    }

    if to.meta.admin_only && user.map(|u| u.role.as_str()) != Some(ADMIN_ROLE) {
        return GuardDecision::Redirect(Redirect::route(RouteName::Home));
    }

    if to.meta.guest_only && user.is_some() {
        let destination = match to.query.single("redirect") {
            Some(path) => Redirect::Path(path.to_string()),
            None => Redirect::route(RouteName::Home),
        };
        return GuardDecision::Redirect(destination);
    }

    GuardDecision::Allow
}

/// Runs before every navigation.
pub struct AccessGuard {
    session: Arc<SessionStore>,
}

impl AccessGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// Restore the session if needed, then apply [`evaluate`].
    pub async fn before_each(&self, to: &NavigationTarget) -> GuardDecision {
        self.session.hydrate().await;
        let user = self.session.user();
        evaluate(to, user.as_ref())
    }
}

//! Route table and path resolution.
//!
//! Every navigation goes through [`Router::navigate`], which resolves the path
//! against the fixed table below and asks the [`AccessGuard`] whether it may
//! proceed.

use crate::guard::{AccessGuard, GuardDecision, Redirect};
use crate::session::SessionStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteName {
    Home,
    EbookDetail,
    Checkout,
    Reader,
    Library,
    Admin,
    AdminUpload,
    Login,
    Register,
}

impl RouteName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteName::Home => "home",
            RouteName::EbookDetail => "ebook-detail",
            RouteName::Checkout => "checkout",
            RouteName::Reader => "reader",
            RouteName::Library => "library",
            RouteName::Admin => "admin",
            RouteName::AdminUpload => "admin-upload",
            RouteName::Login => "login",
            RouteName::Register => "register",
        }
    }
}

impl std::fmt::Display for RouteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub admin_only: bool,
    pub guest_only: bool,
}

impl RouteMeta {
    const PUBLIC: RouteMeta = RouteMeta {
        requires_auth: false,
        admin_only: false,
        guest_only: false,
    };
    const AUTH: RouteMeta = RouteMeta {
        requires_auth: true,
        admin_only: false,
        guest_only: false,
    };
    const ADMIN: RouteMeta = RouteMeta {
        requires_auth: true,
        admin_only: true,
        guest_only: false,
    };
    const GUEST: RouteMeta = RouteMeta {
        requires_auth: false,
        admin_only: false,
        guest_only: true,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct RouteDef {
    pub name: RouteName,
    pub pattern: &'static str,
    pub meta: RouteMeta,
}

pub const ROUTES: [RouteDef; 9] = [
    RouteDef {
        name: RouteName::Home,
        pattern: "/",
        meta: RouteMeta::PUBLIC,
    },
    RouteDef {
        name: RouteName::EbookDetail,
        pattern: "/ebooks/:id",
        meta: RouteMeta::PUBLIC,
    },
    RouteDef {
        name: RouteName::Checkout,
        pattern: "/checkout/:id",
        meta: RouteMeta::AUTH,
    },
    RouteDef {
        name: RouteName::Reader,
        pattern: "/reader/:id",
        meta: RouteMeta::AUTH,
    },
    RouteDef {
        name: RouteName::Library,
        pattern: "/library",
        meta: RouteMeta::AUTH,
    },
    RouteDef {
        name: RouteName::Admin,
        pattern: "/admin",
        meta: RouteMeta::ADMIN,
    },
    RouteDef {
        name: RouteName::AdminUpload,
        pattern: "/admin/upload",
        meta: RouteMeta::ADMIN,
    },
    RouteDef {
        name: RouteName::Login,
        pattern: "/login",
        meta: RouteMeta::GUEST,
    },
    RouteDef {
        name: RouteName::Register,
        pattern: "/register",
        meta: RouteMeta::GUEST,
    },
];

/// Parsed query string. A key may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    values: BTreeMap<String, Vec<String>>,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Self { values }
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The value of `key` when it appears exactly once with a non-empty value.
    pub fn single(&self, key: &str) -> Option<&str> {
        match self.all(key) {
            [value] if !value.is_empty() => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A resolved navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    pub name: RouteName,
    /// Path plus query string, as requested.
    pub full_path: String,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub query: Query,
    pub meta: RouteMeta,
}

fn split_full_path(full_path: &str) -> (&str, &str) {
    let without_hash = full_path.split('#').next().unwrap_or_default();
    match without_hash.split_once('?') {
        Some((path, query)) => (path, query),
        None => (without_hash, ""),
    }
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let expected: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if expected.len() != actual.len() {
        return None;
    }

    let mut params = BTreeMap::new();
    for (want, got) in expected.iter().zip(actual.iter()) {
        match want.strip_prefix(':') {
            Some(param) => {
                params.insert(param.to_string(), (*got).to_string());
            }
            None if want == got => {}
            None => return None,
        }
    }
    Some(params)
}

/// Resolve `full_path` against the route table.
pub fn resolve(full_path: &str) -> Option<NavigationTarget> {
    let full_path = full_path.trim();
    let (path, raw_query) = split_full_path(full_path);
    let path = if path.is_empty() { "/" } else { path };

    ROUTES.iter().find_map(|route| {
        match_pattern(route.pattern, path).map(|params| NavigationTarget {
            name: route.name,
            full_path: full_path.to_string(),
            path: path.to_string(),
            params,
            query: Query::parse(raw_query),
            meta: route.meta,
        })
    })
}

/// Path for a named route with no parameters.
pub fn path_for(name: RouteName) -> Option<&'static str> {
    ROUTES
        .iter()
        .find(|route| route.name == name && !route.pattern.contains(':'))
        .map(|route| route.pattern)
}

/// Render a redirect as a path the router can navigate to.
pub fn redirect_href(redirect: &Redirect) -> String {
    match redirect {
        Redirect::Path(path) => path.clone(),
        Redirect::Route { name, query } => {
            let base = path_for(*name).unwrap_or("/");
            if query.is_empty() {
                return base.to_string();
            }
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter())
                .finish();
            format!("{}?{}", base, encoded)
        }
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The target may be shown.
    Allowed(NavigationTarget),
    /// The guard sent the user elsewhere.
    Redirected {
        from: NavigationTarget,
        to: Redirect,
    },
    /// No route matches the path.
    NotFound(String),
}

/// Entry point for navigation.
pub struct Router {
    guard: AccessGuard,
}

impl Router {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self {
            guard: AccessGuard::new(session),
        }
    }

    pub fn resolve(&self, full_path: &str) -> Option<NavigationTarget> {
        resolve(full_path)
    }

    pub async fn navigate(&self, full_path: &str) -> Navigation {
        let Some(target) = resolve(full_path) else {
            debug!(path = %full_path, "No route matches");
            return Navigation::NotFound(full_path.to_string());
        };

        match self.guard.before_each(&target).await {
            GuardDecision::Allow => Navigation::Allowed(target),
            GuardDecision::Redirect(to) => {
                debug!(from = %target.full_path, to = %redirect_href(&to), "Navigation redirected");
                Navigation::Redirected { from: target, to }
            }
        }
    }
}

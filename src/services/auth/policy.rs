//! Route -> requirement rules, evaluated after authentication.
//!
//! Rules are kept in specificity order: exact paths, then prefixes (longest
//! first), then any-path rules. Declaration order breaks ties. The first rule
//! whose pattern and method set match decides; no match means `Authenticated`.

use std::cmp::Reverse;

use axum::http::Method;

use crate::domain::Role;
use crate::services::auth::public_routes::{PublicRoute, PublicRoutes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
    Any,
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => path.starts_with(p.as_str()),
            PathPattern::Any => true,
        }
    }

    fn specificity(&self) -> (u8, Reverse<usize>) {
        match self {
            PathPattern::Exact(_) => (0, Reverse(0)),
            PathPattern::Prefix(p) => (1, Reverse(p.len())),
            PathPattern::Any => (2, Reverse(0)),
        }
    }
}

impl From<&PublicRoute> for PathPattern {
    fn from(route: &PublicRoute) -> Self {
        match route {
            PublicRoute::Exact(p) => PathPattern::exact(*p),
            PublicRoute::Prefix(p) => PathPattern::prefix(*p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Methods {
    Any,
    Only(Vec<Method>),
}

impl Methods {
    pub fn only(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::Only(methods.into_iter().collect())
    }

    fn matches(&self, method: &Method) -> bool {
        match self {
            Methods::Any => true,
            Methods::Only(list) => list.contains(method),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub methods: Methods,
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn new(pattern: PathPattern, methods: Methods, requirement: Requirement) -> Self {
        Self {
            pattern,
            methods,
            requirement,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.pattern.matches(path) && self.methods.matches(method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    // 401: no authenticated context
    Unauthenticated,
    // 403: context present, role insufficient
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(mut rules: Vec<AccessRule>) -> Self {
        // stable: declaration order survives inside a specificity class
        rules.sort_by_key(|r| r.pattern.specificity());
        Self { rules }
    }

    /// Public allowlist, self profile, admin-only user management, then any
    /// authenticated caller for the rest of `/api/` and every other path.
    pub fn with_defaults(public: &PublicRoutes) -> Self {
        let mut rules: Vec<AccessRule> = public
            .routes()
            .iter()
            .map(|r| AccessRule::new(r.into(), Methods::Any, Requirement::Public))
            .collect();

        rules.extend([
            AccessRule::new(
                PathPattern::exact("/api/users/profile"),
                Methods::only([Method::GET, Method::PUT]),
                Requirement::Authenticated,
            ),
            AccessRule::new(
                PathPattern::exact("/api/users"),
                Methods::only([Method::GET, Method::POST]),
                Requirement::Role(Role::Admin),
            ),
            AccessRule::new(
                PathPattern::prefix("/api/users/"),
                Methods::only([Method::GET, Method::PUT, Method::DELETE]),
                Requirement::Role(Role::Admin),
            ),
            AccessRule::new(
                PathPattern::prefix("/api/"),
                Methods::Any,
                Requirement::Authenticated,
            ),
            AccessRule::new(PathPattern::Any, Methods::Any, Requirement::Authenticated),
        ]);

        Self::new(rules)
    }

    pub fn requirement_for(&self, method: &Method, path: &str) -> Requirement {
        self.rules
            .iter()
            .find(|r| r.matches(method, path))
            .map(|r| r.requirement)
            .unwrap_or(Requirement::Authenticated)
    }

    pub fn evaluate(&self, method: &Method, path: &str, role: Option<Role>) -> Decision {
        match (self.requirement_for(method, path), role) {
            (Requirement::Public, _) => Decision::Allowed,
            (_, None) => Decision::Denied(Denial::Unauthenticated),
            (Requirement::Authenticated, Some(_)) => Decision::Allowed,
            (Requirement::Role(required), Some(actual)) if required == actual => Decision::Allowed,
            (Requirement::Role(_), Some(_)) => Decision::Denied(Denial::Forbidden),
        }
    }
}

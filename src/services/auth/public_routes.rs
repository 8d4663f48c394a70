/// Routes that bypass authentication entirely.
///
/// Matching is literal: `Prefix` is a raw string prefix, `Exact` an equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicRoute {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PublicRoute {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PublicRoute::Exact(p) => path == *p,
            PublicRoute::Prefix(p) => path.starts_with(p),
        }
    }
}

pub const DEFAULT_PUBLIC_ROUTES: &[PublicRoute] = &[
    PublicRoute::Prefix("/api/auth/"),
    PublicRoute::Prefix("/h2-console/"),
    PublicRoute::Exact("/"),
    PublicRoute::Prefix("/error"),
];

#[derive(Debug, Clone)]
pub struct PublicRoutes {
    routes: Vec<PublicRoute>,
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_ROUTES.to_vec())
    }
}

impl PublicRoutes {
    pub fn new(routes: Vec<PublicRoute>) -> Self {
        Self { routes }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.routes.iter().any(|r| r.matches(path))
    }

    pub fn routes(&self) -> &[PublicRoute] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allowlist() {
        let public = PublicRoutes::default();

        for path in [
            "/",
            "/api/auth/login",
            "/api/auth/refresh-token",
            "/h2-console/",
            "/error",
            "/error/500",
        ] {
            assert!(public.matches(path), "{path}");
        }
        for path in [
            "/api/auth",
            "/api/users",
            "/api/users/profile",
            "/h2-console",
            "//",
            "/index.html",
        ] {
            assert!(!public.matches(path), "{path}");
        }
    }
}

/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - login / users / subject resolver / access policy / public routes
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::UserStore;
use crate::services::auth::{
    AccessPolicy, AuthServices, LoginService, PublicRoutes, SubjectResolver,
};
use crate::services::users::UserService;

#[derive(Clone)]
pub struct AppState {
    pub login: LoginService,
    pub users: UserService,
    pub resolver: SubjectResolver,
    pub public_routes: Arc<PublicRoutes>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, auth: AuthServices) -> Self {
        let public_routes = PublicRoutes::default();
        let policy = AccessPolicy::with_defaults(&public_routes);

        let resolver = SubjectResolver::new(auth.validator, store.clone());
        let users = UserService::new(store, auth.passwords.clone());
        let login = LoginService::new(users.clone(), auth.passwords, auth.issuer, resolver.clone());

        Self {
            login,
            users,
            resolver,
            public_routes: Arc::new(public_routes),
            policy: Arc::new(policy),
        }
    }
}

/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware (authenticate) が作って request extensions に格納し、authorize / handler が読む
 *
 * Notes
 * - request をまたいで共有しない (request 終了とともに破棄される)
 */
use super::role::Role;

/// Authenticated identity for the lifetime of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedContext {
    pub subject: String,
    pub role: Role,
}

impl AuthenticatedContext {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}

/// Outcome of the authentication stage.
///
/// `Unauthenticated` is the implicit initial state (nothing in the extensions yet);
/// the authenticate stage always moves a request into one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    PublicAllowed,
    Anonymous,
    Authenticated(AuthenticatedContext),
}

impl AuthState {
    pub fn context(&self) -> Option<&AuthenticatedContext> {
        match self {
            AuthState::Authenticated(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.context().map(|ctx| ctx.role)
    }
}

pub mod auth_context;
pub mod identity;
pub mod role;

pub use auth_context::{AuthState, AuthenticatedContext};
pub use identity::{Identity, IdentityPatch, NewIdentity};
pub use role::{Permission, Role};

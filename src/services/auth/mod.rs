pub mod claims;
pub mod factory;
pub mod jwt;
pub mod login;
pub mod password;
pub mod policy;
pub mod public_routes;
pub mod subject;
pub mod token_issuer;
pub mod token_validator;

pub use factory::{AuthServices, AuthSettings, build_auth_services};
pub use login::{LoginOutcome, LoginService};
pub use policy::{AccessPolicy, Decision, Denial};
pub use public_routes::PublicRoutes;
pub use subject::SubjectResolver;

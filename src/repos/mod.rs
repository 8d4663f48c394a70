/*
 * Responsibility
 * - 永続化層の公開インターフェース (re-export)
 */
pub mod error;
pub mod memory_user_repo;
pub mod user_repo;
pub mod user_store;

pub use error::RepoError;
pub use memory_user_repo::InMemoryUserRepo;
pub use user_repo::PgUserRepo;
pub use user_store::UserStore;

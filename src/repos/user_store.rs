/*
 * Responsibility
 * - Identity store の契約 (lookup / mutation)
 * - 認証コアは find_by_username と touch_last_access しか使わない
 * - 最後の管理者保護は各実装が書き込みと同じ原子単位で判定する
 * - 実装: PgUserRepo (sqlx), InMemoryUserRepo (dev / test)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Identity, IdentityPatch, NewIdentity};
use crate::repos::error::RepoResult;

/// Lookup/mutation contract for identity records.
///
/// Implementations must be safe under concurrent use. Column writes are
/// last-write-wins, except that the active-administrator count is checked and
/// changed atomically: no interleaving of `update_details` / `deactivate` may
/// leave zero active administrators when there was at least one.
#[async_trait]
pub trait UserStore: Send + Sync {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Identity>>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Identity>>;

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool>;

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool>;

    // Active identities only, newest first.
    async fn list_active(&self) -> RepoResult<Vec<Identity>>;

    async fn count_active_admins(&self) -> RepoResult<i64>;

    // Insert a new identity (active = true). `RepoError::Conflict` on a unique violation.
    async fn insert(&self, new: NewIdentity, now: DateTime<Utc>) -> RepoResult<Identity>;

    // Writes the detail columns only; `active` and `last_access_at` are untouched.
    // None if the id does not exist. `RepoError::LastAdmin` if the patch would
    // demote the last active administrator.
    async fn update_details(&self, id: i64, patch: &IdentityPatch) -> RepoResult<Option<Identity>>;

    // `RepoError::LastAdmin` if the id is the last active administrator.
    async fn deactivate(&self, id: i64) -> RepoResult<Option<Identity>>;

    async fn reactivate(&self, id: i64) -> RepoResult<Option<Identity>>;

    // Returns the number of touched rows (0 if the username is unknown).
    async fn touch_last_access(&self, username: &str, at: DateTime<Utc>) -> RepoResult<u64>;
}

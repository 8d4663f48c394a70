/*
 * Responsibility
 * - UserStore のインメモリ実装 (DATABASE_URL 未設定時 / テスト用)
 * - username / email の一意性は insert / update_details で保証する
 * - 最後の管理者判定は write lock を握ったまま行う
 */
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{Identity, IdentityPatch, NewIdentity, Role};
use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_store::UserStore;

#[derive(Default)]
struct Users {
    next_id: i64,
    by_id: BTreeMap<i64, Identity>,
}

impl Users {
    fn conflict_for(
        &self,
        username: &str,
        email: &str,
        except_id: Option<i64>,
    ) -> Option<&'static str> {
        let others = self.by_id.values().filter(|u| Some(u.id) != except_id);
        for u in others {
            if u.username == username {
                return Some("username");
            }
            if u.email == email {
                return Some("email");
            }
        }
        None
    }

    fn is_last_active_admin(&self, id: i64) -> bool {
        let target_is_admin = self.by_id.get(&id).is_some_and(Identity::is_active_admin);
        target_is_admin && self.by_id.values().filter(|u| u.is_active_admin()).count() <= 1
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserRepo {
    inner: Arc<RwLock<Users>>,
}

impl std::fmt::Debug for InMemoryUserRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserRepo").finish_non_exhaustive()
    }
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepo {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Identity>> {
        let users = self.inner.read().await;
        Ok(users.by_id.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Identity>> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool> {
        let users = self.inner.read().await;
        Ok(users.by_id.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let users = self.inner.read().await;
        Ok(users.by_id.values().any(|u| u.email == email))
    }

    async fn list_active(&self) -> RepoResult<Vec<Identity>> {
        let users = self.inner.read().await;
        let mut active: Vec<Identity> =
            users.by_id.values().filter(|u| u.active).cloned().collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(active)
    }

    async fn count_active_admins(&self) -> RepoResult<i64> {
        let users = self.inner.read().await;
        let count = users
            .by_id
            .values()
            .filter(|u| u.active && u.role == Role::Admin)
            .count();
        Ok(count as i64)
    }

    async fn insert(&self, new: NewIdentity, now: DateTime<Utc>) -> RepoResult<Identity> {
        let mut users = self.inner.write().await;
        if let Some(field) = users.conflict_for(&new.username, &new.email, None) {
            return Err(RepoError::Conflict(field));
        }

        users.next_id += 1;
        let identity = Identity {
            id: users.next_id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            phone: new.phone,
            role: new.role,
            active: true,
            created_at: now,
            last_access_at: None,
        };
        users.by_id.insert(identity.id, identity.clone());

        Ok(identity)
    }

    async fn update_details(&self, id: i64, patch: &IdentityPatch) -> RepoResult<Option<Identity>> {
        let mut users = self.inner.write().await;
        if !users.by_id.contains_key(&id) {
            return Ok(None);
        }
        if let Some(field) = users.conflict_for(&patch.username, &patch.email, Some(id)) {
            return Err(RepoError::Conflict(field));
        }
        if patch.demotes_admin() && users.is_last_active_admin(id) {
            return Err(RepoError::LastAdmin);
        }

        let Some(u) = users.by_id.get_mut(&id) else {
            return Ok(None);
        };
        u.username = patch.username.clone();
        u.email = patch.email.clone();
        if let Some(hash) = &patch.password_hash {
            u.password_hash = hash.clone();
        }
        u.full_name = patch.full_name.clone();
        u.phone = patch.phone.clone();
        if let Some(role) = patch.role {
            u.role = role;
        }

        Ok(Some(u.clone()))
    }

    async fn deactivate(&self, id: i64) -> RepoResult<Option<Identity>> {
        let mut users = self.inner.write().await;
        if users.is_last_active_admin(id) {
            return Err(RepoError::LastAdmin);
        }
        Ok(users.by_id.get_mut(&id).map(|u| {
            u.active = false;
            u.clone()
        }))
    }

    async fn reactivate(&self, id: i64) -> RepoResult<Option<Identity>> {
        let mut users = self.inner.write().await;
        Ok(users.by_id.get_mut(&id).map(|u| {
            u.active = true;
            u.clone()
        }))
    }

    async fn touch_last_access(&self, username: &str, at: DateTime<Utc>) -> RepoResult<u64> {
        let mut users = self.inner.write().await;
        match users.by_id.values_mut().find(|u| u.username == username) {
            Some(u) => {
                u.last_access_at = Some(at);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

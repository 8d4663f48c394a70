/*
 * Responsibility
 * - ユーザー管理の業務ルール (重複チェック / パスワードハッシュ / 最後の管理者保護)
 * - 自分のプロフィール更新 (ChangeOwnRole 権限がなければ role は据え置き)
 * - 起動時の管理者ブートストラップ
 *
 * Notes
 * - 永続化は UserStore に委譲する。handler は DTO -> UserDraft / UserChanges に詰め替えて呼ぶ
 */
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::BootstrapAdmin;
use crate::domain::{AuthenticatedContext, Identity, IdentityPatch, NewIdentity, Permission, Role};
use crate::error::AppError;
use crate::repos::{RepoError, UserStore};
use crate::services::auth::password::PasswordService;

/// Input for `create` / `register`. Password is plaintext.
#[derive(Clone)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Input for `update` / `update_profile`.
/// `password: None` (or empty) keeps the current hash, `role: None` the current role.
#[derive(Clone)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    passwords: PasswordService,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, passwords: PasswordService) -> Self {
        Self { users, passwords }
    }

    pub async fn create(&self, draft: UserDraft, now: DateTime<Utc>) -> Result<Identity, AppError> {
        if self.users.exists_by_username(&draft.username).await? {
            return Err(AppError::DuplicateUsername);
        }
        if self.users.exists_by_email(&draft.email).await? {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.passwords.hash(draft.password).await?;
        let identity = self
            .users
            .insert(
                NewIdentity {
                    username: draft.username,
                    email: draft.email,
                    password_hash,
                    full_name: draft.full_name,
                    phone: draft.phone,
                    role: draft.role,
                },
                now,
            )
            .await?;

        info!(
            user_id = identity.id,
            username = %identity.username,
            role = %identity.role,
            "user created"
        );
        Ok(identity)
    }

    /// Self-registration: the requested role is ignored.
    pub async fn register(
        &self,
        mut draft: UserDraft,
        now: DateTime<Utc>,
    ) -> Result<Identity, AppError> {
        draft.role = Role::User;
        self.create(draft, now).await
    }

    pub async fn list(&self) -> Result<Vec<Identity>, AppError> {
        Ok(self.users.list_active().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Identity, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AppError::not_found("user"))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AppError> {
        Ok(self.users.find_by_username(username).await?)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Identity, AppError> {
        self.find_by_username(username)
            .await?
            .ok_or(AppError::not_found("user"))
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<Identity, AppError> {
        let current = self.get(id).await?;

        if current.username != changes.username
            && self.users.exists_by_username(&changes.username).await?
        {
            return Err(AppError::DuplicateUsername);
        }
        if current.email != changes.email && self.users.exists_by_email(&changes.email).await? {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = match changes.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(self.passwords.hash(password).await?),
            None => None,
        };
        let patch = IdentityPatch {
            username: changes.username,
            email: changes.email,
            password_hash,
            full_name: changes.full_name,
            phone: changes.phone,
            role: changes.role,
        };

        let saved = self
            .users
            .update_details(id, &patch)
            .await
            .map_err(|e| refused_if_last_admin(e, id))?
            .ok_or(AppError::not_found("user"))?;

        info!(user_id = saved.id, username = %saved.username, "user updated");
        Ok(saved)
    }

    /// Soft delete. The last active administrator stays active.
    pub async fn deactivate(&self, id: i64) -> Result<(), AppError> {
        let identity = self
            .users
            .deactivate(id)
            .await
            .map_err(|e| refused_if_last_admin(e, id))?
            .ok_or(AppError::not_found("user"))?;

        info!(user_id = id, username = %identity.username, "user deactivated");
        Ok(())
    }

    pub async fn reactivate(&self, id: i64) -> Result<(), AppError> {
        let identity = self
            .users
            .reactivate(id)
            .await?
            .ok_or(AppError::not_found("user"))?;

        info!(user_id = id, username = %identity.username, "user reactivated");
        Ok(())
    }

    pub async fn profile(&self, ctx: &AuthenticatedContext) -> Result<Identity, AppError> {
        self.get_by_username(&ctx.subject).await
    }

    pub async fn update_profile(
        &self,
        ctx: &AuthenticatedContext,
        mut changes: UserChanges,
    ) -> Result<Identity, AppError> {
        let current = self.get_by_username(&ctx.subject).await?;
        if !ctx.role.has(Permission::ChangeOwnRole) {
            changes.role = None;
        }
        self.update(current.id, changes).await
    }

    /// Last-write-wins. Failures are logged, never returned.
    pub async fn touch_last_access(&self, username: &str, now: DateTime<Utc>) {
        if let Err(e) = self.users.touch_last_access(username, now).await {
            warn!(error = ?e, username = %username, "failed to record last access");
        }
    }

    /// Creates the configured administrator when no active administrator exists.
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
        now: DateTime<Utc>,
    ) -> Result<Option<Identity>, AppError> {
        if self.users.count_active_admins().await? > 0 {
            return Ok(None);
        }

        let draft = UserDraft {
            username: admin.username.clone(),
            email: admin.email.clone(),
            password: admin.password.clone(),
            full_name: "Administrator".to_string(),
            phone: None,
            role: Role::Admin,
        };

        match self.create(draft, now).await {
            Ok(identity) => {
                info!(username = %identity.username, "bootstrap administrator created");
                Ok(Some(identity))
            }
            Err(AppError::DuplicateUsername | AppError::DuplicateEmail) => {
                warn!(
                    username = %admin.username,
                    "no active administrator, but bootstrap identity already exists"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn refused_if_last_admin(e: RepoError, id: i64) -> AppError {
    if matches!(e, RepoError::LastAdmin) {
        warn!(user_id = id, "refusing to remove the last administrator");
    }
    e.into()
}

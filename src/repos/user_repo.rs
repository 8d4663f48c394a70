/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (UserStore の PostgreSQL 実装)
 * - PgPool を受け取り lookup / insert / update を提供
 * - 管理者の降格・無効化は有効な管理者行を FOR UPDATE でロックしてから判定する
 * - DB エラーは RepoError に変換して返す (unique 違反は Conflict)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::domain::{Identity, IdentityPatch, NewIdentity, Role};
use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_store::UserStore;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for Identity {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| RepoError::InvalidRow(e.to_string()))?;

        Ok(Identity {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            phone: row.phone,
            role,
            active: row.active,
            created_at: row.created_at,
            last_access_at: row.last_access_at,
        })
    }
}

fn into_identity(row: Option<UserRow>) -> RepoResult<Option<Identity>> {
    row.map(Identity::try_from).transpose()
}

// Locks every active admin row (in id order, so concurrent callers queue instead
// of deadlocking) and reports whether `id` is the only one left.
async fn is_last_active_admin(conn: &mut PgConnection, id: i64) -> RepoResult<bool> {
    let admins = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM users
        WHERE role = 'ADMIN' AND active = TRUE
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .fetch_all(conn)
    .await?;

    Ok(admins.contains(&id) && admins.len() <= 1)
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, full_name, phone,
                   role, active, created_at, last_access_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        into_identity(row)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, full_name, phone,
                   role, active, created_at, last_access_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        into_identity(row)
    }

    async fn exists_by_username(&self, username: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_active(&self) -> RepoResult<Vec<Identity>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, full_name, phone,
                   role, active, created_at, last_access_at
            FROM users
            WHERE active = TRUE
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Identity::try_from).collect()
    }

    async fn count_active_admins(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users WHERE role = 'ADMIN' AND active = TRUE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert(&self, new: NewIdentity, now: DateTime<Utc>) -> RepoResult<Identity> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (username, email, password_hash, full_name, phone, role, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
            RETURNING id, username, email, password_hash, full_name, phone,
                      role, active, created_at, last_access_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(new.phone.as_deref())
        .bind(new.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Identity::try_from(row)
    }

    async fn update_details(&self, id: i64, patch: &IdentityPatch) -> RepoResult<Option<Identity>> {
        let mut tx = self.pool.begin().await?;

        if patch.demotes_admin() && is_last_active_admin(&mut *tx, id).await? {
            return Err(RepoError::LastAdmin);
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                username = $2,
                email = $3,
                password_hash = COALESCE($4, password_hash),
                full_name = $5,
                phone = $6,
                role = COALESCE($7, role)
            WHERE id = $1
            RETURNING id, username, email, password_hash, full_name, phone,
                      role, active, created_at, last_access_at
            "#,
        )
        .bind(id)
        .bind(&patch.username)
        .bind(&patch.email)
        .bind(patch.password_hash.as_deref())
        .bind(&patch.full_name)
        .bind(patch.phone.as_deref())
        .bind(patch.role.map(|role| role.as_str()))
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepoError::from_sqlx)?;

        tx.commit().await?;
        into_identity(row)
    }

    async fn deactivate(&self, id: i64) -> RepoResult<Option<Identity>> {
        let mut tx = self.pool.begin().await?;

        if is_last_active_admin(&mut *tx, id).await? {
            return Err(RepoError::LastAdmin);
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET active = FALSE
            WHERE id = $1
            RETURNING id, username, email, password_hash, full_name, phone,
                      role, active, created_at, last_access_at
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        into_identity(row)
    }

    async fn reactivate(&self, id: i64) -> RepoResult<Option<Identity>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET active = TRUE
            WHERE id = $1
            RETURNING id, username, email, password_hash, full_name, phone,
                      role, active, created_at, last_access_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        into_identity(row)
    }

    async fn touch_last_access(&self, username: &str, at: DateTime<Utc>) -> RepoResult<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET last_access_at = $2
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }
}

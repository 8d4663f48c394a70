/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - unique 制約違反 (23505) は Conflict として区別する
 * - 最後の有効な管理者を外す書き込みは LastAdmin (ストア側で原子的に判定)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict on {0}")]
    Conflict(&'static str),
    #[error("last active administrator")]
    LastAdmin,
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return match dbe.constraint() {
                Some(c) if c.contains("email") => RepoError::Conflict("email"),
                _ => RepoError::Conflict("username"),
            };
        }
        RepoError::Db(e)
    }
}

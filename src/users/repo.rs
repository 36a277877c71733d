use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{HistoryEntry, NewUser, SearchKind, User};

/// Which unique column a write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error("user {0} does not exist")]
    UnknownUser(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Persistence for user accounts and their search history.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a user; email and username must both be unused.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Appends one entry to the end of the user's history.
    async fn push_history(&self, user_id: Uuid, entry: HistoryEntry) -> Result<(), StoreError>;

    /// Removes every entry with `external_id`; returns how many were removed.
    async fn pull_history(&self, user_id: Uuid, external_id: i64) -> Result<u64, StoreError>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    password_hash: String,
    image: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    external_id: i64,
    image: Option<String>,
    title: String,
    search_type: String,
    created_at: OffsetDateTime,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = StoreError;

    fn try_from(r: HistoryRow) -> Result<Self, Self::Error> {
        let search_type = r
            .search_type
            .parse::<SearchKind>()
            .map_err(StoreError::Corrupt)?;
        Ok(Self {
            id: r.external_id,
            image: r.image,
            title: r.title,
            search_type,
            created_at: r.created_at,
        })
    }
}

/// Postgres-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }

    async fn find_where(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        // `column` is always one of our own literals, never caller input.
        let sql = format!(
            "SELECT id, email, username, password_hash, image, created_at, updated_at \
             FROM users WHERE {column} = $1"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn hydrate(&self, row: UserRow) -> Result<User, StoreError> {
        let history = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT external_id, image, title, search_type, created_at
            FROM search_history
            WHERE user_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(HistoryEntry::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            image: row.image,
            search_history: history,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn classify(e: sqlx::Error, user_id: Option<Uuid>) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("users_username_key") => StoreError::Duplicate(UniqueField::Username),
                _ => StoreError::Duplicate(UniqueField::Email),
            };
        }
        if db.is_foreign_key_violation() {
            if let Some(id) = user_id {
                return StoreError::UnknownUser(id);
            }
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, username, password_hash, image, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_where("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_where("username", username).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, username, password_hash, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, password_hash, image, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.image)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, None))?;

        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            image: row.image,
            search_history: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn push_history(&self, user_id: Uuid, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO search_history (user_id, external_id, image, title, search_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(entry.id)
        .bind(&entry.image)
        .bind(&entry.title)
        .bind(entry.search_type.as_str())
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, Some(user_id)))?;

        sqlx::query("UPDATE users SET updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn pull_history(&self, user_id: Uuid, external_id: i64) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await?;
        let removed = sqlx::query(
            r#"
            DELETE FROM search_history
            WHERE user_id = $1 AND external_id = $2
            "#,
        )
        .bind(user_id)
        .bind(external_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if removed > 0 {
            sqlx::query("UPDATE users SET updated_at = now() WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(removed)
    }
}

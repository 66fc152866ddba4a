use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

impl User {
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// Overwrites the mutable fields. `None` when the row does not exist.
    pub async fn update(
        db: &PgPool,
        id: i64,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET username = $2, email = $3, password_hash = $4, updated_at = now()
             WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(db)
        .await
    }

    /// Deletes the user with every comment and post that depends on them, in
    /// one transaction. Returns `false` if the user did not exist.
    pub async fn delete_cascade(db: &PgPool, id: i64) -> sqlx::Result<bool> {
        let mut tx = db.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM comments
             WHERE user_id = $1
                OR post_id IN (SELECT id FROM posts WHERE author_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM posts WHERE author_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

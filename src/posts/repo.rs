use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// A post joined with the public fields of its author.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author_username: String,
    pub author_email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const SELECT_JOINED: &str = r#"
    SELECT p.id, p.title, p.content, p.author_id,
           u.username AS author_username, u.email AS author_email,
           p.created_at, p.updated_at
"#;

impl Post {
    pub async fn create(
        db: &PgPool,
        title: &str,
        content: &str,
        author_id: i64,
    ) -> sqlx::Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (title, content, author_id)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            {SELECT_JOINED}
            FROM p JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(title)
        .bind(content)
        .bind(author_id)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            {SELECT_JOINED}
            FROM posts p JOIN users u ON u.id = p.author_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> sqlx::Result<Vec<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            {SELECT_JOINED}
            FROM posts p JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    /// Overwrites title and content. The author never changes.
    pub async fn update(
        db: &PgPool,
        id: i64,
        title: &str,
        content: &str,
    ) -> sqlx::Result<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            WITH p AS (
                UPDATE posts
                   SET title = $2, content = $3, updated_at = now()
                 WHERE id = $1
                RETURNING *
            )
            {SELECT_JOINED}
            FROM p JOIN users u ON u.id = p.author_id
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(db)
        .await
    }

    /// Deletes the post and its comments in one transaction.
    pub async fn delete_with_comments(db: &PgPool, id: i64) -> sqlx::Result<bool> {
        let mut tx = db.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
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

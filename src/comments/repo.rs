use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// A comment joined with its author's username.
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub body: String,
    pub username: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const SELECT_JOINED: &str = r#"
    SELECT c.id, c.user_id, c.post_id, c.body, u.username, c.created_at, c.updated_at
"#;

impl Comment {
    pub async fn create(db: &PgPool, user_id: i64, post_id: i64, body: &str) -> sqlx::Result<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                INSERT INTO comments (user_id, post_id, body)
                VALUES ($1, $2, $3)
                RETURNING *
            )
            {SELECT_JOINED}
            FROM c JOIN users u ON u.id = c.user_id
            "#
        ))
        .bind(user_id)
        .bind(post_id)
        .bind(body)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> sqlx::Result<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            {SELECT_JOINED}
            FROM comments c JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn list_by_post(db: &PgPool, post_id: i64) -> sqlx::Result<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            {SELECT_JOINED}
            FROM comments c JOIN users u ON u.id = c.user_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#
        ))
        .bind(post_id)
        .fetch_all(db)
        .await
    }

    pub async fn update(db: &PgPool, id: i64, body: &str) -> sqlx::Result<Option<Comment>> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            WITH c AS (
                UPDATE comments
                   SET body = $2, updated_at = now()
                 WHERE id = $1
                RETURNING *
            )
            {SELECT_JOINED}
            FROM c JOIN users u ON u.id = c.user_id
            "#
        ))
        .bind(id)
        .bind(body)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: i64) -> sqlx::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{posts::repo::Post, users::repo::User};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn comment_lifecycle(db: PgPool) {
        let user = User::create(&db, "pet", "pet@gmail.com", "h").await.unwrap();
        let post = Post::create(&db, "T", "c", user.id).await.unwrap();

        let c = Comment::create(&db, user.id, post.id, "first").await.unwrap();
        assert_eq!(c.username, "pet");

        let listed = Comment::list_by_post(&db, post.id).await.unwrap();
        assert_eq!(listed.len(), 1);

        let updated = Comment::update(&db, c.id, "edited").await.unwrap().unwrap();
        assert_eq!(updated.body, "edited");
        assert_eq!(updated.user_id, user.id);

        assert!(Comment::delete(&db, c.id).await.unwrap());
        assert!(Comment::find_by_id(&db, c.id).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn deleting_a_post_removes_its_comments(db: PgPool) {
        let user = User::create(&db, "pet", "pet@gmail.com", "h").await.unwrap();
        let post = Post::create(&db, "T", "c", user.id).await.unwrap();
        Comment::create(&db, user.id, post.id, "x").await.unwrap();

        assert!(Post::delete_with_comments(&db, post.id).await.unwrap());
        assert!(Comment::list_by_post(&db, post.id).await.unwrap().is_empty());
    }
}

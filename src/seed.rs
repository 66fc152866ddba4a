use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use crate::auth::password::hash_password;

struct SeedUser {
    username: &'static str,
    email: &'static str,
    password: &'static str,
    post_title: &'static str,
    post_content: &'static str,
}

static SEED: [SeedUser; 2] = [
    SeedUser {
        username: "tester",
        email: "tester.mctesterson@mailinator.com",
        password: "p@$$w0rd",
        post_title: "Test Title 1",
        post_content: "The key is to enjoy writing. Start small, publish often.",
    },
    SeedUser {
        username: "luther",
        email: "luther@gmail.com",
        password: "p@$$w0rd",
        post_title: "Test Title 2",
        post_content: "Take the trash out of your drafts and keep the good parts.",
    },
];

/// Wipes all blog tables and inserts a small fixed data set.
pub async fn load(db: &PgPool) -> anyhow::Result<()> {
    let mut tx = db.begin().await.context("begin seed tx")?;

    sqlx::query("TRUNCATE comments, posts, users RESTART IDENTITY CASCADE")
        .execute(&mut *tx)
        .await
        .context("truncate tables")?;

    for u in &SEED {
        let hash = hash_password(u.password)?;
        let (user_id,): (i64,) = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(u.username)
        .bind(u.email)
        .bind(&hash)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("seed user {}", u.username))?;

        sqlx::query("INSERT INTO posts (title, content, author_id) VALUES ($1, $2, $3)")
            .bind(u.post_title)
            .bind(u.post_content)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("seed post {}", u.post_title))?;
    }

    tx.commit().await.context("commit seed tx")?;
    info!(users = SEED.len(), "database seeded");
    Ok(())
}

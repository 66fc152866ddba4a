mod app;
mod auth;
mod comments;
mod config;
mod error;
mod extract;
mod posts;
mod responses;
mod seed;
mod state;
mod users;
mod validation;

use anyhow::Context;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "blog_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let (host, port, seed_on_start) = (config.host.clone(), config.port, config.seed_on_start);
    let state = AppState::init(config).await?;

    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("run migrations")?;

    if seed_on_start {
        seed::load(&state.db).await?;
    }

    let app = app::build_app(state);
    app::serve(app, &host, port).await
}

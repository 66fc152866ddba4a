use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub seed_on_start: bool,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => compose_database_url(&var)?,
        };

        let secret = var("JWT_SECRET")
            .or_else(|| var("API_SECRET"))
            .context("JWT_SECRET (or API_SECRET) must be set")?;

        let jwt = JwtConfig {
            secret,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "blog-api".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "blog-api-users".into()),
            ttl_minutes: parse_or(&var, "JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: parse_or(&var, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        Ok(Self {
            database_url,
            max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", 10),
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "APP_PORT", 8080),
            seed_on_start: var("SEED_ON_START")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            jwt,
        })
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    var(key).and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

/// Variable prefix for the per-environment database settings.
fn env_prefix(environment: Option<&str>) -> &'static str {
    match environment {
        Some("dev") | Some("local") => "DEV_",
        Some("production") => "",
        _ => "TEST_",
    }
}

fn compose_database_url<F>(var: &F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = env_prefix(var("ENVIRONMENT").as_deref());
    let get = |name: &str| {
        let key = format!("{prefix}{name}");
        var(&key).with_context(|| format!("DATABASE_URL is unset and {key} is missing"))
    };

    let host = get("DB_HOST")?;
    let user = get("DB_USER")?;
    let name = get("DB_NAME")?;
    let password = var(&format!("{prefix}DB_PASSWORD")).unwrap_or_default();
    let port = var(&format!("{prefix}DB_PORT")).unwrap_or_else(|| "5432".into());

    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}

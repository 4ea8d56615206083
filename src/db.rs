use crate::config::Config;
use crate::queue::redis_client::RedisClient;
use anyhow::{Context, Result};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_defillama_schema",
    include_str!("../sql/001_defillama_schema.sql"),
)];

/// Creates a connection pool to the Postgres database
pub async fn get_db_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to Postgres")
}

/// Connects to Redis when `REDIS_URL` is configured.
pub async fn get_redis_client(config: &Config) -> Result<Option<RedisClient>> {
    match &config.redis_url {
        Some(url) => Ok(Some(RedisClient::new(url).await?)),
        None => {
            info!("REDIS_URL not set, ingestion events will not be published");
            Ok(None)
        }
    }
}

/// Applies embedded schema migrations that have not run yet.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMPTZ DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM migrations WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await?;
        let count: i64 = row.try_get("count")?;

        if count > 0 {
            info!("Migration {} already applied, skipping", name);
            continue;
        }

        info!("Applying migration: {}", name);
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Migration {name} failed"))?;
        sqlx::query("INSERT INTO migrations (name) VALUES ($1)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    info!("All migrations completed successfully");
    Ok(())
}

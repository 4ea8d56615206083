use anyhow::Result;
use indexer::config::Config;
use indexer::llama::{Ingester, IngestionScheduler, LlamaClient};
use indexer::store::PgStore;
use indexer::db;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    println!("🚀 Starting DefiLlama Indexer - Scheduler");
    println!("==========================================\n");

    let config = Config::from_env()?;

    let pool = db::get_db_pool(&config).await?;
    db::run_migrations(&pool).await?;
    let redis = db::get_redis_client(&config).await?;

    let client = LlamaClient::new(
        config.endpoints.clone(),
        config.http_timeout,
        config.http_max_retries,
    )?;
    let ingester = Ingester::new(
        Arc::new(client),
        Arc::new(PgStore::new(pool)),
        config.target_chain.clone(),
    );

    let scheduler = IngestionScheduler::new(Arc::new(ingester), &config.ingest_cron, redis)?;
    scheduler.start(config.run_on_start).await
}

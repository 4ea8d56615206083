use anyhow::{Context, Result};
use indexer::queue::RedisClient;
use indexer::queue::worker::IngestionWorker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    println!("🎧 Starting DefiLlama Indexer - Worker");
    println!("======================================\n");

    let redis_url = std::env::var("REDIS_URL").context("REDIS_URL must be set in .env")?;
    let redis = RedisClient::new(&redis_url).await?;

    IngestionWorker::new(redis).run().await
}

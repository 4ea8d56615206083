use super::events::IngestionEvent;
use super::redis_client::RedisClient;
use crate::llama::ingester::RunReport;
use crate::llama::scheduler::INGESTION_CHANNEL;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long the last completed report stays readable when no newer run lands.
pub const LAST_RUN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Cache key holding the latest completed run report for `chain`.
pub fn last_run_key(chain: &str) -> String {
    format!("defillama:last_run:{chain}")
}

/// Counter key for one run outcome (`completed`, `failed`, `skipped`).
pub fn run_counter_key(outcome: &str) -> String {
    format!("defillama:runs:{outcome}")
}

/// Key-value writes the worker performs for each ingestion event.
#[async_trait]
pub trait RunCache: Send {
    async fn store_report(&mut self, key: &str, report: &RunReport, ttl_secs: u64) -> Result<()>;

    /// Increments the counter at `key` and returns the new total.
    async fn increment(&mut self, key: &str) -> Result<i64>;
}

#[async_trait]
impl RunCache for RedisClient {
    async fn store_report(&mut self, key: &str, report: &RunReport, ttl_secs: u64) -> Result<()> {
        self.set_with_expiry(key, report, ttl_secs).await
    }

    async fn increment(&mut self, key: &str) -> Result<i64> {
        RedisClient::increment(self, key).await
    }
}

/// Caches completed reports for readers and counts every outcome.
pub async fn record_event<C>(cache: &mut C, event: &IngestionEvent) -> Result<()>
where
    C: RunCache + ?Sized,
{
    if let IngestionEvent::Completed(report) = event {
        cache
            .store_report(&last_run_key(&report.chain), report, LAST_RUN_TTL_SECS)
            .await?;
    }

    let total = cache.increment(&run_counter_key(event.outcome())).await?;

    info!(
        "Recorded {} ingestion for {} ({} so far)",
        event.outcome(),
        event.chain(),
        total
    );
    Ok(())
}

pub struct IngestionWorker {
    redis: RedisClient,
}

impl IngestionWorker {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    async fn consume(&mut self) -> Result<()> {
        let mut pubsub = self.redis.subscribe(INGESTION_CHANNEL).await?;
        let mut messages = pubsub.on_message();

        while let Some(msg) = messages.next().await {
            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Unreadable message on {}: {}", INGESTION_CHANNEL, e);
                    continue;
                }
            };

            match serde_json::from_str::<IngestionEvent>(&payload) {
                Ok(event) => {
                    if let Err(e) = record_event(&mut self.redis, &event).await {
                        warn!("Failed to record ingestion event: {}", e);
                    }
                }
                Err(e) => warn!("Ignoring malformed ingestion event: {}", e),
            }
        }

        Err(anyhow!("Subscription to {} closed", INGESTION_CHANNEL))
    }

    /// Consumes ingestion events forever, resubscribing after disconnects.
    pub async fn run(&mut self) -> Result<()> {
        self.redis.ping().await?;

        loop {
            if let Err(e) = self.consume().await {
                warn!("Disconnected: {}. Retrying in {}s...", e, RECONNECT_DELAY.as_secs());
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

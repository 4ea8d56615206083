use anyhow::{Context, Result};
use redis::aio::{ConnectionManager, PubSub};
use redis::{AsyncCommands, Client};
use tracing::{info, warn};

#[derive(Clone)]
pub struct RedisClient {
    client: Client,
    pub connection: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("Failed to create Redis client")?;

        let connection = ConnectionManager::new(client.clone())
            .await
            .context("Failed to establish Redis connection")?;

        info!("Successfully connected to Redis");

        Ok(Self { client, connection })
    }

    pub async fn publish<T: serde::Serialize>(&mut self, channel: &str, message: &T) -> Result<()> {
        let json = serde_json::to_string(message).context("Failed to serialize message")?;

        match self.connection.publish::<_, _, ()>(channel, json).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("  Redis publish error: {}", e);

                if e.is_connection_dropped() || e.is_io_error() {
                    warn!("  Redis connection lost, attempting reconnect...");
                }

                Err(e.into())
            }
        }
    }

    /// Dedicated pub/sub connection subscribed to `channel`.
    pub async fn subscribe(&self, channel: &str) -> Result<PubSub> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .context("Failed to open Redis pub/sub connection")?;

        pubsub
            .subscribe(channel)
            .await
            .with_context(|| format!("Failed to subscribe to {channel}"))?;

        info!("Subscribed to Redis channel: {}", channel);
        Ok(pubsub)
    }

    /// Stores `value` as JSON under `key`, expiring after `expiry_seconds`.
    pub async fn set_with_expiry<T: serde::Serialize>(
        &mut self,
        key: &str,
        value: &T,
        expiry_seconds: u64,
    ) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize value")?;

        self.connection
            .set_ex::<_, _, ()>(key, json, expiry_seconds)
            .await
            .context("Failed to set key with expiry")?;

        Ok(())
    }

    pub async fn increment(&mut self, key: &str) -> Result<i64> {
        let value = self
            .connection
            .incr(key, 1)
            .await
            .context("Failed to increment counter")?;

        Ok(value)
    }

    pub async fn ping(&mut self) -> Result<()> {
        redis::cmd("PING")
            .query_async::<String>(&mut self.connection)
            .await
            .context("Redis PING failed")?;
        Ok(())
    }
}

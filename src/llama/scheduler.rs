use crate::llama::ingester::Ingester;
use crate::queue::events::IngestionEvent;
use crate::queue::redis_client::RedisClient;
use anyhow::{Context, Result};
use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

pub const INGESTION_CHANNEL: &str = "defillama:ingestion";

/// What happened when the trigger fired.
#[derive(Debug)]
pub enum Firing {
    Started(JoinHandle<()>),
    Skipped,
}

/// Cron-driven trigger for `Ingester::run`. At most one run is in flight;
/// a firing that finds one still running is skipped.
pub struct IngestionScheduler {
    ingester: Arc<Ingester>,
    schedule: Schedule,
    in_flight: Arc<Mutex<()>>,
    publisher: Option<RedisClient>,
}

impl IngestionScheduler {
    pub fn new(
        ingester: Arc<Ingester>,
        cron_expression: &str,
        publisher: Option<RedisClient>,
    ) -> Result<Self> {
        let schedule = Schedule::from_str(cron_expression)
            .with_context(|| format!("Invalid cron expression: {cron_expression}"))?;

        Ok(Self {
            ingester,
            schedule,
            in_flight: Arc::new(Mutex::new(())),
            publisher,
        })
    }

    /// Sleeps until each upcoming cron instant and fires. Never returns
    /// unless the schedule runs out of instants.
    pub async fn start(&self, run_on_start: bool) -> Result<()> {
        info!("Starting DefiLlama ingestion scheduler for {}", self.ingester.target_chain());

        if run_on_start {
            self.fire().await;
        }

        loop {
            let Some(next_run) = self.schedule.upcoming(Utc).next() else {
                error!("No upcoming cron schedule found");
                anyhow::bail!("cron schedule has no upcoming runs");
            };

            let wait = (next_run - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            info!("Next ingestion scheduled for: {}", next_run);
            sleep(wait).await;

            self.fire().await;
        }
    }

    /// Starts a run in the background unless one is already in flight.
    pub async fn fire(&self) -> Firing {
        let chain = self.ingester.target_chain().to_string();

        let Ok(guard) = Arc::clone(&self.in_flight).try_lock_owned() else {
            warn!("Previous ingestion for {} still in flight, skipping this firing", chain);
            publish(self.publisher.clone(), IngestionEvent::skipped(&chain)).await;
            return Firing::Skipped;
        };

        let ingester = Arc::clone(&self.ingester);
        let publisher = self.publisher.clone();

        let handle = tokio::spawn(async move {
            let _guard = guard;

            let event = match ingester.run().await {
                Ok(report) => IngestionEvent::Completed(report),
                Err(e) => {
                    error!("Ingestion run for {} failed: {}", chain, e);
                    IngestionEvent::failed(&chain, &e)
                }
            };

            publish(publisher, event).await;
        });

        Firing::Started(handle)
    }
}

async fn publish(publisher: Option<RedisClient>, event: IngestionEvent) {
    let Some(mut redis) = publisher else {
        return;
    };

    if let Err(e) = redis.publish(INGESTION_CHANNEL, &event).await {
        warn!("Failed to publish ingestion event: {}", e);
    }
}

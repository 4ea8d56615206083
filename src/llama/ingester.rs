use crate::error::{IndexerError, Result};
use crate::llama::client::DefiLlamaApi;
use crate::llama::mapper;
use crate::models::{
    ChainResponse, DexInfoResponse, ProtocolResponse, StableCoinResponse, YieldPoolResponse,
};
use crate::store::{Store, StoreTransaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of the transactional DEX step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DexStatus {
    Saved { dex_info_id: i64, protocols: usize },
    RolledBack { error: String },
}

/// Summary of one complete ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub chain: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub chains_saved: usize,
    pub protocols_saved: usize,
    pub stable_coins_saved: usize,
    pub stable_coins_skipped: usize,
    pub yield_pools_saved: usize,
    pub dex: DexStatus,
}

pub struct Ingester {
    api: Arc<dyn DefiLlamaApi>,
    store: Arc<dyn Store>,
    target_chain: String,
}

impl Ingester {
    pub fn new(
        api: Arc<dyn DefiLlamaApi>,
        store: Arc<dyn Store>,
        target_chain: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            target_chain: target_chain.into(),
        }
    }

    pub fn target_chain(&self) -> &str {
        &self.target_chain
    }

    // ---------------------------------------------------------
    // Unscoped fetch + persist, one entity type per call
    // ---------------------------------------------------------

    pub async fn save_all_chains(&self, chains: &[ChainResponse]) -> Result<usize> {
        let records: Vec<_> = chains.iter().map(mapper::map_chain).collect();

        match self.store.save_chains(&records).await {
            Ok(_) => {
                info!("Successfully saved {} chains to database", records.len());
                Ok(records.len())
            }
            Err(e) => {
                error!("Error saving chains to database: {}", e);
                Err(e)
            }
        }
    }

    pub async fn save_all_protocols(&self, protocols: &[ProtocolResponse]) -> Result<usize> {
        let records: Vec<_> = protocols.iter().map(mapper::map_protocol).collect();

        match self.store.save_protocols(&records).await {
            Ok(_) => {
                info!("Successfully saved {} protocols to database", records.len());
                Ok(records.len())
            }
            Err(e) => {
                error!("Error saving protocols to database: {}", e);
                Err(e)
            }
        }
    }

    pub async fn save_stable_coins(&self, stable_coins: &[StableCoinResponse]) -> Result<usize> {
        let records: Vec<_> = stable_coins.iter().map(mapper::map_stable_coin).collect();

        match self.store.save_stable_coins(&records).await {
            Ok(_) => {
                info!("Successfully saved {} stable coins to database", records.len());
                Ok(records.len())
            }
            Err(e) => {
                error!("Error saving stable coins to database: {}", e);
                Err(e)
            }
        }
    }

    pub async fn save_yield_pools(&self, pools: &[YieldPoolResponse]) -> Result<usize> {
        let records: Vec<_> = pools.iter().map(mapper::map_yield_pool).collect();

        match self.store.save_yield_pools(&records).await {
            Ok(_) => {
                info!("Successfully saved {} yield pools to database", records.len());
                Ok(records.len())
            }
            Err(e) => {
                error!("Error saving yield pools to database: {}", e);
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------
    // DEX overview + protocols, one transaction
    // ---------------------------------------------------------

    /// Fetches the DEX overview for `chain_name` and stores it with its
    /// protocols atomically. A fetch failure is returned; anything failing
    /// after that rolls the transaction back and is reported, not raised.
    pub async fn save_dex_info(&self, chain_name: &str) -> Result<DexStatus> {
        let overview = self.api.fetch_dex_overview(chain_name).await?;
        let owner = overview.chain.clone().unwrap_or_else(|| chain_name.to_string());

        match self.persist_dex(&overview, &owner).await {
            Ok(status) => Ok(status),
            Err(e) => {
                error!("[save_dex_info] DexInfo, DexProtocol DB insert failed: {}", e);
                Ok(DexStatus::RolledBack {
                    error: e.to_string(),
                })
            }
        }
    }

    async fn persist_dex(&self, overview: &DexInfoResponse, owner: &str) -> Result<DexStatus> {
        let chain = self
            .store
            .find_chain_by_name(owner)
            .await?
            .ok_or_else(|| IndexerError::ChainNotFound(owner.to_string()))?;

        let mut tx = self.store.begin().await?;

        match write_dex(tx.as_mut(), overview, &chain.name).await {
            Ok(status) => {
                tx.commit().await?;
                debug!("[save_dex_info] DB transaction committed");
                Ok(status)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("[save_dex_info] Rollback failed: {}", rollback_err);
                }
                debug!("[save_dex_info] DB transaction rolled back");
                Err(e)
            }
        }
    }

    // ---------------------------------------------------------
    // Scheduled run
    // ---------------------------------------------------------

    /// Refreshes every entity type for the target chain, strictly in order.
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        let target = self.target_chain.as_str();
        info!("Starting DefiLlama ingestion for {}", target);

        // 1. Chain
        let chains = self.api.fetch_chains().await?;
        let Some(chain) = chains.into_iter().find(|c| c.name == target) else {
            error!("Chain {} missing from /v2/chains response, aborting run", target);
            return Err(IndexerError::ChainNotFound(target.to_string()));
        };
        let chains_saved = self.save_all_chains(std::slice::from_ref(&chain)).await?;

        // 2. Protocols
        let protocols: Vec<_> = self
            .api
            .fetch_protocols()
            .await?
            .into_iter()
            .filter(|p| p.chains.iter().any(|c| c == target))
            .collect();
        let protocols_saved = self.save_all_protocols(&protocols).await?;

        // 3. Stable coins
        let (stable_coins, unkeyed): (Vec<_>, Vec<_>) = self
            .api
            .fetch_stable_coins()
            .await?
            .into_iter()
            .filter(|s| s.chains.iter().any(|c| c == target))
            .partition(|s| s.gecko_id.is_some());
        if !unkeyed.is_empty() {
            warn!("Skipping {} stable coins without a geckoId", unkeyed.len());
        }
        let stable_coins_saved = self.save_stable_coins(&stable_coins).await?;

        // 4. Yield pools
        let pools: Vec<_> = self
            .api
            .fetch_yield_pools()
            .await?
            .into_iter()
            .filter(|p| p.chain == target)
            .collect();
        let yield_pools_saved = self.save_yield_pools(&pools).await?;

        // 5. DEX info + protocols
        let dex = self.save_dex_info(&chain.name).await?;

        let report = RunReport {
            chain: chain.name,
            started_at,
            finished_at: Utc::now(),
            chains_saved,
            protocols_saved,
            stable_coins_saved,
            stable_coins_skipped: unkeyed.len(),
            yield_pools_saved,
            dex,
        };

        info!(
            "Ingestion for {} finished: {} protocols, {} stable coins, {} yield pools",
            report.chain,
            report.protocols_saved,
            report.stable_coins_saved,
            report.yield_pools_saved
        );

        Ok(report)
    }
}

async fn write_dex(
    tx: &mut dyn StoreTransaction,
    overview: &DexInfoResponse,
    chain_name: &str,
) -> Result<DexStatus> {
    let info = mapper::map_dex_info(overview, chain_name);
    let dex_info_id = tx.save_or_update_dex_info(&info).await?;

    let protocols = mapper::map_dex_protocols(&overview.protocols, dex_info_id);
    tx.save_dex_protocols(&protocols).await?;
    debug!("Successfully saved {} dex protocols to database", protocols.len());

    Ok(DexStatus::Saved {
        dex_info_id,
        protocols: protocols.len(),
    })
}

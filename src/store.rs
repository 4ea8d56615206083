use crate::error::Result;
use crate::models::{
    ChainRecord, DexInfoRecord, DexProtocolRecord, ProtocolRecord, StableCoinRecord,
    YieldPoolRecord, queries,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// Persistence operations the ingester needs. Every `save_*` is an
/// idempotent upsert; counts are rows written.
#[async_trait]
pub trait Store: Send + Sync {
    async fn save_chains(&self, chains: &[ChainRecord]) -> Result<u64>;

    async fn save_protocols(&self, protocols: &[ProtocolRecord]) -> Result<u64>;

    async fn save_stable_coins(&self, stable_coins: &[StableCoinRecord]) -> Result<u64>;

    async fn save_yield_pools(&self, pools: &[YieldPoolRecord]) -> Result<u64>;

    async fn find_chain_by_name(&self, name: &str) -> Result<Option<ChainRecord>>;

    /// Opens a transaction for writes that must land together.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Writes scoped to one open transaction. Dropping it without `commit`
/// rolls back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Upserts the chain's DEX overview and returns its row id.
    async fn save_or_update_dex_info(&mut self, info: &DexInfoRecord) -> Result<i64>;

    async fn save_dex_protocols(&mut self, protocols: &[DexProtocolRecord]) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn save_chains(&self, chains: &[ChainRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let affected = queries::upsert_chains(&mut tx, chains).await?;
        tx.commit().await?;
        Ok(affected)
    }

    async fn save_protocols(&self, protocols: &[ProtocolRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let affected = queries::upsert_protocols(&mut tx, protocols).await?;
        tx.commit().await?;
        Ok(affected)
    }

    async fn save_stable_coins(&self, stable_coins: &[StableCoinRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let affected = queries::upsert_stable_coins(&mut tx, stable_coins).await?;
        tx.commit().await?;
        Ok(affected)
    }

    async fn save_yield_pools(&self, pools: &[YieldPoolRecord]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let affected = queries::upsert_yield_pools(&mut tx, pools).await?;
        tx.commit().await?;
        Ok(affected)
    }

    async fn find_chain_by_name(&self, name: &str) -> Result<Option<ChainRecord>> {
        let mut conn = self.pool.acquire().await?;
        queries::find_chain_by_name(&mut conn, name).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        debug!("DB transaction opened");
        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn save_or_update_dex_info(&mut self, info: &DexInfoRecord) -> Result<i64> {
        queries::upsert_dex_info(&mut self.tx, info).await
    }

    async fn save_dex_protocols(&mut self, protocols: &[DexProtocolRecord]) -> Result<u64> {
        queries::upsert_dex_protocols(&mut self.tx, protocols).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        debug!("DB transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        debug!("DB transaction rolled back");
        Ok(())
    }
}

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::prelude::FromRow;

// ==========================================
// DATABASE MODELS (Postgres)
// ==========================================

/// Row of the 'chains' table, keyed by name.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ChainRecord {
    pub name: String,
    pub gecko_id: Option<String>,
    pub tvl: Option<Decimal>,
    pub token_symbol: Option<String>,
    pub cmc_id: Option<String>,
    pub chain_id: Option<i64>,
}

/// Row of the 'protocols' table, keyed by the upstream protocol id.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolRecord {
    pub protocol_id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub category: Option<String>,
    pub chains: Vec<String>,
    pub tvl: Option<Decimal>,
    pub chain_tvls: Value,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
}

/// Row of the 'stable_coins' table, keyed by gecko id.
#[derive(Debug, Clone, PartialEq)]
pub struct StableCoinRecord {
    pub gecko_id: Option<String>,
    pub name: String,
    pub symbol: String,
    pub peg_type: Option<String>,
    pub price_source: Option<String>,
    pub peg_mechanism: Option<String>,
    pub circulating_pegged_usd: Option<Decimal>,
    pub circulating_prev_day_pegged_usd: Option<Decimal>,
    pub circulating_prev_week_pegged_usd: Option<Decimal>,
    pub circulating_prev_month_pegged_usd: Option<Decimal>,
    pub chain_circulating: Value,
    pub chains: Vec<String>,
    pub price: Option<f64>,
}

/// Row of the 'yield_pools' table, keyed by pool id.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldPoolRecord {
    pub pool: String,
    pub chain: String,
    pub project: String,
    pub symbol: String,
    pub tvl_usd: Option<Decimal>,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub apy: Option<f64>,
    pub reward_tokens: Option<Vec<String>>,
    pub apy_pct_1d: Option<f64>,
    pub apy_pct_7d: Option<f64>,
    pub apy_pct_30d: Option<f64>,
    pub stablecoin: bool,
    pub il_risk: Option<String>,
    pub exposure: Option<String>,
    pub predictions: Value,
    pub pool_meta: Option<String>,
    pub mu: Option<f64>,
    pub sigma: Option<f64>,
    pub count: Option<i64>,
    pub outlier: bool,
    pub underlying_tokens: Option<Vec<String>>,
    pub il_7d: Option<f64>,
    pub apy_base_7d: Option<f64>,
    pub apy_mean_30d: Option<f64>,
    pub volume_usd_1d: Option<Decimal>,
    pub volume_usd_7d: Option<Decimal>,
    pub apy_base_inception: Option<f64>,
}

/// Volume totals in USD, stored as NUMERIC.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeTotals {
    pub total_24h: Option<Decimal>,
    pub total_48h_to_24h: Option<Decimal>,
    pub total_7d: Option<Decimal>,
    pub total_14d_to_7d: Option<Decimal>,
    pub total_60d_to_30d: Option<Decimal>,
    pub total_30d: Option<Decimal>,
    pub total_1y: Option<Decimal>,
    pub total_all_time: Option<Decimal>,
    pub total_7_days_ago: Option<Decimal>,
    pub total_30_days_ago: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeChanges {
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
    pub change_1m: Option<f64>,
    pub change_7d_over_7d: Option<f64>,
    pub change_30d_over_30d: Option<f64>,
}

/// Row of the 'dex_info' table. One row per chain; the surrogate id is
/// assigned by the database on first insert.
#[derive(Debug, Clone, PartialEq)]
pub struct DexInfoRecord {
    pub chain_name: String,
    pub all_chains: Vec<String>,
    pub volumes: VolumeTotals,
    pub changes: VolumeChanges,
    pub breakdown_24h: Value,
    pub breakdown_30d: Value,
}

/// Row of the 'dex_protocols' table, keyed by defillama id.
#[derive(Debug, Clone, PartialEq)]
pub struct DexProtocolRecord {
    pub defillama_id: String,
    pub dex_info_id: i64,
    pub name: String,
    pub display_name: Option<String>,
    pub module: Option<String>,
    pub category: Option<String>,
    pub logo: Option<String>,
    pub chains: Vec<String>,
    pub protocol_type: Option<String>,
    pub methodology_url: Option<String>,
    pub methodology: Value,
    pub parent_protocol: Option<String>,
    pub slug: Option<String>,
    pub linked_protocols: Option<Vec<String>>,
    pub upstream_id: Option<String>,
    pub volumes: VolumeTotals,
    pub changes: VolumeChanges,
    pub average_1y: Option<Decimal>,
    pub monthly_average_1y: Option<Decimal>,
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ==========================================
// DefiLlama API response shapes
// ==========================================

/// Entry of `GET /v2/chains`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainResponse {
    pub name: String,
    pub gecko_id: Option<String>,
    pub tvl: Option<f64>,
    #[serde(rename = "tokenSymbol")]
    pub token_symbol: Option<String>,
    #[serde(rename = "cmcId")]
    pub cmc_id: Option<String>,
    #[serde(rename = "chainId")]
    pub chain_id: Option<i64>,
}

/// Entry of `GET /protocols`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtocolResponse {
    pub id: String,
    pub name: String,
    pub symbol: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    pub tvl: Option<f64>,
    #[serde(rename = "chainTvls", default)]
    pub chain_tvls: Value,
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
}

/// Body of `GET stablecoins.llama.fi/stablecoins`.
#[derive(Debug, Deserialize)]
pub struct StableCoinsEnvelope {
    #[serde(rename = "peggedAssets", default)]
    pub pegged_assets: Vec<StableCoinResponse>,
}

/// Circulating supply keyed by peg currency; only the USD figure is kept.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PeggedAmounts {
    #[serde(rename = "peggedUSD")]
    pub pegged_usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StableCoinResponse {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "geckoId")]
    pub gecko_id: Option<String>,
    #[serde(rename = "pegType")]
    pub peg_type: Option<String>,
    #[serde(rename = "priceSource")]
    pub price_source: Option<String>,
    #[serde(rename = "pegMechanism")]
    pub peg_mechanism: Option<String>,
    #[serde(default)]
    pub circulating: PeggedAmounts,
    #[serde(rename = "circulatingPrevDay", default)]
    pub circulating_prev_day: PeggedAmounts,
    #[serde(rename = "circulatingPrevWeek", default)]
    pub circulating_prev_week: PeggedAmounts,
    #[serde(rename = "circulatingPrevMonth", default)]
    pub circulating_prev_month: PeggedAmounts,
    #[serde(rename = "chainCirculating", default)]
    pub chain_circulating: Value,
    #[serde(default)]
    pub chains: Vec<String>,
    pub price: Option<f64>,
}

/// Body of `GET yields.llama.fi/pools`.
#[derive(Debug, Deserialize)]
pub struct YieldPoolsEnvelope {
    #[serde(default)]
    pub data: Vec<YieldPoolResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPoolResponse {
    pub pool: String,
    pub chain: String,
    pub project: String,
    pub symbol: String,
    pub tvl_usd: Option<f64>,
    pub apy_base: Option<f64>,
    pub apy_reward: Option<f64>,
    pub apy: Option<f64>,
    pub reward_tokens: Option<Vec<String>>,
    #[serde(rename = "apyPct1D")]
    pub apy_pct_1d: Option<f64>,
    #[serde(rename = "apyPct7D")]
    pub apy_pct_7d: Option<f64>,
    #[serde(rename = "apyPct30D")]
    pub apy_pct_30d: Option<f64>,
    #[serde(default)]
    pub stablecoin: bool,
    pub il_risk: Option<String>,
    pub exposure: Option<String>,
    #[serde(default)]
    pub predictions: Value,
    pub pool_meta: Option<String>,
    pub mu: Option<f64>,
    pub sigma: Option<f64>,
    pub count: Option<i64>,
    #[serde(default)]
    pub outlier: bool,
    pub underlying_tokens: Option<Vec<String>>,
    pub il7d: Option<f64>,
    pub apy_base7d: Option<f64>,
    pub apy_mean30d: Option<f64>,
    pub volume_usd1d: Option<f64>,
    pub volume_usd7d: Option<f64>,
    pub apy_base_inception: Option<f64>,
}

/// Volume totals shared by the DEX overview and each of its protocols.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VolumeWindows {
    #[serde(rename = "total24h")]
    pub total_24h: Option<f64>,
    #[serde(rename = "total48hto24h")]
    pub total_48h_to_24h: Option<f64>,
    #[serde(rename = "total7d")]
    pub total_7d: Option<f64>,
    #[serde(rename = "total14dto7d")]
    pub total_14d_to_7d: Option<f64>,
    #[serde(rename = "total60dto30d")]
    pub total_60d_to_30d: Option<f64>,
    #[serde(rename = "total30d")]
    pub total_30d: Option<f64>,
    #[serde(rename = "total1y")]
    pub total_1y: Option<f64>,
    #[serde(rename = "totalAllTime")]
    pub total_all_time: Option<f64>,
    #[serde(rename = "total7DaysAgo")]
    pub total_7_days_ago: Option<f64>,
    #[serde(rename = "total30DaysAgo")]
    pub total_30_days_ago: Option<f64>,
}

/// Percentage changes shared by the DEX overview and each of its protocols.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangeWindows {
    pub change_1d: Option<f64>,
    pub change_7d: Option<f64>,
    pub change_1m: Option<f64>,
    #[serde(rename = "change_7dover7d")]
    pub change_7d_over_7d: Option<f64>,
    #[serde(rename = "change_30dover30d")]
    pub change_30d_over_30d: Option<f64>,
}

/// Body of `GET /overview/dexs/{chain}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DexInfoResponse {
    pub chain: Option<String>,
    #[serde(rename = "allChains", default)]
    pub all_chains: Vec<String>,
    #[serde(flatten)]
    pub volumes: VolumeWindows,
    #[serde(flatten)]
    pub changes: ChangeWindows,
    #[serde(rename = "breakdown24h", default)]
    pub breakdown_24h: Value,
    #[serde(rename = "breakdown30d", default)]
    pub breakdown_30d: Value,
    #[serde(default)]
    pub protocols: Vec<DexProtocolResponse>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DexProtocolResponse {
    pub defillama_id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub module: Option<String>,
    pub category: Option<String>,
    pub logo: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    pub protocol_type: Option<String>,
    #[serde(rename = "methodologyURL")]
    pub methodology_url: Option<String>,
    #[serde(default)]
    pub methodology: Value,
    pub parent_protocol: Option<String>,
    pub slug: Option<String>,
    pub linked_protocols: Option<Vec<String>>,
    pub id: Option<String>,
    #[serde(flatten)]
    pub volumes: VolumeWindows,
    #[serde(flatten)]
    pub changes: ChangeWindows,
    #[serde(rename = "average1y")]
    pub average_1y: Option<f64>,
    #[serde(rename = "monthlyAverage1y")]
    pub monthly_average_1y: Option<f64>,
}

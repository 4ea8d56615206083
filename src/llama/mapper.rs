use crate::models::{
    ChainRecord, ChainResponse, ChangeWindows, DexInfoRecord, DexInfoResponse, DexProtocolRecord,
    DexProtocolResponse, ProtocolRecord, ProtocolResponse, StableCoinRecord, StableCoinResponse,
    VolumeChanges, VolumeTotals, VolumeWindows, YieldPoolRecord, YieldPoolResponse,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// USD figures arrive as JSON floats and are stored as NUMERIC.
/// NaN and infinities have no decimal form and map to `None`.
fn usd(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

fn volume_totals(volumes: &VolumeWindows) -> VolumeTotals {
    VolumeTotals {
        total_24h: usd(volumes.total_24h),
        total_48h_to_24h: usd(volumes.total_48h_to_24h),
        total_7d: usd(volumes.total_7d),
        total_14d_to_7d: usd(volumes.total_14d_to_7d),
        total_60d_to_30d: usd(volumes.total_60d_to_30d),
        total_30d: usd(volumes.total_30d),
        total_1y: usd(volumes.total_1y),
        total_all_time: usd(volumes.total_all_time),
        total_7_days_ago: usd(volumes.total_7_days_ago),
        total_30_days_ago: usd(volumes.total_30_days_ago),
    }
}

fn volume_changes(changes: &ChangeWindows) -> VolumeChanges {
    VolumeChanges {
        change_1d: changes.change_1d,
        change_7d: changes.change_7d,
        change_1m: changes.change_1m,
        change_7d_over_7d: changes.change_7d_over_7d,
        change_30d_over_30d: changes.change_30d_over_30d,
    }
}

pub fn map_chain(chain: &ChainResponse) -> ChainRecord {
    ChainRecord {
        name: chain.name.clone(),
        gecko_id: chain.gecko_id.clone(),
        tvl: usd(chain.tvl),
        token_symbol: chain.token_symbol.clone(),
        cmc_id: chain.cmc_id.clone(),
        chain_id: chain.chain_id,
    }
}

/// The upstream `id` becomes `protocol_id`.
pub fn map_protocol(protocol: &ProtocolResponse) -> ProtocolRecord {
    ProtocolRecord {
        protocol_id: protocol.id.clone(),
        name: protocol.name.clone(),
        symbol: protocol.symbol.clone(),
        category: protocol.category.clone(),
        chains: protocol.chains.clone(),
        tvl: usd(protocol.tvl),
        chain_tvls: protocol.chain_tvls.clone(),
        change_1d: protocol.change_1d,
        change_7d: protocol.change_7d,
    }
}

/// Flattens the four nested circulating objects into their `peggedUSD` figure.
pub fn map_stable_coin(coin: &StableCoinResponse) -> StableCoinRecord {
    StableCoinRecord {
        gecko_id: coin.gecko_id.clone(),
        name: coin.name.clone(),
        symbol: coin.symbol.clone(),
        peg_type: coin.peg_type.clone(),
        price_source: coin.price_source.clone(),
        peg_mechanism: coin.peg_mechanism.clone(),
        circulating_pegged_usd: usd(coin.circulating.pegged_usd),
        circulating_prev_day_pegged_usd: usd(coin.circulating_prev_day.pegged_usd),
        circulating_prev_week_pegged_usd: usd(coin.circulating_prev_week.pegged_usd),
        circulating_prev_month_pegged_usd: usd(coin.circulating_prev_month.pegged_usd),
        chain_circulating: coin.chain_circulating.clone(),
        chains: coin.chains.clone(),
        price: coin.price,
    }
}

pub fn map_yield_pool(pool: &YieldPoolResponse) -> YieldPoolRecord {
    YieldPoolRecord {
        pool: pool.pool.clone(),
        chain: pool.chain.clone(),
        project: pool.project.clone(),
        symbol: pool.symbol.clone(),
        tvl_usd: usd(pool.tvl_usd),
        apy_base: pool.apy_base,
        apy_reward: pool.apy_reward,
        apy: pool.apy,
        reward_tokens: pool.reward_tokens.clone(),
        apy_pct_1d: pool.apy_pct_1d,
        apy_pct_7d: pool.apy_pct_7d,
        apy_pct_30d: pool.apy_pct_30d,
        stablecoin: pool.stablecoin,
        il_risk: pool.il_risk.clone(),
        exposure: pool.exposure.clone(),
        predictions: pool.predictions.clone(),
        pool_meta: pool.pool_meta.clone(),
        mu: pool.mu,
        sigma: pool.sigma,
        count: pool.count,
        outlier: pool.outlier,
        underlying_tokens: pool.underlying_tokens.clone(),
        il_7d: pool.il7d,
        apy_base_7d: pool.apy_base7d,
        apy_mean_30d: pool.apy_mean30d,
        volume_usd_1d: usd(pool.volume_usd1d),
        volume_usd_7d: usd(pool.volume_usd7d),
        apy_base_inception: pool.apy_base_inception,
    }
}

/// Maps the overview onto the row owned by `chain_name`.
pub fn map_dex_info(info: &DexInfoResponse, chain_name: &str) -> DexInfoRecord {
    DexInfoRecord {
        chain_name: chain_name.to_string(),
        all_chains: info.all_chains.clone(),
        volumes: volume_totals(&info.volumes),
        changes: volume_changes(&info.changes),
        breakdown_24h: info.breakdown_24h.clone(),
        breakdown_30d: info.breakdown_30d.clone(),
    }
}

pub fn map_dex_protocol(protocol: &DexProtocolResponse, dex_info_id: i64) -> DexProtocolRecord {
    DexProtocolRecord {
        defillama_id: protocol.defillama_id.clone(),
        dex_info_id,
        name: protocol.name.clone(),
        display_name: protocol.display_name.clone(),
        module: protocol.module.clone(),
        category: protocol.category.clone(),
        logo: protocol.logo.clone(),
        chains: protocol.chains.clone(),
        protocol_type: protocol.protocol_type.clone(),
        methodology_url: protocol.methodology_url.clone(),
        methodology: protocol.methodology.clone(),
        parent_protocol: protocol.parent_protocol.clone(),
        slug: protocol.slug.clone(),
        linked_protocols: protocol.linked_protocols.clone(),
        upstream_id: protocol.id.clone(),
        volumes: volume_totals(&protocol.volumes),
        changes: volume_changes(&protocol.changes),
        average_1y: usd(protocol.average_1y),
        monthly_average_1y: usd(protocol.monthly_average_1y),
    }
}

/// Every DEX protocol of one overview points at the same owning row.
pub fn map_dex_protocols(
    protocols: &[DexProtocolResponse],
    dex_info_id: i64,
) -> Vec<DexProtocolRecord> {
    protocols
        .iter()
        .map(|protocol| map_dex_protocol(protocol, dex_info_id))
        .collect()
}

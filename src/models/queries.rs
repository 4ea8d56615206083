use super::{
    ChainRecord, DexInfoRecord, DexProtocolRecord, ProtocolRecord, StableCoinRecord,
    VolumeChanges, VolumeTotals, YieldPoolRecord,
};
use crate::error::Result;
use serde_json::Value;
use sqlx::PgConnection;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

// Every function takes a bare connection so callers decide the transaction
// scope: a pool-owned transaction per batch, or one shared across batches.

/// Absent JSON objects are stored as SQL `NULL`, never as JSON `null`.
fn json_or_null(value: &Value) -> Option<&Value> {
    (!value.is_null()).then_some(value)
}

fn bind_volumes<'q>(query: PgQuery<'q>, volumes: &VolumeTotals) -> PgQuery<'q> {
    query
        .bind(volumes.total_24h)
        .bind(volumes.total_48h_to_24h)
        .bind(volumes.total_7d)
        .bind(volumes.total_14d_to_7d)
        .bind(volumes.total_60d_to_30d)
        .bind(volumes.total_30d)
        .bind(volumes.total_1y)
        .bind(volumes.total_all_time)
        .bind(volumes.total_7_days_ago)
        .bind(volumes.total_30_days_ago)
}

fn bind_changes<'q>(query: PgQuery<'q>, changes: &VolumeChanges) -> PgQuery<'q> {
    query
        .bind(changes.change_1d)
        .bind(changes.change_7d)
        .bind(changes.change_1m)
        .bind(changes.change_7d_over_7d)
        .bind(changes.change_30d_over_30d)
}

// ==========================================
// CHAIN OPERATIONS
// ==========================================

/// Insert or update chains by name
pub async fn upsert_chains(conn: &mut PgConnection, chains: &[ChainRecord]) -> Result<u64> {
    let mut affected = 0;

    for chain in chains {
        let result = sqlx::query(
            r#"
            INSERT INTO chains (name, gecko_id, tvl, token_symbol, cmc_id, chain_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name)
            DO UPDATE SET
                gecko_id = EXCLUDED.gecko_id,
                tvl = EXCLUDED.tvl,
                token_symbol = EXCLUDED.token_symbol,
                cmc_id = EXCLUDED.cmc_id,
                chain_id = EXCLUDED.chain_id,
                updated_at = NOW()
            "#,
        )
        .bind(&chain.name)
        .bind(&chain.gecko_id)
        .bind(chain.tvl)
        .bind(&chain.token_symbol)
        .bind(&chain.cmc_id)
        .bind(chain.chain_id)
        .execute(&mut *conn)
        .await?;

        affected += result.rows_affected();
    }

    Ok(affected)
}

/// Get chain by its natural key
pub async fn find_chain_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<ChainRecord>> {
    let chain = sqlx::query_as::<_, ChainRecord>(
        r#"
        SELECT name, gecko_id, tvl, token_symbol, cmc_id, chain_id
        FROM chains
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(chain)
}

// ==========================================
// PROTOCOL OPERATIONS
// ==========================================

pub async fn upsert_protocols(
    conn: &mut PgConnection,
    protocols: &[ProtocolRecord],
) -> Result<u64> {
    let mut affected = 0;

    for protocol in protocols {
        let result = sqlx::query(
            r#"
            INSERT INTO protocols (
                protocol_id, name, symbol, category, chains, tvl, chain_tvls,
                change_1d, change_7d
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (protocol_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                symbol = EXCLUDED.symbol,
                category = EXCLUDED.category,
                chains = EXCLUDED.chains,
                tvl = EXCLUDED.tvl,
                chain_tvls = EXCLUDED.chain_tvls,
                change_1d = EXCLUDED.change_1d,
                change_7d = EXCLUDED.change_7d,
                updated_at = NOW()
            "#,
        )
        .bind(&protocol.protocol_id)
        .bind(&protocol.name)
        .bind(&protocol.symbol)
        .bind(&protocol.category)
        .bind(&protocol.chains)
        .bind(protocol.tvl)
        .bind(json_or_null(&protocol.chain_tvls))
        .bind(protocol.change_1d)
        .bind(protocol.change_7d)
        .execute(&mut *conn)
        .await?;

        affected += result.rows_affected();
    }

    Ok(affected)
}

// ==========================================
// STABLECOIN OPERATIONS
// ==========================================

pub async fn upsert_stable_coins(
    conn: &mut PgConnection,
    stable_coins: &[StableCoinRecord],
) -> Result<u64> {
    let mut affected = 0;

    for coin in stable_coins {
        let result = sqlx::query(
            r#"
            INSERT INTO stable_coins (
                gecko_id, name, symbol, peg_type, price_source, peg_mechanism,
                circulating_pegged_usd, circulating_prev_day_pegged_usd,
                circulating_prev_week_pegged_usd, circulating_prev_month_pegged_usd,
                chain_circulating, chains, price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (gecko_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                symbol = EXCLUDED.symbol,
                peg_type = EXCLUDED.peg_type,
                price_source = EXCLUDED.price_source,
                peg_mechanism = EXCLUDED.peg_mechanism,
                circulating_pegged_usd = EXCLUDED.circulating_pegged_usd,
                circulating_prev_day_pegged_usd = EXCLUDED.circulating_prev_day_pegged_usd,
                circulating_prev_week_pegged_usd = EXCLUDED.circulating_prev_week_pegged_usd,
                circulating_prev_month_pegged_usd = EXCLUDED.circulating_prev_month_pegged_usd,
                chain_circulating = EXCLUDED.chain_circulating,
                chains = EXCLUDED.chains,
                price = EXCLUDED.price,
                updated_at = NOW()
            "#,
        )
        .bind(&coin.gecko_id)
        .bind(&coin.name)
        .bind(&coin.symbol)
        .bind(&coin.peg_type)
        .bind(&coin.price_source)
        .bind(&coin.peg_mechanism)
        .bind(coin.circulating_pegged_usd)
        .bind(coin.circulating_prev_day_pegged_usd)
        .bind(coin.circulating_prev_week_pegged_usd)
        .bind(coin.circulating_prev_month_pegged_usd)
        .bind(json_or_null(&coin.chain_circulating))
        .bind(&coin.chains)
        .bind(coin.price)
        .execute(&mut *conn)
        .await?;

        affected += result.rows_affected();
    }

    Ok(affected)
}

// ==========================================
// YIELD POOL OPERATIONS
// ==========================================

pub async fn upsert_yield_pools(
    conn: &mut PgConnection,
    pools: &[YieldPoolRecord],
) -> Result<u64> {
    let mut affected = 0;

    for pool in pools {
        let result = sqlx::query(
            r#"
            INSERT INTO yield_pools (
                pool, chain, project, symbol, tvl_usd, apy_base, apy_reward, apy,
                reward_tokens, apy_pct_1d, apy_pct_7d, apy_pct_30d, stablecoin,
                il_risk, exposure, predictions, pool_meta, mu, sigma, count, outlier,
                underlying_tokens, il_7d, apy_base_7d, apy_mean_30d, volume_usd_1d,
                volume_usd_7d, apy_base_inception
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28
            )
            ON CONFLICT (pool)
            DO UPDATE SET
                chain = EXCLUDED.chain,
                project = EXCLUDED.project,
                symbol = EXCLUDED.symbol,
                tvl_usd = EXCLUDED.tvl_usd,
                apy_base = EXCLUDED.apy_base,
                apy_reward = EXCLUDED.apy_reward,
                apy = EXCLUDED.apy,
                reward_tokens = EXCLUDED.reward_tokens,
                apy_pct_1d = EXCLUDED.apy_pct_1d,
                apy_pct_7d = EXCLUDED.apy_pct_7d,
                apy_pct_30d = EXCLUDED.apy_pct_30d,
                stablecoin = EXCLUDED.stablecoin,
                il_risk = EXCLUDED.il_risk,
                exposure = EXCLUDED.exposure,
                predictions = EXCLUDED.predictions,
                pool_meta = EXCLUDED.pool_meta,
                mu = EXCLUDED.mu,
                sigma = EXCLUDED.sigma,
                count = EXCLUDED.count,
                outlier = EXCLUDED.outlier,
                underlying_tokens = EXCLUDED.underlying_tokens,
                il_7d = EXCLUDED.il_7d,
                apy_base_7d = EXCLUDED.apy_base_7d,
                apy_mean_30d = EXCLUDED.apy_mean_30d,
                volume_usd_1d = EXCLUDED.volume_usd_1d,
                volume_usd_7d = EXCLUDED.volume_usd_7d,
                apy_base_inception = EXCLUDED.apy_base_inception,
                updated_at = NOW()
            "#,
        )
        .bind(&pool.pool)
        .bind(&pool.chain)
        .bind(&pool.project)
        .bind(&pool.symbol)
        .bind(pool.tvl_usd)
        .bind(pool.apy_base)
        .bind(pool.apy_reward)
        .bind(pool.apy)
        .bind(&pool.reward_tokens)
        .bind(pool.apy_pct_1d)
        .bind(pool.apy_pct_7d)
        .bind(pool.apy_pct_30d)
        .bind(pool.stablecoin)
        .bind(&pool.il_risk)
        .bind(&pool.exposure)
        .bind(json_or_null(&pool.predictions))
        .bind(&pool.pool_meta)
        .bind(pool.mu)
        .bind(pool.sigma)
        .bind(pool.count)
        .bind(pool.outlier)
        .bind(&pool.underlying_tokens)
        .bind(pool.il_7d)
        .bind(pool.apy_base_7d)
        .bind(pool.apy_mean_30d)
        .bind(pool.volume_usd_1d)
        .bind(pool.volume_usd_7d)
        .bind(pool.apy_base_inception)
        .execute(&mut *conn)
        .await?;

        affected += result.rows_affected();
    }

    Ok(affected)
}

// ==========================================
// DEX OPERATIONS
// ==========================================

/// Insert or update the per-chain DEX overview and return its id
pub async fn upsert_dex_info(conn: &mut PgConnection, info: &DexInfoRecord) -> Result<i64> {
    let query = sqlx::query(
        r#"
        INSERT INTO dex_info (
            chain_name, all_chains,
            total_24h, total_48h_to_24h, total_7d, total_14d_to_7d, total_60d_to_30d,
            total_30d, total_1y, total_all_time, total_7_days_ago, total_30_days_ago,
            change_1d, change_7d, change_1m, change_7d_over_7d, change_30d_over_30d,
            breakdown_24h, breakdown_30d
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
            $18, $19
        )
        ON CONFLICT (chain_name)
        DO UPDATE SET
            all_chains = EXCLUDED.all_chains,
            total_24h = EXCLUDED.total_24h,
            total_48h_to_24h = EXCLUDED.total_48h_to_24h,
            total_7d = EXCLUDED.total_7d,
            total_14d_to_7d = EXCLUDED.total_14d_to_7d,
            total_60d_to_30d = EXCLUDED.total_60d_to_30d,
            total_30d = EXCLUDED.total_30d,
            total_1y = EXCLUDED.total_1y,
            total_all_time = EXCLUDED.total_all_time,
            total_7_days_ago = EXCLUDED.total_7_days_ago,
            total_30_days_ago = EXCLUDED.total_30_days_ago,
            change_1d = EXCLUDED.change_1d,
            change_7d = EXCLUDED.change_7d,
            change_1m = EXCLUDED.change_1m,
            change_7d_over_7d = EXCLUDED.change_7d_over_7d,
            change_30d_over_30d = EXCLUDED.change_30d_over_30d,
            breakdown_24h = EXCLUDED.breakdown_24h,
            breakdown_30d = EXCLUDED.breakdown_30d,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(&info.chain_name)
    .bind(&info.all_chains);

    let query = bind_volumes(query, &info.volumes);
    let query = bind_changes(query, &info.changes);

    let row = query
        .bind(json_or_null(&info.breakdown_24h))
        .bind(json_or_null(&info.breakdown_30d))
        .fetch_one(&mut *conn)
        .await?;

    let id: i64 = sqlx::Row::try_get(&row, "id")?;
    Ok(id)
}

pub async fn upsert_dex_protocols(
    conn: &mut PgConnection,
    protocols: &[DexProtocolRecord],
) -> Result<u64> {
    let mut affected = 0;

    for protocol in protocols {
        let query = sqlx::query(
            r#"
            INSERT INTO dex_protocols (
                defillama_id, dex_info_id, name, display_name, module, category, logo,
                chains, protocol_type, methodology_url, methodology, parent_protocol,
                slug, linked_protocols, upstream_id,
                total_24h, total_48h_to_24h, total_7d, total_14d_to_7d, total_60d_to_30d,
                total_30d, total_1y, total_all_time, total_7_days_ago, total_30_days_ago,
                change_1d, change_7d, change_1m, change_7d_over_7d, change_30d_over_30d,
                average_1y, monthly_average_1y
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                $31, $32
            )
            ON CONFLICT (defillama_id)
            DO UPDATE SET
                dex_info_id = EXCLUDED.dex_info_id,
                name = EXCLUDED.name,
                display_name = EXCLUDED.display_name,
                module = EXCLUDED.module,
                category = EXCLUDED.category,
                logo = EXCLUDED.logo,
                chains = EXCLUDED.chains,
                protocol_type = EXCLUDED.protocol_type,
                methodology_url = EXCLUDED.methodology_url,
                methodology = EXCLUDED.methodology,
                parent_protocol = EXCLUDED.parent_protocol,
                slug = EXCLUDED.slug,
                linked_protocols = EXCLUDED.linked_protocols,
                upstream_id = EXCLUDED.upstream_id,
                total_24h = EXCLUDED.total_24h,
                total_48h_to_24h = EXCLUDED.total_48h_to_24h,
                total_7d = EXCLUDED.total_7d,
                total_14d_to_7d = EXCLUDED.total_14d_to_7d,
                total_60d_to_30d = EXCLUDED.total_60d_to_30d,
                total_30d = EXCLUDED.total_30d,
                total_1y = EXCLUDED.total_1y,
                total_all_time = EXCLUDED.total_all_time,
                total_7_days_ago = EXCLUDED.total_7_days_ago,
                total_30_days_ago = EXCLUDED.total_30_days_ago,
                change_1d = EXCLUDED.change_1d,
                change_7d = EXCLUDED.change_7d,
                change_1m = EXCLUDED.change_1m,
                change_7d_over_7d = EXCLUDED.change_7d_over_7d,
                change_30d_over_30d = EXCLUDED.change_30d_over_30d,
                average_1y = EXCLUDED.average_1y,
                monthly_average_1y = EXCLUDED.monthly_average_1y,
                updated_at = NOW()
            "#,
        )
        .bind(&protocol.defillama_id)
        .bind(protocol.dex_info_id)
        .bind(&protocol.name)
        .bind(&protocol.display_name)
        .bind(&protocol.module)
        .bind(&protocol.category)
        .bind(&protocol.logo)
        .bind(&protocol.chains)
        .bind(&protocol.protocol_type)
        .bind(&protocol.methodology_url)
        .bind(json_or_null(&protocol.methodology))
        .bind(&protocol.parent_protocol)
        .bind(&protocol.slug)
        .bind(&protocol.linked_protocols)
        .bind(&protocol.upstream_id);

        let query = bind_volumes(query, &protocol.volumes);
        let query = bind_changes(query, &protocol.changes);

        let result = query
            .bind(protocol.average_1y)
            .bind(protocol.monthly_average_1y)
            .execute(&mut *conn)
            .await?;

        affected += result.rows_affected();
    }

    Ok(affected)
}

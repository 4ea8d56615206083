#![allow(dead_code)]

use async_trait::async_trait;
use indexer::error::{IndexerError, Result};
use indexer::llama::DefiLlamaApi;
use indexer::models::{
    ChainRecord, ChainResponse, DexInfoRecord, DexInfoResponse, DexProtocolRecord,
    ProtocolRecord, ProtocolResponse, StableCoinRecord, StableCoinResponse, YieldPoolRecord,
    YieldPoolResponse,
};
use indexer::store::{Store, StoreTransaction};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

fn store_failure(what: &str) -> IndexerError {
    IndexerError::DbError(sqlx::Error::Protocol(format!("injected failure: {what}")))
}

// ==========================================
// Upstream fixtures
// ==========================================

pub fn chains_fixture() -> Vec<ChainResponse> {
    serde_json::from_value(json!([
        {
            "name": "Ethereum", "gecko_id": "ethereum", "tvl": 60000000000.0,
            "tokenSymbol": "ETH", "cmcId": "1027", "chainId": 1
        },
        {
            "name": "Base", "gecko_id": "base", "tvl": 123,
            "tokenSymbol": "ETH", "cmcId": "1", "chainId": 8453
        },
        {
            "name": "base", "gecko_id": null, "tvl": 1,
            "tokenSymbol": null, "cmcId": null, "chainId": null
        }
    ]))
    .unwrap()
}

pub fn protocols_fixture() -> Vec<ProtocolResponse> {
    serde_json::from_value(json!([
        {
            "id": "aave", "name": "Aave", "symbol": "AAVE", "category": "Lending",
            "chains": ["Ethereum", "Base"], "tvl": 100.0
        },
        {
            "id": "lido", "name": "Lido", "symbol": "LDO", "category": "Liquid Staking",
            "chains": ["Ethereum"], "tvl": 200.0
        },
        {
            "id": "aerodrome", "name": "Aerodrome", "symbol": "AERO", "category": "Dexes",
            "chains": ["Base"], "tvl": 50.0
        }
    ]))
    .unwrap()
}

pub fn stable_coins_fixture() -> Vec<StableCoinResponse> {
    serde_json::from_value(json!([
        {
            "id": "1", "name": "Tether", "symbol": "USDT", "geckoId": "tether",
            "circulating": { "peggedUSD": 10.0 }, "chains": ["Ethereum", "Base"]
        },
        {
            "id": "2", "name": "USD Coin", "symbol": "USDC", "geckoId": "usd-coin",
            "circulating": { "peggedUSD": 20.0 }, "chains": ["Ethereum"]
        },
        {
            "id": "3", "name": "Unlisted Dollar", "symbol": "UDL", "geckoId": null,
            "circulating": { "peggedUSD": 1.0 }, "chains": ["Base"]
        }
    ]))
    .unwrap()
}

pub fn yield_pools_fixture() -> Vec<YieldPoolResponse> {
    serde_json::from_value(json!([
        {
            "pool": "pool-base-1", "chain": "Base", "project": "aave-v3",
            "symbol": "USDC", "tvlUsd": 10.0
        },
        {
            "pool": "pool-eth-1", "chain": "Ethereum", "project": "aave-v3",
            "symbol": "USDC", "tvlUsd": 20.0
        },
        {
            "pool": "pool-base-2", "chain": "Base", "project": "aerodrome-v1",
            "symbol": "WETH-USDC", "tvlUsd": 30.0
        }
    ]))
    .unwrap()
}

pub fn dex_overview_fixture() -> DexInfoResponse {
    serde_json::from_value(json!({
        "chain": "Base",
        "allChains": ["Ethereum", "Base"],
        "total24h": 1000,
        "total7d": 7000,
        "change_1d": 1.5,
        "protocols": [
            { "defillamaId": "1", "name": "uniswap v3", "chains": ["Base"], "total24h": 600 },
            { "defillamaId": "2", "name": "aerodrome", "chains": ["Base"], "total24h": 400 }
        ]
    }))
    .unwrap()
}

// ==========================================
// Fake DefiLlama API
// ==========================================

pub struct FakeApi {
    pub chains: Vec<ChainResponse>,
    pub protocols: Vec<ProtocolResponse>,
    pub stable_coins: Vec<StableCoinResponse>,
    pub yield_pools: Vec<YieldPoolResponse>,
    pub dex_overview: DexInfoResponse,
    pub fail_dex_fetch: bool,
    /// When set, `fetch_chains` waits for a permit before answering.
    pub gate: Option<Arc<Semaphore>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            chains: chains_fixture(),
            protocols: protocols_fixture(),
            stable_coins: stable_coins_fixture(),
            yield_pools: yield_pools_fixture(),
            dex_overview: dex_overview_fixture(),
            fail_dex_fetch: false,
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl DefiLlamaApi for FakeApi {
    async fn fetch_chains(&self) -> Result<Vec<ChainResponse>> {
        self.record("chains");
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        Ok(self.chains.clone())
    }

    async fn fetch_protocols(&self) -> Result<Vec<ProtocolResponse>> {
        self.record("protocols");
        Ok(self.protocols.clone())
    }

    async fn fetch_stable_coins(&self) -> Result<Vec<StableCoinResponse>> {
        self.record("stable_coins");
        Ok(self.stable_coins.clone())
    }

    async fn fetch_yield_pools(&self) -> Result<Vec<YieldPoolResponse>> {
        self.record("yield_pools");
        Ok(self.yield_pools.clone())
    }

    async fn fetch_dex_overview(&self, chain_name: &str) -> Result<DexInfoResponse> {
        self.record(format!("dex_overview:{chain_name}"));
        if self.fail_dex_fetch {
            return Err(IndexerError::UpstreamStatus {
                url: format!("/overview/dexs/{chain_name}"),
                status: reqwest::StatusCode::BAD_GATEWAY,
            });
        }
        Ok(self.dex_overview.clone())
    }
}

// ==========================================
// In-memory store
// ==========================================

#[derive(Default)]
pub struct StoreState {
    pub chains: BTreeMap<String, ChainRecord>,
    pub protocols: BTreeMap<String, ProtocolRecord>,
    pub stable_coins: BTreeMap<String, StableCoinRecord>,
    pub yield_pools: BTreeMap<String, YieldPoolRecord>,
    pub dex_info: BTreeMap<i64, DexInfoRecord>,
    pub dex_protocols: BTreeMap<String, DexProtocolRecord>,
    next_dex_info_id: i64,
    /// Arguments of every `save_*` call, in call order.
    pub saved_batches: Vec<(String, Vec<String>)>,
    pub commits: usize,
    pub rollbacks: usize,
}

impl StoreState {
    pub fn dex_info_id_for(&self, chain_name: &str) -> Option<i64> {
        self.dex_info
            .iter()
            .find(|(_, info)| info.chain_name == chain_name)
            .map(|(id, _)| *id)
    }
}

#[derive(Clone, Default)]
pub struct FakeStore {
    pub state: Arc<Mutex<StoreState>>,
    pub fail_protocols: bool,
    pub fail_dex_protocols: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot<R>(&self, read: impl FnOnce(&StoreState) -> R) -> R {
        read(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn save_chains(&self, chains: &[ChainRecord]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state
            .saved_batches
            .push(("chains".into(), chains.iter().map(|c| c.name.clone()).collect()));
        for chain in chains {
            state.chains.insert(chain.name.clone(), chain.clone());
        }
        Ok(chains.len() as u64)
    }

    async fn save_protocols(&self, protocols: &[ProtocolRecord]) -> Result<u64> {
        if self.fail_protocols {
            return Err(store_failure("protocols"));
        }
        let mut state = self.state.lock().unwrap();
        state.saved_batches.push((
            "protocols".into(),
            protocols.iter().map(|p| p.protocol_id.clone()).collect(),
        ));
        for protocol in protocols {
            state
                .protocols
                .insert(protocol.protocol_id.clone(), protocol.clone());
        }
        Ok(protocols.len() as u64)
    }

    async fn save_stable_coins(&self, stable_coins: &[StableCoinRecord]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.saved_batches.push((
            "stable_coins".into(),
            stable_coins
                .iter()
                .map(|s| s.gecko_id.clone().unwrap_or_default())
                .collect(),
        ));
        for coin in stable_coins {
            let key = coin
                .gecko_id
                .clone()
                .ok_or_else(|| store_failure("null gecko_id"))?;
            state.stable_coins.insert(key, coin.clone());
        }
        Ok(stable_coins.len() as u64)
    }

    async fn save_yield_pools(&self, pools: &[YieldPoolRecord]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state
            .saved_batches
            .push(("yield_pools".into(), pools.iter().map(|p| p.pool.clone()).collect()));
        for pool in pools {
            state.yield_pools.insert(pool.pool.clone(), pool.clone());
        }
        Ok(pools.len() as u64)
    }

    async fn find_chain_by_name(&self, name: &str) -> Result<Option<ChainRecord>> {
        Ok(self.state.lock().unwrap().chains.get(name).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(FakeTransaction {
            store: self.clone(),
            dex_info: Vec::new(),
            dex_protocols: Vec::new(),
        }))
    }
}

/// Buffers writes until commit so a rollback leaves no trace.
pub struct FakeTransaction {
    store: FakeStore,
    dex_info: Vec<(i64, DexInfoRecord)>,
    dex_protocols: Vec<DexProtocolRecord>,
}

#[async_trait]
impl StoreTransaction for FakeTransaction {
    async fn save_or_update_dex_info(&mut self, info: &DexInfoRecord) -> Result<i64> {
        let mut state = self.store.state.lock().unwrap();
        if !state.chains.contains_key(&info.chain_name) {
            return Err(store_failure("dex_info chain foreign key"));
        }
        let id = match state.dex_info_id_for(&info.chain_name) {
            Some(id) => id,
            None => {
                state.next_dex_info_id += 1;
                state.next_dex_info_id
            }
        };
        self.dex_info.push((id, info.clone()));
        Ok(id)
    }

    async fn save_dex_protocols(&mut self, protocols: &[DexProtocolRecord]) -> Result<u64> {
        if self.store.fail_dex_protocols {
            return Err(store_failure("dex_protocols"));
        }
        self.dex_protocols.extend_from_slice(protocols);
        Ok(protocols.len() as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut state = self.store.state.lock().unwrap();
        for (id, info) in self.dex_info {
            state.dex_info.insert(id, info);
        }
        for protocol in self.dex_protocols {
            state
                .dex_protocols
                .insert(protocol.defillama_id.clone(), protocol);
        }
        state.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.store.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}

use crate::config::LlamaEndpoints;
use crate::error::{IndexerError, Result};
use crate::models::{
    ChainResponse, DexInfoResponse, ProtocolResponse, StableCoinResponse, StableCoinsEnvelope,
    YieldPoolResponse, YieldPoolsEnvelope,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Read-only view of the DefiLlama endpoints the ingester consumes.
#[async_trait]
pub trait DefiLlamaApi: Send + Sync {
    async fn fetch_chains(&self) -> Result<Vec<ChainResponse>>;

    async fn fetch_protocols(&self) -> Result<Vec<ProtocolResponse>>;

    async fn fetch_stable_coins(&self) -> Result<Vec<StableCoinResponse>>;

    async fn fetch_yield_pools(&self) -> Result<Vec<YieldPoolResponse>>;

    /// DEX volume overview for one chain, without the heavy chart series.
    async fn fetch_dex_overview(&self, chain_name: &str) -> Result<DexInfoResponse>;
}

pub struct LlamaClient {
    http: reqwest::Client,
    endpoints: LlamaEndpoints,
    max_retries: u32,
}

impl LlamaClient {
    pub fn new(
        endpoints: LlamaEndpoints,
        timeout: Option<Duration>,
        max_retries: u32,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoints,
            max_retries,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!("GET {} (attempt {})", url, attempt);

            let retries_left = attempt <= self.max_retries;

            let mut request = self.http.get(url);
            if !query.is_empty() {
                request = request.query(query);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        return Ok(resp.json::<T>().await?);
                    }

                    if retries_left && is_retryable(status) {
                        warn!(
                            "{} returned {} on attempt {}. Cooling down...",
                            url, status, attempt
                        );
                        sleep(backoff(attempt)).await;
                        continue;
                    }

                    return Err(IndexerError::UpstreamStatus {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(e) if retries_left => {
                    warn!("Network error on attempt {} for {}: {}", attempt, url, e);
                    sleep(backoff(attempt)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Appends `segments` to `base`, percent-encoding each one.
fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| IndexerError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| IndexerError::InvalidUrl(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt) * 2)
}

#[async_trait]
impl DefiLlamaApi for LlamaClient {
    async fn fetch_chains(&self) -> Result<Vec<ChainResponse>> {
        let url = format!("{}/v2/chains", self.endpoints.api);
        self.get_json(&url, &[]).await
    }

    async fn fetch_protocols(&self) -> Result<Vec<ProtocolResponse>> {
        let url = format!("{}/protocols", self.endpoints.api);
        self.get_json(&url, &[]).await
    }

    async fn fetch_stable_coins(&self) -> Result<Vec<StableCoinResponse>> {
        let url = format!("{}/stablecoins", self.endpoints.stablecoins);
        let body: StableCoinsEnvelope = self.get_json(&url, &[]).await?;
        Ok(body.pegged_assets)
    }

    async fn fetch_yield_pools(&self) -> Result<Vec<YieldPoolResponse>> {
        let url = format!("{}/pools", self.endpoints.yields);
        let body: YieldPoolsEnvelope = self.get_json(&url, &[]).await?;
        Ok(body.data)
    }

    async fn fetch_dex_overview(&self, chain_name: &str) -> Result<DexInfoResponse> {
        let url = endpoint_url(&self.endpoints.api, &["overview", "dexs", chain_name])?;
        self.get_json(
            url.as_str(),
            &[
                ("excludeTotalDataChart", "true"),
                ("excludeTotalDataChartBreakdown", "true"),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    fn client_for(server: &MockServer, max_retries: u32) -> LlamaClient {
        let endpoints = LlamaEndpoints {
            api: server.uri(),
            stablecoins: server.uri(),
            yields: server.uri(),
        };
        LlamaClient::new(endpoints, Some(Duration::from_secs(5)), max_retries).unwrap()
    }

    #[tokio::test]
    async fn fetch_chains_parses_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/chains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "name": "Ethereum", "gecko_id": "ethereum", "tvl": 1.0,
                    "tokenSymbol": "ETH", "cmcId": "1027", "chainId": 1
                },
                {
                    "name": "Base", "gecko_id": null, "tvl": 123,
                    "tokenSymbol": null, "cmcId": null, "chainId": 8453
                }
            ])))
            .mount(&server)
            .await;

        let chains = client_for(&server, 0).fetch_chains().await.unwrap();

        assert_eq!(chains.len(), 2);
        assert_eq!(chains[1].name, "Base");
        assert_eq!(chains[1].chain_id, Some(8453));
        assert_eq!(chains[1].gecko_id, None);
    }

    #[tokio::test]
    async fn stable_coins_unwrap_pegged_assets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stablecoins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "peggedAssets": [
                    {
                        "id": "1", "name": "Tether", "symbol": "USDT",
                        "geckoId": "tether", "chains": ["Base"]
                    }
                ]
            })))
            .mount(&server)
            .await;

        let coins = client_for(&server, 0).fetch_stable_coins().await.unwrap();

        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].gecko_id.as_deref(), Some("tether"));
    }

    #[tokio::test]
    async fn yield_pools_unwrap_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pools"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": [
                    {
                        "pool": "p1", "chain": "Base", "project": "aave-v3",
                        "symbol": "USDC", "tvlUsd": 10
                    }
                ]
            })))
            .mount(&server)
            .await;

        let pools = client_for(&server, 0).fetch_yield_pools().await.unwrap();

        assert_eq!(pools.len(), 1);
        assert_eq!(pools[0].pool, "p1");
    }

    #[tokio::test]
    async fn dex_overview_excludes_chart_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/overview/dexs/Base"))
            .and(query_param("excludeTotalDataChart", "true"))
            .and(query_param("excludeTotalDataChartBreakdown", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chain": "Base",
                "allChains": ["Base"],
                "total24h": 10,
                "protocols": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let overview = client_for(&server, 0).fetch_dex_overview("Base").await.unwrap();

        assert_eq!(overview.chain.as_deref(), Some("Base"));
        assert_eq!(overview.volumes.total_24h, Some(10.0));
    }

    #[tokio::test]
    async fn dex_overview_escapes_chain_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/overview/dexs/Arbitrum%20Nova"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chain": "Arbitrum Nova",
                "protocols": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let overview = client_for(&server, 0)
            .fetch_dex_overview("Arbitrum Nova")
            .await
            .unwrap();

        assert_eq!(overview.chain.as_deref(), Some("Arbitrum Nova"));
    }

    #[test]
    fn endpoint_url_keeps_base_path_and_encodes_segments() {
        let url = endpoint_url("https://example.com/api", &["overview", "dexs", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/overview/dexs/a%2Fb");

        let url = endpoint_url("https://example.com", &["overview"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/overview");

        assert!(matches!(
            endpoint_url("not a url", &["overview"]),
            Err(IndexerError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/protocols"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 0).fetch_protocols().await.unwrap_err();

        match err {
            IndexerError::UpstreamStatus { status, .. } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn retries_rate_limited_request_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/protocols"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/protocols"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "aave", "name": "Aave", "chains": ["Base"] }
            ])))
            .mount(&server)
            .await;

        let protocols = client_for(&server, 1).fetch_protocols().await.unwrap();

        assert_eq!(protocols.len(), 1);
        assert_eq!(protocols[0].id, "aave");
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/chains"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server, 0).fetch_chains().await.unwrap_err();

        assert!(matches!(err, IndexerError::HttpError(_)));
    }
}

use anyhow::{Context, Result, bail};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.llama.fi";
pub const DEFAULT_STABLECOINS_URL: &str = "https://stablecoins.llama.fi";
pub const DEFAULT_YIELDS_URL: &str = "https://yields.llama.fi";
pub const DEFAULT_TARGET_CHAIN: &str = "Base";
/// sec min hour day-of-month month day-of-week
pub const DEFAULT_INGEST_CRON: &str = "0 0 * * * *";

/// Base URLs of the three DefiLlama hosts, without trailing slash.
#[derive(Debug, Clone, PartialEq)]
pub struct LlamaEndpoints {
    pub api: String,
    pub stablecoins: String,
    pub yields: String,
}

impl Default for LlamaEndpoints {
    fn default() -> Self {
        Self {
            api: DEFAULT_API_URL.to_string(),
            stablecoins: DEFAULT_STABLECOINS_URL.to_string(),
            yields: DEFAULT_YIELDS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub endpoints: LlamaEndpoints,
    pub target_chain: String,
    pub ingest_cron: String,
    pub run_on_start: bool,
    pub db_max_connections: u32,
    pub http_timeout: Option<Duration>,
    pub http_max_retries: u32,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set in .env")?;

        let endpoints = LlamaEndpoints {
            api: base_url(var("DEFILLAMA_API_URL"), DEFAULT_API_URL)?,
            stablecoins: base_url(var("DEFILLAMA_STABLECOINS_URL"), DEFAULT_STABLECOINS_URL)?,
            yields: base_url(var("DEFILLAMA_YIELDS_URL"), DEFAULT_YIELDS_URL)?,
        };

        let run_on_start = match var("RUN_ON_START") {
            Some(v) => parse_bool(&v).with_context(|| format!("Invalid RUN_ON_START: {v}"))?,
            None => true,
        };

        let db_max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid DB_MAX_CONNECTIONS: {v}"))?,
            None => 5,
        };

        let http_timeout = match var("HTTP_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .with_context(|| format!("Invalid HTTP_TIMEOUT_SECS: {v}"))?;
                if secs == 0 {
                    bail!("HTTP_TIMEOUT_SECS must be greater than 0, unset it to disable");
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let http_max_retries = match var("HTTP_MAX_RETRIES") {
            Some(v) => v
                .parse()
                .with_context(|| format!("Invalid HTTP_MAX_RETRIES: {v}"))?,
            None => 0,
        };

        Ok(Self {
            database_url,
            redis_url: var("REDIS_URL"),
            endpoints,
            target_chain: var("TARGET_CHAIN").unwrap_or_else(|| DEFAULT_TARGET_CHAIN.to_string()),
            ingest_cron: var("INGEST_CRON").unwrap_or_else(|| DEFAULT_INGEST_CRON.to_string()),
            run_on_start,
            db_max_connections,
            http_timeout,
            http_max_retries,
        })
    }
}

fn base_url(value: Option<String>, default: &str) -> Result<String> {
    let raw = value.unwrap_or_else(|| default.to_string());
    let parsed = Url::parse(&raw).with_context(|| format!("Invalid base URL: {raw}"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Base URL must be http(s): {raw}");
    }

    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("expected a boolean"),
    }
}

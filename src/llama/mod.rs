pub mod client;
pub mod ingester;
pub mod mapper;
pub mod scheduler;

pub use client::{DefiLlamaApi, LlamaClient};
pub use ingester::{DexStatus, Ingester, RunReport};
pub use scheduler::{Firing, INGESTION_CHANNEL, IngestionScheduler};

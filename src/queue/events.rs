use crate::llama::ingester::RunReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Message published on the ingestion channel after every trigger firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestionEvent {
    Completed(RunReport),
    Failed {
        chain: String,
        error: String,
        at: DateTime<Utc>,
    },
    Skipped {
        chain: String,
        at: DateTime<Utc>,
    },
}

impl IngestionEvent {
    pub fn failed(chain: &str, error: &impl Display) -> Self {
        Self::Failed {
            chain: chain.to_string(),
            error: error.to_string(),
            at: Utc::now(),
        }
    }

    pub fn skipped(chain: &str) -> Self {
        Self::Skipped {
            chain: chain.to_string(),
            at: Utc::now(),
        }
    }

    pub fn chain(&self) -> &str {
        match self {
            Self::Completed(report) => &report.chain,
            Self::Failed { chain, .. } | Self::Skipped { chain, .. } => chain,
        }
    }

    /// Suffix of the worker's per-outcome run counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

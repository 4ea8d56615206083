use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("DefiLlama request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid DefiLlama URL: {0}")]
    InvalidUrl(String),

    #[error("DefiLlama returned {status} for {url}")]
    UpstreamStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Chain '{0}' not found in upstream response")]
    ChainNotFound(String),
}

pub type Result<T> = std::result::Result<T, IndexerError>;

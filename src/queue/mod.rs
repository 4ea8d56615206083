pub mod events;
pub mod redis_client;
pub mod worker;

pub use events::IngestionEvent;
pub use redis_client::RedisClient;

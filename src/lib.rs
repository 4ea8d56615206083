pub mod config;
pub mod db;
pub mod error;
pub mod llama;
pub mod models;
pub mod queue;
pub mod store;

pub use error::{IndexerError, Result};

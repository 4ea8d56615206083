pub mod db_model;
pub mod llama_model;
pub mod queries;

pub use db_model::*;
pub use llama_model::*;

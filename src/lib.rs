pub mod alias;
pub mod config;
pub mod error;
pub mod lineage;
pub mod pipeline;
pub mod reports;
pub mod sources;
pub mod storage;
pub mod types;

pub mod config;
pub mod error;
pub mod generate;
pub mod publish;
pub mod triggers;

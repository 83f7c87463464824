pub mod config;
pub mod config_processors;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod metrics;

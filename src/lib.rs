pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::storage::{LocalStorage, MemoryStorage};
pub use crate::adapters::usage::UsageCounter;
pub use crate::config::AppConfig;
pub use crate::core::{
    cache::{CacheLookup, CacheWrite, RateCache},
    fetcher::MultiSourceFetcher,
    session::{CalculateOutcome, CalculatorSession, RateOrigin},
};
pub use crate::utils::error::{FxError, Result};

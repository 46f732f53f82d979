pub mod cache;
pub mod calculator;
pub mod fetcher;
pub mod format;
pub mod session;

pub use crate::domain::model::{
    CalculationInputs, CalculationResult, CalculationView, CurrencyPair, FetchOutcome,
    FetchedRate, RateAttribution, RateRecord, RawInputs,
};
pub use crate::domain::ports::{BlobStorage, ConfigProvider, RateProvider};
pub use crate::utils::error::Result;

// Adapters layer: concrete implementations for external systems (storage, FX services, telemetry).

pub mod providers;
pub mod storage;
pub mod usage;

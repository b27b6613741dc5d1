pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::GoogleGeocoder;
pub use adapters::storage::{CsvDatasetStore, FileCheckpoint, LocalStorage};
pub use app::backfill::{run_backfill, BackfillReport};
pub use config::toml_config::TomlConfig;
pub use crate::core::{reconciler::Reconciler, runner::EnrichmentRunner};
pub use domain::model::{AddressRole, Dataset, Reconciliation, Record};
pub use utils::error::{EnrichError, Result};

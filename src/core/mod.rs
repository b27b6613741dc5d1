pub mod components;
pub mod country;
pub mod presence;
pub mod query;
pub mod reconciler;
pub mod runner;

pub use crate::domain::model::{Dataset, LookupOutcome, Reconciliation, Record};
pub use crate::domain::ports::{CheckpointSink, ConfigProvider, DatasetStore, GeocodingProvider, Storage};
pub use crate::utils::error::Result;

use crate::domain::model::{AddressRole, Dataset, LookupOutcome};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Loads and saves whole datasets. Column order survives a load/save cycle.
pub trait DatasetStore: Send + Sync {
    fn load(&self, source: &str) -> impl std::future::Future<Output = Result<Dataset>> + Send;
    fn save(
        &self,
        dataset: &Dataset,
        destination: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Geocoding lookups. Transport failures are reported as [`LookupOutcome::NotFound`].
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn lookup(&self, query: &str) -> LookupOutcome;
}

#[async_trait]
pub trait CheckpointSink: Send + Sync {
    async fn checkpoint(&self, dataset: &Dataset) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn endpoint(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn checkpoint_path(&self) -> &str;
    fn checkpoint_every(&self) -> usize;
    fn delay_seconds(&self) -> f64;
    fn role(&self) -> AddressRole;
    fn delimiter(&self) -> u8;
}

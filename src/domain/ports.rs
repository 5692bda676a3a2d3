use crate::domain::model::{SilverBounds, StageSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Artifact storage. Paths are relative to the storage root.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn pipeline_name(&self) -> &str;
    fn pipeline_version(&self) -> &str;
    fn db_path(&self) -> &Path;
    fn raw_csv(&self) -> &Path;
    /// Where to download the raw CSV from when it is missing locally.
    fn source_endpoint(&self) -> Option<&str>;
    fn artifacts_dir(&self) -> &Path;
    fn silver_bounds(&self) -> SilverBounds;
    /// Name of the ZIP bundle to write at export, if bundling is enabled.
    fn bundle_filename(&self) -> Option<&str>;
    fn busy_timeout_ms(&self) -> u64 {
        5_000
    }
}

/// One method per medallion stage. Stages are idempotent and gate on the
/// objects earlier stages materialize.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn ingest(&self) -> Result<StageSummary>;
    async fn silver(&self) -> Result<StageSummary>;
    async fn dims(&self) -> Result<StageSummary>;
    async fn gold(&self) -> Result<StageSummary>;
    async fn export(&self) -> Result<StageSummary>;
}

use crate::core::db::Db;
use crate::core::dims::{self, DIM_HOST_SK, FACT_PLANET, FACT_PLANET_SK};
use crate::core::export::{self, MANIFEST_FILE};
use crate::core::gold::{self, GOLD_BY_HOST, GOLD_BY_METHOD};
use crate::core::ingest::{self, RAW_TABLE};
use crate::core::silver::{self, SILVER_TABLE};
use crate::core::{ConfigProvider, Pipeline, StageSummary, Storage};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;

/// The medallion pipeline: raw -> silver -> star schema -> gold -> artifacts,
/// all inside one embedded database file.
pub struct MedallionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> MedallionPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    /// Run a closure against the pipeline database on the blocking pool.
    /// `rusqlite` connections are not `Sync`, so each stage opens its own.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Db) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.config.db_path().to_path_buf();
        let busy_timeout_ms = self.config.busy_timeout_ms();
        tokio::task::spawn_blocking(move || {
            let mut db = Db::open(&path, busy_timeout_ms)?;
            f(&mut db)
        })
        .await
        .map_err(|e| EtlError::ProcessingError {
            message: format!("blocking database task failed: {}", e),
        })?
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MedallionPipeline<S, C> {
    async fn ingest(&self) -> Result<StageSummary> {
        let raw_csv = self.config.raw_csv().to_path_buf();

        if !raw_csv.exists() {
            match self.config.source_endpoint() {
                Some(endpoint) => {
                    tracing::info!("Raw CSV not found locally, downloading");
                    ingest::fetch_raw_csv(&self.client, endpoint, &raw_csv).await?;
                }
                None => {
                    return Err(EtlError::MissingInputError {
                        label: "raw CSV".to_string(),
                        path: raw_csv.display().to_string(),
                    });
                }
            }
        }

        let (inserted, skipped) = self
            .with_db(move |db| ingest::build_raw(db, &raw_csv))
            .await?;

        let mut summary = StageSummary::new("ingest").count(RAW_TABLE, inserted);
        summary.skipped_rows = skipped;
        Ok(summary)
    }

    async fn silver(&self) -> Result<StageSummary> {
        let bounds = self.config.silver_bounds();
        let rows = self
            .with_db(move |db| silver::build_silver(db, &bounds))
            .await?;
        Ok(StageSummary::new("silver").count(SILVER_TABLE, rows))
    }

    async fn dims(&self) -> Result<StageSummary> {
        let summary = self.with_db(|db| dims::build_dims_facts(db)).await?;
        Ok(StageSummary::new("dims")
            .count(DIM_HOST_SK, summary.dim_rows)
            .count(FACT_PLANET, summary.fact_rows)
            .count(FACT_PLANET_SK, summary.fact_sk_rows))
    }

    async fn gold(&self) -> Result<StageSummary> {
        let (by_method, by_host) = self
            .with_db(|db| {
                gold::build_gold(db)?;
                Ok((db.count(GOLD_BY_METHOD)?, db.count(GOLD_BY_HOST)?))
            })
            .await?;
        Ok(StageSummary::new("gold")
            .count(GOLD_BY_METHOD, by_method)
            .count(GOLD_BY_HOST, by_host))
    }

    async fn export(&self) -> Result<StageSummary> {
        tracing::info!("Stage EXPORT: writing artifact CSVs");

        let (entries, row_counts) = self
            .with_db(|db| {
                export::require_gold_views(db)?;
                let mut entries = Vec::new();
                let mut row_counts = Vec::new();
                for view in [GOLD_BY_METHOD, GOLD_BY_HOST] {
                    entries.push((format!("{}.csv", view), export::view_to_csv(db, view)?));
                    row_counts.push((view.to_string(), db.count(view)?));
                }
                Ok((entries, row_counts))
            })
            .await?;

        let mut summary = StageSummary::new("export");
        summary.row_counts = row_counts.clone();

        for (name, data) in &entries {
            self.storage.write_file(name, data).await?;
            tracing::info!("Wrote {}", name);
            summary.artifacts.push(name.clone());
        }

        let manifest = export::new_manifest(
            self.config.pipeline_name(),
            self.config.pipeline_version(),
            summary.artifacts.clone(),
            row_counts,
        );
        let manifest_bytes = export::render_manifest(&manifest)?;
        self.storage.write_file(MANIFEST_FILE, &manifest_bytes).await?;
        tracing::info!("Wrote {}", MANIFEST_FILE);
        summary.artifacts.push(MANIFEST_FILE.to_string());

        if let Some(bundle_name) = self.config.bundle_filename() {
            let mut bundle_entries = entries;
            bundle_entries.push((MANIFEST_FILE.to_string(), manifest_bytes));
            let bundle = export::bundle_artifacts(&bundle_entries)?;

            tracing::debug!("Writing bundle {} ({} bytes)", bundle_name, bundle.len());
            self.storage.write_file(bundle_name, &bundle).await?;
            tracing::info!("Wrote {}", bundle_name);
            summary.artifacts.push(bundle_name.to_string());
        }

        Ok(summary)
    }
}

pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::SilverBounds;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use crate::core::engine::Mode;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;
#[cfg(feature = "cli")]
use clap::Parser;

/// Fully resolved pipeline settings: CLI flags layered over an optional TOML
/// config, relative paths anchored at the project root.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub name: String,
    pub version: String,
    pub db_path: PathBuf,
    pub raw_csv: PathBuf,
    pub artifacts_dir: PathBuf,
    pub endpoint: Option<String>,
    pub bounds: SilverBounds,
    pub bundle: Option<String>,
    pub busy_timeout_ms: u64,
    pub monitor: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            name: "exoplanets".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            db_path: PathBuf::from("data/exoplanets.db"),
            raw_csv: PathBuf::from("data/raw/pscomppars.csv"),
            artifacts_dir: PathBuf::from("artifacts"),
            endpoint: None,
            bounds: SilverBounds::default(),
            bundle: None,
            busy_timeout_ms: 5_000,
            monitor: false,
        }
    }
}

impl ConfigProvider for PipelineSettings {
    fn pipeline_name(&self) -> &str {
        &self.name
    }

    fn pipeline_version(&self) -> &str {
        &self.version
    }

    fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn raw_csv(&self) -> &Path {
        &self.raw_csv
    }

    fn source_endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    fn silver_bounds(&self) -> SilverBounds {
        self.bounds
    }

    fn bundle_filename(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms
    }
}

impl Validate for PipelineSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.name)?;
        validation::validate_path("database.path", &self.db_path.display().to_string())?;
        validation::validate_path("source.raw_csv", &self.raw_csv.display().to_string())?;
        if let Some(endpoint) = &self.endpoint {
            validation::validate_url("source.endpoint", endpoint)?;
        }
        validation::validate_range(
            "silver.min_disc_year",
            self.bounds.min_disc_year,
            1800,
            self.bounds.max_disc_year,
        )?;
        Ok(())
    }
}

fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "medallion-etl")]
#[command(about = "Idempotent Raw/Silver/Gold pipeline runner over an embedded database")]
pub struct CliConfig {
    /// Path to a TOML pipeline config; flags override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".")]
    pub project_root: String,

    /// Database path, relative to the project root
    #[arg(long)]
    pub db_path: Option<String>,

    /// Raw CSV path, relative to the project root
    #[arg(long)]
    pub raw_csv: Option<String>,

    /// Download the raw CSV from this URL when it is missing
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Directory for exported gold artifacts
    #[arg(long)]
    pub artifacts_dir: Option<String>,

    #[arg(long, value_enum, default_value_t = Mode::All)]
    pub mode: Mode,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable system monitoring
    #[arg(long)]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Layer flags over the optional TOML config and resolve paths.
    pub fn resolve(&self) -> Result<PipelineSettings> {
        let toml = match &self.config {
            Some(path) => {
                let config = TomlConfig::from_file(path)?;
                config.validate()?;
                Some(config)
            }
            None => None,
        };

        let root = PathBuf::from(&self.project_root);
        let defaults = PipelineSettings::default();

        let db_path = self
            .db_path
            .clone()
            .or_else(|| toml.as_ref().and_then(|t| t.database.as_ref()?.path.clone()))
            .unwrap_or_else(|| defaults.db_path.display().to_string());
        let raw_csv = self
            .raw_csv
            .clone()
            .or_else(|| toml.as_ref().and_then(|t| t.source.as_ref()?.raw_csv.clone()))
            .unwrap_or_else(|| defaults.raw_csv.display().to_string());
        let artifacts_dir = self
            .artifacts_dir
            .clone()
            .or_else(|| {
                toml.as_ref()
                    .and_then(|t| t.export.as_ref()?.artifacts_dir.clone())
            })
            .unwrap_or_else(|| defaults.artifacts_dir.display().to_string());

        let settings = PipelineSettings {
            name: toml
                .as_ref()
                .map(|t| t.pipeline.name.clone())
                .unwrap_or(defaults.name),
            version: toml
                .as_ref()
                .map(|t| t.pipeline.version.clone())
                .unwrap_or(defaults.version),
            db_path: resolve_path(&root, &db_path),
            raw_csv: resolve_path(&root, &raw_csv),
            artifacts_dir: resolve_path(&root, &artifacts_dir),
            endpoint: self
                .endpoint
                .clone()
                .or_else(|| toml.as_ref().and_then(|t| t.source.as_ref()?.endpoint.clone())),
            bounds: toml
                .as_ref()
                .map(|t| t.silver_bounds())
                .unwrap_or(defaults.bounds),
            bundle: toml
                .as_ref()
                .and_then(|t| t.bundle_filename().map(str::to_string)),
            busy_timeout_ms: toml
                .as_ref()
                .and_then(|t| t.database.as_ref()?.busy_timeout_ms)
                .unwrap_or(defaults.busy_timeout_ms),
            monitor: self.monitor
                || toml.as_ref().map(|t| t.monitoring_enabled()).unwrap_or(false),
        };

        settings.validate()?;
        Ok(settings)
    }
}

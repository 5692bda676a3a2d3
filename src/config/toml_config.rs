use crate::domain::model::SilverBounds;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: Option<SourceConfig>,
    pub database: Option<DatabaseConfig>,
    pub silver: Option<SilverConfig>,
    pub export: Option<ExportConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Archive endpoint to download the raw CSV from when it is missing.
    pub endpoint: Option<String>,
    pub raw_csv: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilverConfig {
    pub min_disc_year: Option<i64>,
    pub max_disc_year: Option<i64>,
    pub max_radius_earth: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub artifacts_dir: Option<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` placeholders with environment values. Unset
    /// variables are left as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        if let Some(source) = &self.source {
            if let Some(endpoint) = &source.endpoint {
                validation::validate_url("source.endpoint", endpoint)?;
            }
            if let Some(raw_csv) = &source.raw_csv {
                validation::validate_path("source.raw_csv", raw_csv)?;
            }
        }

        if let Some(database) = &self.database {
            if let Some(path) = &database.path {
                validation::validate_path("database.path", path)?;
            }
            if let Some(timeout) = database.busy_timeout_ms {
                validation::validate_positive_number("database.busy_timeout_ms", timeout as i64, 1)?;
            }
        }

        let bounds = self.silver_bounds();
        validation::validate_range(
            "silver.min_disc_year",
            bounds.min_disc_year,
            1800,
            bounds.max_disc_year,
        )?;
        if bounds.max_radius_earth <= 0.0 {
            return Err(EtlError::InvalidConfigValueError {
                field: "silver.max_radius_earth".to_string(),
                value: bounds.max_radius_earth.to_string(),
                reason: "Radius bound must be positive".to_string(),
            });
        }

        if let Some(export) = &self.export {
            if let Some(dir) = &export.artifacts_dir {
                validation::validate_path("export.artifacts_dir", dir)?;
            }
            if let Some(compression) = &export.compression {
                if compression.enabled {
                    match &compression.filename {
                        Some(filename) => validation::validate_non_empty_string(
                            "export.compression.filename",
                            filename,
                        )?,
                        None => {
                            return Err(EtlError::MissingConfigError {
                                field: "export.compression.filename".to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn silver_bounds(&self) -> SilverBounds {
        let defaults = SilverBounds::default();
        match &self.silver {
            Some(silver) => SilverBounds {
                min_disc_year: silver.min_disc_year.unwrap_or(defaults.min_disc_year),
                max_disc_year: silver.max_disc_year.unwrap_or(defaults.max_disc_year),
                max_radius_earth: silver.max_radius_earth.unwrap_or(defaults.max_radius_earth),
            },
            None => defaults,
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn bundle_filename(&self) -> Option<&str> {
        self.export
            .as_ref()?
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .and_then(|c| c.filename.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

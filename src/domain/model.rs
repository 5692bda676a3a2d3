use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the raw exoplanet CSV (NASA `pscomppars` shape), restricted to
/// the 16 modeled columns. Every field is optional: the raw layer keeps the
/// data exactly as extracted, NULLs included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPlanet {
    pub pl_name: Option<String>,
    pub hostname: Option<String>,
    pub discoverymethod: Option<String>,
    pub disc_year: Option<i64>,
    pub sy_snum: Option<i64>,
    pub sy_pnum: Option<i64>,
    pub sy_dist: Option<f64>,
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub pl_orbper: Option<f64>,
    pub pl_rade: Option<f64>,
    pub pl_bmasse: Option<f64>,
    pub pl_eqt: Option<f64>,
    pub st_teff: Option<f64>,
    pub st_rad: Option<f64>,
    pub st_mass: Option<f64>,
}

/// Cleaning bounds applied when building the silver layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SilverBounds {
    pub min_disc_year: i64,
    pub max_disc_year: i64,
    pub max_radius_earth: f64,
}

impl Default for SilverBounds {
    fn default() -> Self {
        Self {
            min_disc_year: 1980,
            max_disc_year: 2026,
            max_radius_earth: 30.0,
        }
    }
}

/// What a stage did: objects touched and their resulting row counts, plus any
/// artifacts it wrote.
#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub stage: String,
    pub row_counts: Vec<(String, u64)>,
    pub artifacts: Vec<String>,
    pub skipped_rows: u64,
}

impl StageSummary {
    pub fn new(stage: &str) -> Self {
        Self {
            stage: stage.to_string(),
            row_counts: Vec::new(),
            artifacts: Vec::new(),
            skipped_rows: 0,
        }
    }

    pub fn count(mut self, object: &str, rows: u64) -> Self {
        self.row_counts.push((object.to_string(), rows));
        self
    }

    pub fn rows_for(&self, object: &str) -> Option<u64> {
        self.row_counts
            .iter()
            .find(|(name, _)| name == object)
            .map(|(_, n)| *n)
    }
}

/// Run metadata written alongside the exported artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub pipeline: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub artifacts: Vec<String>,
    pub row_counts: Vec<(String, u64)>,
}

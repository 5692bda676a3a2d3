use crate::core::db::{Db, DbObject};
use crate::domain::model::RawPlanet;
use crate::utils::error::{EtlError, Result};
use rusqlite::params;
use std::path::Path;

pub const RAW_TABLE: &str = "raw_ps";

const CREATE_RAW_SQL: &str = "
CREATE TABLE raw_ps (
  pl_name         TEXT,
  hostname        TEXT,
  discoverymethod TEXT,
  disc_year       INTEGER,
  sy_snum         INTEGER,
  sy_pnum         INTEGER,
  sy_dist         REAL,
  ra              REAL,
  dec             REAL,
  pl_orbper       REAL,
  pl_rade         REAL,
  pl_bmasse       REAL,
  pl_eqt          REAL,
  st_teff         REAL,
  st_rad          REAL,
  st_mass         REAL
)";

/// Download the raw CSV from the configured endpoint. Non-success statuses
/// are errors; partial bodies never reach the destination path.
pub async fn fetch_raw_csv(client: &reqwest::Client, endpoint: &str, dest: &Path) -> Result<()> {
    tracing::info!("Fetching raw CSV from: {}", endpoint);
    let response = client.get(endpoint).send().await?.error_for_status()?;
    let body = response.bytes().await?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, &body)?;

    tracing::info!("Fetched {} bytes to {}", body.len(), dest.display());
    Ok(())
}

/// Materialize `raw_ps` from the CSV. Idempotent: drops and recreates.
///
/// Archive exports prefix metadata with `#` comment lines; those are skipped.
/// Rows that fail to parse are skipped with a warning and counted rather than
/// failing the whole run. Returns (inserted, skipped).
pub fn build_raw(db: &mut Db, csv_path: &Path) -> Result<(u64, u64)> {
    if !csv_path.exists() {
        return Err(EtlError::MissingInputError {
            label: "raw CSV".to_string(),
            path: csv_path.display().to_string(),
        });
    }

    tracing::info!("Stage INGEST: building {}", RAW_TABLE);
    db.drop_if_exists(DbObject::Table, RAW_TABLE)?;
    db.conn().execute_batch(CREATE_RAW_SQL)?;

    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let mut inserted: u64 = 0;
    let mut skipped: u64 = 0;

    let tx = db.conn_mut().transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO raw_ps (
               pl_name, hostname, discoverymethod, disc_year, sy_snum, sy_pnum,
               sy_dist, ra, dec, pl_orbper, pl_rade, pl_bmasse, pl_eqt,
               st_teff, st_rad, st_mass
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        )?;

        for (line, record) in reader.deserialize::<RawPlanet>().enumerate() {
            match record {
                Ok(row) => {
                    stmt.execute(params![
                        row.pl_name,
                        row.hostname,
                        row.discoverymethod,
                        row.disc_year,
                        row.sy_snum,
                        row.sy_pnum,
                        row.sy_dist,
                        row.ra,
                        row.dec,
                        row.pl_orbper,
                        row.pl_rade,
                        row.pl_bmasse,
                        row.pl_eqt,
                        row.st_teff,
                        row.st_rad,
                        row.st_mass,
                    ])?;
                    inserted += 1;
                }
                Err(e) => {
                    tracing::warn!("Skipping malformed CSV record {}: {}", line + 1, e);
                    skipped += 1;
                }
            }
        }
    }
    tx.commit()?;

    tracing::info!("{} rows={} (skipped {})", RAW_TABLE, inserted, skipped);
    Ok((inserted, skipped))
}

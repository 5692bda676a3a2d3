use crate::core::db::{Db, DbObject};
use crate::core::ingest::RAW_TABLE;
use crate::domain::model::SilverBounds;
use crate::utils::error::Result;
use rusqlite::params;

pub const SILVER_TABLE: &str = "silver_planet";

pub const INGEST_HINT: &str = "Run --mode ingest first (or --mode all).";

/// Silver layer: cleaned subset schema (the 16 core columns), typed and
/// filtered. Idempotent: drops and recreates.
pub fn build_silver(db: &Db, bounds: &SilverBounds) -> Result<u64> {
    db.require(DbObject::Table, RAW_TABLE, INGEST_HINT)?;

    tracing::info!("Stage SILVER: building {}", SILVER_TABLE);
    db.drop_if_exists(DbObject::Table, SILVER_TABLE)?;

    db.conn().execute(
        "CREATE TABLE silver_planet AS
         SELECT
           pl_name,
           hostname,
           discoverymethod,
           disc_year,
           sy_snum,
           sy_pnum,
           sy_dist,
           ra,
           dec,
           pl_orbper,
           pl_rade,
           pl_bmasse,
           pl_eqt,
           st_teff,
           st_rad,
           st_mass
         FROM raw_ps
         WHERE pl_name IS NOT NULL
           AND hostname IS NOT NULL
           AND (disc_year IS NULL OR (disc_year BETWEEN ?1 AND ?2))
           AND (pl_rade  IS NULL OR (pl_rade  > 0 AND pl_rade <= ?3))
           AND (pl_bmasse IS NULL OR (pl_bmasse > 0))",
        params![
            bounds.min_disc_year,
            bounds.max_disc_year,
            bounds.max_radius_earth
        ],
    )?;

    let rows = db.count(SILVER_TABLE)?;
    tracing::info!("{} rows={}", SILVER_TABLE, rows);
    Ok(rows)
}

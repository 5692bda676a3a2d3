use crate::core::db::{Db, DbObject};
use crate::core::silver::SILVER_TABLE;
use crate::utils::error::Result;

pub const DIM_HOST_FULL: &str = "dim_host_full";
pub const DIM_HOST_SK: &str = "dim_host_sk";
pub const FACT_PLANET: &str = "fact_planet";
pub const FACT_PLANET_SK: &str = "fact_planet_sk";

pub const SILVER_HINT: &str = "Run --mode silver first (or --mode all).";

#[derive(Debug)]
pub struct DimsSummary {
    pub dim_rows: u64,
    pub dim_keys: u64,
    pub fact_rows: u64,
    pub fact_sk_rows: u64,
}

/// Star schema over the silver layer:
/// - `dim_host_full`: one row per hostname, MAX() as a simple dedupe
/// - `fact_planet`: distinct planet rows
/// - `dim_host_sk`: hosts with a surrogate key
/// - `fact_planet_sk`: facts carrying `host_id` instead of `hostname`
///
/// Dependents are dropped before the tables they reference, so a rebuild
/// never trips dependency ordering.
pub fn build_dims_facts(db: &Db) -> Result<DimsSummary> {
    db.require(DbObject::Table, SILVER_TABLE, SILVER_HINT)?;

    tracing::info!(
        "Stage DIMS: building {}, {}, {}, {}",
        DIM_HOST_FULL,
        FACT_PLANET,
        DIM_HOST_SK,
        FACT_PLANET_SK
    );

    db.drop_if_exists(DbObject::Table, FACT_PLANET_SK)?;
    db.drop_if_exists(DbObject::Table, FACT_PLANET)?;
    db.drop_if_exists(DbObject::Table, DIM_HOST_SK)?;
    db.drop_if_exists(DbObject::Table, DIM_HOST_FULL)?;

    db.conn().execute_batch(
        "CREATE TABLE dim_host_full AS
         SELECT
           hostname,
           MAX(sy_dist)  AS sy_dist,
           MAX(ra)       AS ra,
           MAX(dec)      AS dec,
           MAX(st_teff)  AS st_teff,
           MAX(st_rad)   AS st_rad,
           MAX(st_mass)  AS st_mass
         FROM silver_planet
         GROUP BY hostname;

         CREATE TABLE fact_planet AS
         SELECT DISTINCT
           pl_name,
           hostname,
           discoverymethod,
           disc_year,
           pl_orbper,
           pl_rade,
           pl_bmasse,
           pl_eqt
         FROM silver_planet;

         CREATE TABLE dim_host_sk AS
         SELECT
           ROW_NUMBER() OVER (ORDER BY hostname) AS host_id,
           hostname,
           sy_dist, ra, dec, st_teff, st_rad, st_mass
         FROM dim_host_full;

         CREATE TABLE fact_planet_sk AS
         SELECT
           f.pl_name,
           d.host_id,
           f.discoverymethod,
           f.disc_year,
           f.pl_orbper,
           f.pl_rade,
           f.pl_bmasse,
           f.pl_eqt
         FROM fact_planet f
         JOIN dim_host_sk d
           ON f.hostname = d.hostname;",
    )?;

    // Evidence checks: surrogate keys must be one per hostname, and the join
    // must not drop facts.
    let (dim_rows, dim_keys): (i64, i64) = db.conn().query_row(
        "SELECT COUNT(*), COUNT(DISTINCT hostname) FROM dim_host_sk",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let fact_rows = db.count(FACT_PLANET)?;
    let fact_sk_rows = db.count(FACT_PLANET_SK)?;

    tracing::info!("{} uniqueness rows={}, keys={}", DIM_HOST_SK, dim_rows, dim_keys);
    tracing::info!(
        "{} rows={}, {} rows={}",
        FACT_PLANET,
        fact_rows,
        FACT_PLANET_SK,
        fact_sk_rows
    );

    Ok(DimsSummary {
        dim_rows: dim_rows as u64,
        dim_keys: dim_keys as u64,
        fact_rows,
        fact_sk_rows,
    })
}

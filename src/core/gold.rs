use crate::core::db::{Db, DbObject};
use crate::core::dims::{DIM_HOST_SK, FACT_PLANET_SK};
use crate::utils::error::Result;

pub const GOLD_BY_METHOD: &str = "gold_by_discoverymethod";
pub const GOLD_BY_HOST: &str = "gold_by_host";

pub const DIMS_HINT: &str = "Run --mode dims first (or --mode all).";

/// Gold layer: aggregated views ready for final metric computation.
pub fn build_gold(db: &Db) -> Result<()> {
    db.require(DbObject::Table, FACT_PLANET_SK, DIMS_HINT)?;
    db.require(DbObject::Table, DIM_HOST_SK, DIMS_HINT)?;

    tracing::info!(
        "Stage GOLD: building views {} and {}",
        GOLD_BY_METHOD,
        GOLD_BY_HOST
    );

    db.drop_if_exists(DbObject::View, GOLD_BY_METHOD)?;
    db.conn().execute_batch(
        "CREATE VIEW gold_by_discoverymethod AS
         SELECT
           discoverymethod,
           COUNT(*) AS n_planets,
           AVG(pl_rade)   AS avg_radius_earth,
           AVG(pl_bmasse) AS avg_mass_earth,
           MIN(disc_year) AS first_year,
           MAX(disc_year) AS last_year
         FROM fact_planet_sk
         WHERE discoverymethod IS NOT NULL
         GROUP BY discoverymethod
         ORDER BY n_planets DESC",
    )?;

    db.drop_if_exists(DbObject::View, GOLD_BY_HOST)?;
    db.conn().execute_batch(
        "CREATE VIEW gold_by_host AS
         SELECT
           d.hostname,
           COUNT(*) AS n_planets,
           AVG(f.pl_rade)   AS avg_radius_earth,
           AVG(f.pl_bmasse) AS avg_mass_earth,
           MAX(d.sy_dist) AS sy_dist,
           MAX(d.ra) AS ra,
           MAX(d.dec) AS dec
         FROM fact_planet_sk f
         JOIN dim_host_sk d
           ON f.host_id = d.host_id
         GROUP BY d.hostname
         ORDER BY n_planets DESC, avg_radius_earth DESC NULLS LAST",
    )?;

    tracing::info!("gold views created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EtlError;

    fn star_schema_db() -> Db {
        let db = Db::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                "CREATE TABLE dim_host_sk (
                   host_id INTEGER, hostname TEXT, sy_dist REAL, ra REAL, dec REAL,
                   st_teff REAL, st_rad REAL, st_mass REAL
                 );
                 CREATE TABLE fact_planet_sk (
                   pl_name TEXT, host_id INTEGER, discoverymethod TEXT, disc_year INTEGER,
                   pl_orbper REAL, pl_rade REAL, pl_bmasse REAL, pl_eqt REAL
                 );
                 INSERT INTO dim_host_sk (host_id, hostname, sy_dist, ra, dec) VALUES
                   (1, 'host-a', 10.0, 100.0, -10.0),
                   (2, 'host-b', 20.0, 200.0, 20.0);
                 INSERT INTO fact_planet_sk
                   (pl_name, host_id, discoverymethod, disc_year, pl_rade, pl_bmasse) VALUES
                   ('b-1', 1, 'Transit',         2010, 1.0, 2.0),
                   ('b-2', 1, 'Transit',         2014, 3.0, 6.0),
                   ('c-1', 2, 'Radial Velocity', 2001, 5.0, 10.0),
                   ('c-2', 2, NULL,              2003, 7.0, 14.0);",
            )
            .unwrap();
        db
    }

    #[test]
    fn test_gold_by_method_aggregates_and_excludes_null_method() {
        let db = star_schema_db();
        build_gold(&db).unwrap();

        let rows: Vec<(String, i64, f64, i64, i64)> = db
            .conn()
            .prepare(
                "SELECT discoverymethod, n_planets, avg_radius_earth, first_year, last_year
                 FROM gold_by_discoverymethod",
            )
            .unwrap()
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        // NULL method excluded; highest planet count first.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "Transit");
        assert_eq!(rows[0].1, 2);
        assert!((rows[0].2 - 2.0).abs() < 1e-9);
        assert_eq!((rows[0].3, rows[0].4), (2010, 2014));
    }

    #[test]
    fn test_gold_by_host_joins_dim_attributes() {
        let db = star_schema_db();
        build_gold(&db).unwrap();

        let (hostname, n, sy_dist): (String, i64, f64) = db
            .conn()
            .query_row(
                "SELECT hostname, n_planets, sy_dist FROM gold_by_host WHERE hostname = 'host-b'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(hostname, "host-b");
        assert_eq!(n, 2);
        assert!((sy_dist - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_gold_requires_star_schema() {
        let db = Db::open_in_memory().unwrap();
        let err = build_gold(&db).unwrap_err();
        assert!(
            matches!(err, EtlError::MissingTableError { ref table, .. } if table == "fact_planet_sk")
        );
    }

    #[test]
    fn test_gold_rebuild_is_idempotent() {
        let db = star_schema_db();
        build_gold(&db).unwrap();
        build_gold(&db).unwrap();
        assert!(db.object_exists(DbObject::View, GOLD_BY_METHOD).unwrap());
        assert!(db.object_exists(DbObject::View, GOLD_BY_HOST).unwrap());
    }
}

use medallion_etl::{
    EtlEngine, EtlError, LocalStorage, MedallionPipeline, Mode, PipelineSettings,
};
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "pl_name,hostname,discoverymethod,disc_year,sy_snum,sy_pnum,sy_dist,ra,dec,pl_orbper,pl_rade,pl_bmasse,pl_eqt,st_teff,st_rad,st_mass";

/// Seven raw rows: three clean planets (one duplicated), one too-old
/// discovery, one oversized radius, and one without a planet name.
fn fixture_csv() -> String {
    format!(
        "{HEADER}\n\
         K-1 b,K-1,Transit,2010,1,2,100.0,10.0,20.0,5.0,1.0,2.0,500.0,5500.0,1.0,1.0\n\
         K-1 c,K-1,Transit,2012,1,2,100.0,10.0,20.0,15.0,2.0,4.0,400.0,5500.0,1.0,1.0\n\
         H-1 b,H-1,Radial Velocity,2001,1,1,50.0,30.0,-10.0,300.0,10.0,300.0,700.0,6000.0,1.2,1.1\n\
         Old b,H-1,Imaging,1900,1,1,50.0,30.0,-10.0,1.0,1.0,1.0,100.0,6000.0,1.2,1.1\n\
         Big b,H-1,Transit,2015,1,1,50.0,30.0,-10.0,1.0,50.0,1.0,100.0,6000.0,1.2,1.1\n\
         ,H-2,Transit,2015,1,1,10.0,40.0,5.0,1.0,1.0,1.0,100.0,5000.0,0.9,0.8\n\
         K-1 b,K-1,Transit,2010,1,2,100.0,10.0,20.0,5.0,1.0,2.0,500.0,5500.0,1.0,1.0\n"
    )
}

fn project_with_fixture() -> (TempDir, PipelineSettings) {
    let root = TempDir::new().unwrap();
    let raw_csv = root.path().join("data/raw/pscomppars.csv");
    std::fs::create_dir_all(raw_csv.parent().unwrap()).unwrap();
    std::fs::write(&raw_csv, fixture_csv()).unwrap();

    let settings = PipelineSettings {
        db_path: root.path().join("data/exoplanets.db"),
        raw_csv,
        artifacts_dir: root.path().join("artifacts"),
        bundle: Some("medallion_bundle.zip".to_string()),
        ..PipelineSettings::default()
    };
    (root, settings)
}

fn engine_for(settings: &PipelineSettings) -> EtlEngine<MedallionPipeline<LocalStorage, PipelineSettings>> {
    let storage = LocalStorage::new(settings.artifacts_dir.clone());
    EtlEngine::new(MedallionPipeline::new(storage, settings.clone()))
}

fn table_count(db_path: &Path, object: &str) -> i64 {
    let conn = rusqlite::Connection::open(db_path).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", object), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[tokio::test]
async fn test_full_run_builds_all_layers() {
    let (_root, settings) = project_with_fixture();
    let engine = engine_for(&settings);

    let summaries = engine.run(Mode::All).await.unwrap();
    assert_eq!(summaries.len(), 5);

    assert_eq!(summaries[0].rows_for("raw_ps"), Some(7));
    // Silver drops the 1900 discovery, the 50-radius planet, and the
    // unnamed row; the duplicate survives until fact_planet's DISTINCT.
    assert_eq!(summaries[1].rows_for("silver_planet"), Some(4));
    assert_eq!(summaries[2].rows_for("dim_host_sk"), Some(2));
    assert_eq!(summaries[2].rows_for("fact_planet"), Some(3));
    assert_eq!(summaries[2].rows_for("fact_planet_sk"), Some(3));
    assert_eq!(summaries[3].rows_for("gold_by_discoverymethod"), Some(2));
    assert_eq!(summaries[3].rows_for("gold_by_host"), Some(2));
}

#[tokio::test]
async fn test_full_run_exports_gold_artifacts() {
    let (_root, settings) = project_with_fixture();
    let engine = engine_for(&settings);
    engine.run(Mode::All).await.unwrap();

    let by_method = settings.artifacts_dir.join("gold_by_discoverymethod.csv");
    let content = std::fs::read_to_string(&by_method).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(
        lines[0],
        "discoverymethod,n_planets,avg_radius_earth,avg_mass_earth,first_year,last_year"
    );
    // Transit has the most planets, so it sorts first.
    assert_eq!(lines[1], "Transit,2,1.5,3,2010,2012");
    assert_eq!(lines[2], "Radial Velocity,1,10,300,2001,2001");

    let by_host = settings.artifacts_dir.join("gold_by_host.csv");
    let content = std::fs::read_to_string(&by_host).unwrap();
    assert!(content.lines().nth(1).unwrap().starts_with("K-1,2,"));

    let manifest: serde_json::Value = serde_json::from_slice(
        &std::fs::read(settings.artifacts_dir.join("manifest.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["pipeline"], "exoplanets");
    assert!(manifest["generated_at"].is_string());
    assert_eq!(manifest["artifacts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_full_run_writes_bundle_when_enabled() {
    let (_root, settings) = project_with_fixture();
    let engine = engine_for(&settings);
    engine.run(Mode::All).await.unwrap();

    let bundle = settings.artifacts_dir.join("medallion_bundle.zip");
    let bytes = std::fs::read(&bundle).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 3);

    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "gold_by_discoverymethod.csv",
            "gold_by_host.csv",
            "manifest.json"
        ]
    );
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (_root, settings) = project_with_fixture();
    let engine = engine_for(&settings);

    engine.run(Mode::All).await.unwrap();
    engine.run(Mode::All).await.unwrap();

    assert_eq!(table_count(&settings.db_path, "raw_ps"), 7);
    assert_eq!(table_count(&settings.db_path, "silver_planet"), 4);
    assert_eq!(table_count(&settings.db_path, "fact_planet_sk"), 3);
    assert_eq!(table_count(&settings.db_path, "gold_by_host"), 2);
}

#[tokio::test]
async fn test_stages_run_individually_in_sequence() {
    let (_root, settings) = project_with_fixture();
    let engine = engine_for(&settings);

    for mode in [
        Mode::Ingest,
        Mode::Silver,
        Mode::Dims,
        Mode::Gold,
        Mode::Export,
    ] {
        let summaries = engine.run(mode).await.unwrap();
        assert_eq!(summaries.len(), 1);
    }

    assert!(settings
        .artifacts_dir
        .join("gold_by_discoverymethod.csv")
        .exists());
}

#[tokio::test]
async fn test_late_stage_without_inputs_names_the_missing_mode() {
    let (_root, settings) = project_with_fixture();
    let engine = engine_for(&settings);

    let err = engine.run(Mode::Silver).await.unwrap_err();
    match err {
        EtlError::MissingTableError { table, hint } => {
            assert_eq!(table, "raw_ps");
            assert!(hint.contains("--mode ingest"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = engine.run(Mode::Gold).await.unwrap_err();
    match err {
        EtlError::MissingTableError { table, hint } => {
            assert_eq!(table, "fact_planet_sk");
            assert!(hint.contains("--mode dims"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = engine.run(Mode::Export).await.unwrap_err();
    match err {
        EtlError::MissingTableError { table, hint } => {
            assert_eq!(table, "gold_by_discoverymethod");
            assert!(hint.contains("--mode gold"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_raw_csv_without_endpoint_fails() {
    let root = TempDir::new().unwrap();
    let settings = PipelineSettings {
        db_path: root.path().join("data/exoplanets.db"),
        raw_csv: root.path().join("data/raw/pscomppars.csv"),
        artifacts_dir: root.path().join("artifacts"),
        ..PipelineSettings::default()
    };

    let engine = engine_for(&settings);
    let err = engine.run(Mode::Ingest).await.unwrap_err();
    assert!(matches!(err, EtlError::MissingInputError { .. }));
}

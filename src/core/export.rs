use crate::core::db::{Db, DbObject};
use crate::core::gold::{GOLD_BY_HOST, GOLD_BY_METHOD};
use crate::domain::model::RunManifest;
use crate::utils::error::Result;
use chrono::Utc;
use rusqlite::types::Value;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const MANIFEST_FILE: &str = "manifest.json";

pub const GOLD_HINT: &str = "Run --mode gold first (or --mode all).";

pub fn require_gold_views(db: &Db) -> Result<()> {
    db.require(DbObject::View, GOLD_BY_METHOD, GOLD_HINT)?;
    db.require(DbObject::View, GOLD_BY_HOST, GOLD_HINT)?;
    Ok(())
}

/// Render a gold view as CSV with a header row. NULLs become empty fields.
pub fn view_to_csv(db: &Db, view: &str) -> Result<Vec<u8>> {
    let mut stmt = db.conn().prepare(&format!("SELECT * FROM {}", view))?;
    let column_names: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = column_names.len();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&column_names)?;

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut record = Vec::with_capacity(column_count);
        for i in 0..column_count {
            record.push(field_to_string(row.get::<_, Value>(i)?));
        }
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(bytes)
}

fn field_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

pub fn render_manifest(manifest: &RunManifest) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(manifest)?)
}

pub fn new_manifest(
    pipeline: &str,
    version: &str,
    artifacts: Vec<String>,
    row_counts: Vec<(String, u64)>,
) -> RunManifest {
    RunManifest {
        pipeline: pipeline.to_string(),
        version: version.to_string(),
        generated_at: Utc::now(),
        artifacts,
        row_counts,
    }
}

/// Bundle exported artifacts into a single ZIP.
pub fn bundle_artifacts(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for (name, data) in entries {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

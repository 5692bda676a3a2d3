use crate::utils::error::{EtlError, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbObject {
    Table,
    View,
}

impl DbObject {
    fn keyword(self) -> &'static str {
        match self {
            DbObject::Table => "TABLE",
            DbObject::View => "VIEW",
        }
    }

    fn kind(self) -> &'static str {
        match self {
            DbObject::Table => "table",
            DbObject::View => "view",
        }
    }
}

/// Thin wrapper around a `rusqlite::Connection`. Blocking; stages open one
/// inside `spawn_blocking`.
pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: &Path, busy_timeout_ms: u64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Drop a table or view if present. With foreign-key style dependencies,
    /// dependents must be dropped before the objects they reference.
    pub fn drop_if_exists(&self, object: DbObject, name: &str) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP {} IF EXISTS {}", object.keyword(), name))?;
        Ok(())
    }

    pub fn object_exists(&self, object: DbObject, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
            (object.kind(), name),
            |row| row.get(0),
        )?;
        Ok(count == 1)
    }

    /// Stage gating: fail with a hint naming the mode to run first.
    pub fn require(&self, object: DbObject, name: &str, hint: &str) -> Result<()> {
        if self.object_exists(object, name)? {
            Ok(())
        } else {
            Err(EtlError::MissingTableError {
                table: name.to_string(),
                hint: hint.to_string(),
            })
        }
    }

    pub fn count(&self, object: &str) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", object), [], |row| {
                row.get(0)
            })?;
        Ok(n as u64)
    }
}

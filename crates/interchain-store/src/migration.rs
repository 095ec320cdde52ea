//! Schema versions for the SQLite backend.
//!
//! `MIGRATIONS[i]` upgrades a database from version `i` to `i + 1`. The
//! applied version lives in `PRAGMA user_version`, so a fresh file reads 0.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

const MIGRATIONS: &[&str] = &[
    // v1: ordered key-value table. BLOB keys compare with memcmp, which is
    // the byte order the channel key layout is built on.
    "CREATE TABLE kv (
        key BLOB PRIMARY KEY,
        value BLOB NOT NULL
    ) WITHOUT ROWID;",
];

/// Schema version written by this build.
pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

/// Bring `conn` up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{found} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    let tx = conn.transaction()?;
    for (version, sql) in MIGRATIONS.iter().enumerate().skip(found as usize) {
        tx.execute_batch(sql)?;
        tracing::debug!(version = version + 1, "applied schema migration");
    }
    tx.pragma_update(None, "user_version", CURRENT_VERSION)?;
    tx.commit()?;
    Ok(())
}

//! SQLite-backed artifact store.
//!
//! Names are `<kind>_<source>_<session-or-now>`. A name that exists on disk,
//! or that this process deleted, gets a `-2`, `-3`, ... suffix, so a `put`
//! never overwrites or resurrects an earlier artifact. All writes go through
//! one connection lock, which serializes name selection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use genforge_core::{ArtifactKind, Error, ProducedBy, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::*;

const DB_FILE: &str = "artifacts.db";

/// Durable artifact store.
pub struct ArtifactStore {
    inner: Mutex<StoreInner>,
    db_path: PathBuf,
}

struct StoreInner {
    conn: Connection,
    /// Names deleted by this process. Live names are found on disk.
    deleted: HashSet<String>,
}

impl ArtifactStore {
    /// Open or create the store in `db_dir` (file `artifacts.db`).
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join(DB_FILE);

        let conn = Connection::open(&db_path).map_err(|e| Error::Database(e.to_string()))?;
        // synchronous=FULL: a committed put survives power loss.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        ensure_prompt_column(&conn)
            .map_err(|e| Error::Database(format!("Schema upgrade failed: {}", e)))?;

        let store = Self {
            inner: Mutex::new(StoreInner {
                conn,
                deleted: HashSet::new(),
            }),
            db_path,
        };

        info!(
            "ArtifactStore initialized: {} artifacts, path={}",
            store.count()?,
            store.db_path.display()
        );

        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Persist a new artifact under a fresh, unique name.
    ///
    /// Every failure is reported as [`Error::ArtifactWrite`].
    pub fn put(&self, new: NewArtifact) -> Result<ArtifactInfo> {
        let created_at = chrono::Utc::now().timestamp_millis();
        let disambiguator = match &new.session_id {
            Some(s) if !s.is_empty() => s.clone(),
            _ => chrono::Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or(created_at)
                .to_string(),
        };
        let base = base_name(new.kind, &new.source, &disambiguator);
        let digest = hex::encode(Sha256::digest(&new.body));
        let produced_by_json = serde_json::to_string(&new.produced_by)
            .map_err(|e| Error::ArtifactWrite(e.to_string()))?;

        let mut inner = self.inner.lock();
        let name = inner.next_free_name(&base)?;

        inner
            .conn
            .prepare_cached(
                "INSERT INTO artifacts
                    (name, kind, source, session_id, body, size, digest, content_type, produced_by_json, created_at, prompt)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )
            .and_then(|mut stmt| {
                stmt.execute(params![
                    name,
                    new.kind.as_str(),
                    new.source,
                    new.session_id,
                    new.body,
                    new.body.len() as i64,
                    digest,
                    new.content_type,
                    produced_by_json,
                    created_at,
                    new.prompt,
                ])
            })
            .map_err(|e| Error::ArtifactWrite(format!("{}: {}", name, e)))?;
        drop(inner);

        debug!("Stored artifact {} ({} bytes)", name, new.body.len());

        Ok(ArtifactInfo {
            name,
            kind: new.kind,
            source: new.source,
            session_id: new.session_id,
            size: new.body.len(),
            digest,
            content_type: new.content_type,
            produced_by: new.produced_by,
            created_at,
            prompt: new.prompt,
        })
    }

    /// Fetch an artifact with its body.
    pub fn get(&self, name: &str) -> Result<Option<Artifact>> {
        let inner = self.inner.lock();
        let mut stmt = inner
            .conn
            .prepare_cached(&format!("SELECT {}, body FROM artifacts WHERE name = ?1", INFO_COLUMNS))
            .map_err(|e| Error::Database(e.to_string()))?;
        stmt.query_row(params![name], |row| {
            Ok(Artifact {
                info: row_to_info(row)?,
                body: row.get(11)?,
            })
        })
        .optional()
        .map_err(|e| Error::Database(e.to_string()))
    }

    /// Most recently created artifacts, newest first.
    pub fn list(&self, limit: usize) -> Result<Vec<ArtifactInfo>> {
        let inner = self.inner.lock();
        let mut stmt = inner
            .conn
            .prepare_cached(&format!(
                "SELECT {} FROM artifacts ORDER BY created_at DESC, id DESC LIMIT ?1",
                INFO_COLUMNS
            ))
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_info)
            .map_err(|e| Error::Database(e.to_string()))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))
    }

    /// Delete an artifact by name.
    pub fn delete(&self, name: &str) -> Result<Removal> {
        let mut inner = self.inner.lock();
        let deleted = inner
            .conn
            .execute("DELETE FROM artifacts WHERE name = ?1", params![name])
            .map_err(|e| Error::Database(e.to_string()))?;
        if deleted > 0 {
            inner.deleted.insert(name.to_string());
            info!("Deleted artifact {}", name);
            Ok(Removal::Deleted)
        } else {
            Ok(Removal::NotFound)
        }
    }

    /// Number of stored artifacts.
    pub fn count(&self) -> Result<i64> {
        let inner = self.inner.lock();
        inner
            .conn
            .query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }
}

impl StoreInner {
    /// `base`, or `base-N` for the smallest N >= 2 not on disk and not deleted.
    fn next_free_name(&self, base: &str) -> Result<String> {
        let mut candidate = base.to_string();
        let mut n = 1u32;
        loop {
            if !self.deleted.contains(&candidate) && !self.exists(&candidate)? {
                return Ok(candidate);
            }
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
    }

    fn exists(&self, name: &str) -> Result<bool> {
        self.conn
            .prepare_cached("SELECT 1 FROM artifacts WHERE name = ?1")
            .and_then(|mut stmt| stmt.exists(params![name]))
            .map_err(|e| Error::ArtifactWrite(e.to_string()))
    }
}

/// Databases created before the `prompt` column existed gain it on open.
fn ensure_prompt_column(conn: &Connection) -> rusqlite::Result<()> {
    let present = conn
        .prepare("SELECT 1 FROM pragma_table_info('artifacts') WHERE name = 'prompt'")?
        .exists([])?;
    if !present {
        conn.execute_batch("ALTER TABLE artifacts ADD COLUMN prompt TEXT")?;
    }
    Ok(())
}

fn base_name(kind: ArtifactKind, source: &str, disambiguator: &str) -> String {
    format!("{}_{}_{}", kind.as_str(), source, disambiguator)
}

const INFO_COLUMNS: &str =
    "name, kind, source, session_id, size, digest, content_type, produced_by_json, created_at, id, prompt";

fn row_to_info(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArtifactInfo> {
    let kind: String = row.get(1)?;
    let produced_by_json: String = row.get(7)?;
    let size: i64 = row.get(4)?;
    Ok(ArtifactInfo {
        name: row.get(0)?,
        kind: ArtifactKind::parse(&kind).unwrap_or(ArtifactKind::Application),
        source: row.get(2)?,
        session_id: row.get(3)?,
        size: size as usize,
        digest: row.get(5)?,
        content_type: row.get(6)?,
        produced_by: serde_json::from_str::<ProducedBy>(&produced_by_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?,
        created_at: row.get(8)?,
        prompt: row.get(10)?,
    })
}

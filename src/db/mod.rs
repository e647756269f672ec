mod schema;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("migration to schema v{version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: rusqlite::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: i64,
    pub content: String,
    pub is_favorite: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The content is already stored; the store is unchanged.
    Duplicate,
    /// Empty or whitespace-only content is never stored.
    Blank,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        self == InsertOutcome::Inserted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RenameOutcome {
    Renamed,
    /// Old and new content are identical.
    Unchanged,
    /// Another clip already holds the new content.
    Collision,
    Blank,
    NotFound,
}

impl RenameOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, RenameOutcome::Renamed | RenameOutcome::Unchanged)
    }
}

/// Clip history backed by a single SQLite file.
///
/// Every operation opens its own connection, so a `ClipStore` is just a path and can be cloned
/// freely across threads. SQLite's transactions are the only concurrency guard.
#[derive(Debug, Clone)]
pub struct ClipStore {
    path: PathBuf,
}

impl ClipStore {
    pub fn new(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Every connection waits on a busy database and runs in WAL mode.
    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Ok(conn)
    }

    /// Brings the schema up to [`schema::SCHEMA_VERSION`] and returns the version reached.
    ///
    /// Must complete before any other operation. Safe to run again on an up-to-date store.
    /// A step that fails only because its column or table already exists is skipped; any other
    /// failure rolls the whole run back and is returned as [`DbError::Migration`].
    pub fn migrate(&self) -> Result<i64, DbError> {
        let mut conn = self
            .open()
            .map_err(|source| DbError::Migration { version: 0, source })?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| DbError::Migration { version: 0, source })?;
        let current: i64 = tx
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|source| DbError::Migration { version: 0, source })?;

        if current > schema::SCHEMA_VERSION {
            warn!(
                "database schema v{current} is newer than v{}, leaving it as is",
                schema::SCHEMA_VERSION
            );
        }

        let mut reached = current;
        for migration in schema::MIGRATIONS.iter().filter(|m| m.version > current) {
            match tx.execute_batch(migration.sql) {
                Ok(()) => debug!(version = migration.version, "applied schema step"),
                Err(err) if is_already_exists(&err) => {
                    debug!(version = migration.version, "schema step already present: {err}");
                }
                Err(source) => {
                    return Err(DbError::Migration {
                        version: migration.version,
                        source,
                    });
                }
            }
            tx.pragma_update(None, "user_version", migration.version)
                .map_err(|source| DbError::Migration {
                    version: migration.version,
                    source,
                })?;
            reached = migration.version;
        }

        tx.commit().map_err(|source| DbError::Migration {
            version: reached,
            source,
        })?;

        if reached != current {
            info!("database migrated from v{current} to v{reached}");
        }
        Ok(reached)
    }

    pub fn insert(&self, content: &str) -> Result<InsertOutcome, DbError> {
        if content.trim().is_empty() {
            return Ok(InsertOutcome::Blank);
        }

        let conn = self.open()?;
        let changed = conn.execute(
            "INSERT INTO clips (content) VALUES (?1) ON CONFLICT(content) DO NOTHING",
            params![content],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    /// Favorites first, then newest first. A blank filter is the same as no filter.
    pub fn fetch(&self, filter: Option<&str>) -> Result<Vec<Clip>, DbError> {
        let conn = self.open()?;
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());

        let clips = if let Some(filter) = filter {
            let mut stmt = conn.prepare(
                r"
                SELECT id, content, is_favorite, timestamp
                FROM clips
                WHERE content LIKE ?1 ESCAPE '\'
                ORDER BY is_favorite DESC, id DESC
                ",
            )?;
            let rows = stmt.query_map(params![like_pattern(filter)], clip_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = conn.prepare(
                "
                SELECT id, content, is_favorite, timestamp
                FROM clips
                ORDER BY is_favorite DESC, id DESC
                ",
            )?;
            let rows = stmt.query_map([], clip_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        Ok(clips)
    }

    #[cfg(test)]
    pub fn get(&self, content: &str) -> Result<Option<Clip>, DbError> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT id, content, is_favorite, timestamp FROM clips WHERE content = ?1",
            params![content],
            clip_from_row,
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn count(&self) -> Result<i64, DbError> {
        let conn = self.open()?;
        conn.query_row("SELECT COUNT(*) FROM clips", [], |row| row.get(0))
            .map_err(DbError::from)
    }

    /// Replaces the content of the clip holding `old`, keeping its id and favorite flag.
    pub fn update_content(&self, old: &str, new: &str) -> Result<RenameOutcome, DbError> {
        if new.trim().is_empty() {
            return Ok(RenameOutcome::Blank);
        }

        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let id: Option<i64> = tx
            .query_row(
                "SELECT id FROM clips WHERE content = ?1",
                params![old],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = id else {
            return Ok(RenameOutcome::NotFound);
        };
        if old == new {
            return Ok(RenameOutcome::Unchanged);
        }

        let taken: Option<i64> = tx
            .query_row(
                "SELECT id FROM clips WHERE content = ?1 AND id != ?2",
                params![new, id],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Ok(RenameOutcome::Collision);
        }

        match tx.execute(
            "UPDATE clips SET content = ?1 WHERE id = ?2",
            params![new, id],
        ) {
            Ok(_) => {}
            Err(err) if is_constraint_violation(&err) => return Ok(RenameOutcome::Collision),
            Err(err) => return Err(err.into()),
        }
        tx.commit()?;
        Ok(RenameOutcome::Renamed)
    }

    /// Flips the favorite flag and returns the new value, or `None` when no clip matches.
    pub fn toggle_favorite(&self, content: &str) -> Result<Option<bool>, DbError> {
        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<Option<i64>> = tx
            .query_row(
                "SELECT is_favorite FROM clips WHERE content = ?1",
                params![content],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Ok(None);
        };

        let next = current.unwrap_or(0) == 0;
        tx.execute(
            "UPDATE clips SET is_favorite = ?1 WHERE content = ?2",
            params![i64::from(next), content],
        )?;
        tx.commit()?;
        Ok(Some(next))
    }

    /// Returns whether a clip was removed.
    pub fn delete(&self, content: &str) -> Result<bool, DbError> {
        let conn = self.open()?;
        let removed = conn.execute("DELETE FROM clips WHERE content = ?1", params![content])?;
        Ok(removed > 0)
    }
}

fn clip_from_row(row: &Row<'_>) -> Result<Clip, rusqlite::Error> {
    Ok(Clip {
        id: row.get(0)?,
        content: row.get(1)?,
        is_favorite: row.get::<_, Option<i64>>(2)?.unwrap_or(0) != 0,
        timestamp: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

fn like_pattern(filter: &str) -> String {
    let mut pattern = String::with_capacity(filter.len() + 2);
    pattern.push('%');
    for ch in filter.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn is_already_exists(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            message.contains("duplicate column name") || message.contains("already exists")
        }
        _ => false,
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

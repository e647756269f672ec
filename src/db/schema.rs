pub const CREATE_CLIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clips (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  content TEXT NOT NULL UNIQUE CHECK (length(content) > 0),
  timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

pub const ADD_FAVORITE_COLUMN: &str =
    "ALTER TABLE clips ADD COLUMN is_favorite INTEGER NOT NULL DEFAULT 0;";

pub const CREATE_INDEX_FAVORITE: &str =
    "CREATE INDEX IF NOT EXISTS idx_clips_favorite ON clips(is_favorite DESC, id DESC);";

/// One schema step. `version` is written to `PRAGMA user_version` once `sql` has run.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: CREATE_CLIPS_TABLE,
    },
    Migration {
        version: 2,
        sql: ADD_FAVORITE_COLUMN,
    },
    Migration {
        version: 3,
        sql: CREATE_INDEX_FAVORITE,
    },
];

pub const SCHEMA_VERSION: i64 = 3;

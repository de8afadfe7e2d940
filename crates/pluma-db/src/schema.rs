//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. The post category enum is stored as a
//! string with an ASSERT constraint, so an out-of-enum value can never
//! reach disk even if a caller bypasses service-level validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD bio ON TABLE user TYPE option<string> \
    ASSERT $value = NONE OR string::len($value) <= 500;
DEFINE FIELD dob ON TABLE user TYPE datetime;
DEFINE FIELD gender ON TABLE user TYPE option<string>;
DEFINE FIELD country ON TABLE user TYPE option<string>;
DEFINE FIELD category ON TABLE user TYPE option<string>;
DEFINE FIELD profile_pic ON TABLE user TYPE option<string>;
DEFINE FIELD social_links ON TABLE user TYPE array<string> DEFAULT [];
DEFINE FIELD terms_accepted ON TABLE user TYPE bool ASSERT $value = true;
DEFINE FIELD followers ON TABLE user TYPE array<string> DEFAULT [];
DEFINE FIELD following ON TABLE user TYPE array<string> DEFAULT [];
DEFINE FIELD bookmarks ON TABLE user TYPE array<string> DEFAULT [];
DEFINE FIELD follower_count ON TABLE user TYPE int DEFAULT 0;
DEFINE FIELD following_count ON TABLE user TYPE int DEFAULT 0;
DEFINE FIELD post_count ON TABLE user TYPE int DEFAULT 0;
DEFINE FIELD reset_token_hash ON TABLE user TYPE option<string>;
DEFINE FIELD reset_token_expires_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Posts
-- =======================================================================
DEFINE TABLE post SCHEMAFULL;
DEFINE FIELD title ON TABLE post TYPE string;
DEFINE FIELD slug ON TABLE post TYPE string;
DEFINE FIELD content ON TABLE post TYPE string;
DEFINE FIELD category ON TABLE post TYPE string \
    ASSERT $value IN ['technology', 'lifestyle', 'travel', 'food', \
    'health', 'business', 'entertainment', 'education'];
DEFINE FIELD tags ON TABLE post TYPE array<string> DEFAULT [];
DEFINE FIELD image ON TABLE post TYPE option<string>;
DEFINE FIELD author ON TABLE post TYPE string;
DEFINE FIELD is_published ON TABLE post TYPE bool DEFAULT true;
DEFINE FIELD likes ON TABLE post TYPE array<string> DEFAULT [];
DEFINE FIELD comments ON TABLE post TYPE array<string> DEFAULT [];
DEFINE FIELD view_count ON TABLE post TYPE int DEFAULT 0;
DEFINE FIELD share_count ON TABLE post TYPE int DEFAULT 0;
DEFINE FIELD bookmarks_count ON TABLE post TYPE int DEFAULT 0;
DEFINE FIELD reading_time ON TABLE post TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE post TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE post TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_post_slug ON TABLE post COLUMNS slug UNIQUE;
DEFINE INDEX idx_post_author ON TABLE post COLUMNS author;
DEFINE INDEX idx_post_category ON TABLE post COLUMNS category;

-- =======================================================================
-- Comments
-- =======================================================================
DEFINE TABLE comment SCHEMAFULL;
DEFINE FIELD content ON TABLE comment TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD author ON TABLE comment TYPE string;
DEFINE FIELD post ON TABLE comment TYPE string;
DEFINE FIELD created_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_post ON TABLE comment COLUMNS post;
DEFINE INDEX idx_comment_author ON TABLE comment COLUMNS author;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

//! Database operations for the single-row sync state table.

use rentx_engine::{SchemaVersion, Version};
use sqlx::{SqliteConnection, SqlitePool};

/// The stored sync state row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredSyncState {
    pub last_pulled_version: i64,
    pub schema_version: i64,
}

/// Read the sync state, creating it at version zero on first launch.
pub async fn ensure_sync_state(
    pool: &SqlitePool,
    schema_version: SchemaVersion,
) -> Result<StoredSyncState, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO sync_state (id, last_pulled_version, schema_version)
        VALUES (1, 0, $1)
        "#,
    )
    .bind(i64::from(schema_version))
    .execute(pool)
    .await?;

    sqlx::query_as::<_, StoredSyncState>(
        r#"SELECT last_pulled_version, schema_version FROM sync_state WHERE id = 1"#,
    )
    .fetch_one(pool)
    .await
}

/// Store a new pull watermark.
pub async fn set_last_pulled_version(
    conn: &mut SqliteConnection,
    version: Version,
) -> Result<(), sqlx::Error> {
    let version = i64::try_from(version).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
    sqlx::query(r#"UPDATE sync_state SET last_pulled_version = $1 WHERE id = 1"#)
        .bind(version)
        .execute(conn)
        .await?;

    Ok(())
}

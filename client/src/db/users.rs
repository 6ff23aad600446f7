//! Database operations for the users table.

use rentx_engine::User;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// A stored user row from the database.
#[derive(Debug)]
pub struct StoredUser {
    pub local_id: String,
    pub remote_id: String,
    pub email: String,
    pub name: String,
    pub driver_license: String,
    pub avatar_uri: String,
    pub session_token: String,
    pub revision: i64,
    pub pushed_revision: i64,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for StoredUser {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredUser {
            local_id: row.try_get("local_id")?,
            remote_id: row.try_get("remote_id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            driver_license: row.try_get("driver_license")?,
            avatar_uri: row.try_get("avatar_uri")?,
            session_token: row.try_get("session_token")?,
            revision: row.try_get("revision")?,
            pushed_revision: row.try_get("pushed_revision")?,
        })
    }
}

impl StoredUser {
    /// Convert database row to an engine User.
    pub fn to_user(&self) -> User {
        User {
            local_id: self.local_id.clone(),
            remote_id: self.remote_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            driver_license: self.driver_license.clone(),
            avatar_uri: self.avatar_uri.clone(),
            session_token: self.session_token.clone(),
            revision: self.revision as u64,
            pushed_revision: self.pushed_revision as u64,
        }
    }
}

/// Get the resident user row, if any.
pub async fn find_user(pool: &SqlitePool) -> Result<Option<StoredUser>, sqlx::Error> {
    sqlx::query_as::<_, StoredUser>(
        r#"
        SELECT local_id, remote_id, email, name, driver_license, avatar_uri,
               session_token, revision, pushed_revision
        FROM users
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

/// Insert a new user. Fails on the slot constraint if one already exists.
pub async fn insert_user(conn: &mut SqliteConnection, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (
            local_id, remote_id, email, name, driver_license, avatar_uri,
            session_token, revision, pushed_revision
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&user.local_id)
    .bind(&user.remote_id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.driver_license)
    .bind(&user.avatar_uri)
    .bind(&user.session_token)
    .bind(user.revision as i64)
    .bind(user.pushed_revision as i64)
    .execute(conn)
    .await?;

    Ok(())
}

/// Overwrite the mutable columns of an existing user.
///
/// Returns the number of rows changed (0 or 1).
pub async fn update_user(conn: &mut SqliteConnection, user: &User) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            email = $2,
            name = $3,
            driver_license = $4,
            avatar_uri = $5,
            session_token = $6,
            revision = $7,
            pushed_revision = $8
        WHERE local_id = $1
        "#,
    )
    .bind(&user.local_id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.driver_license)
    .bind(&user.avatar_uri)
    .bind(&user.session_token)
    .bind(user.revision as i64)
    .bind(user.pushed_revision as i64)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Delete a user permanently. Returns the number of rows removed.
pub async fn delete_user(conn: &mut SqliteConnection, local_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM users WHERE local_id = $1"#)
        .bind(local_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

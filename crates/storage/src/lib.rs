use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use shared::protocol::Session;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Scope under which the signed-in session is kept.
pub const DEFAULT_SESSION_SCOPE: &str = "current";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session: Session,
    pub stored_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let storage = Self { pool };
        storage.ensure_session_table().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_session_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                scope      TEXT PRIMARY KEY NOT NULL,
                token      TEXT NOT NULL,
                user_json  TEXT NOT NULL,
                stored_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure sessions table exists")?;
        Ok(())
    }

    /// Replaces whatever session is stored under `scope`.
    pub async fn store_session(&self, scope: &str, session: &Session) -> Result<()> {
        let user_json =
            serde_json::to_string(&session.user).context("failed to encode session user")?;
        sqlx::query(
            r#"
            INSERT INTO sessions (scope, token, user_json, stored_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(scope) DO UPDATE SET
                token = excluded.token,
                user_json = excluded.user_json,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(scope)
        .bind(&session.token)
        .bind(user_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store session for scope '{scope}'"))?;
        debug!(scope, user_id = session.user.id.0, "session stored");
        Ok(())
    }

    pub async fn load_session(&self, scope: &str) -> Result<Option<StoredSession>> {
        let row = sqlx::query("SELECT token, user_json, stored_at FROM sessions WHERE scope = ?1")
            .bind(scope)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load session for scope '{scope}'"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let token: String = row.try_get("token")?;
        let user_json: String = row.try_get("user_json")?;
        let stored_at: DateTime<Utc> = row.try_get("stored_at")?;
        let user = serde_json::from_str(&user_json)
            .with_context(|| format!("corrupt session user for scope '{scope}'"))?;

        Ok(Some(StoredSession {
            session: Session { token, user },
            stored_at,
        }))
    }

    /// Returns whether a session was present.
    pub async fn clear_session(&self, scope: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE scope = ?1")
            .bind(scope)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to clear session for scope '{scope}'"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

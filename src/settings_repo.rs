// SQLite settings store. Values are JSON documents under fixed keys.

use crate::models::DisplaySettings;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

const KEY_DISPLAY: &str = "display";
const KEY_STATUS_BAR_ENABLED: &str = "status_bar_enabled";

pub struct SettingsRepo {
    pool: SqlitePool,
}

impl SettingsRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size.max(1))
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Saved display settings, or None when nothing was saved yet.
    #[instrument(skip(self), fields(repo = "settings", operation = "load_display"))]
    pub async fn load_display(&self) -> anyhow::Result<Option<DisplaySettings>> {
        match self.get(KEY_DISPLAY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Validates and stores the settings.
    #[instrument(skip(self, settings), fields(repo = "settings", operation = "save_display"))]
    pub async fn save_display(&self, settings: &DisplaySettings) -> anyhow::Result<()> {
        settings.validate()?;
        self.put(KEY_DISPLAY, &serde_json::to_string(settings)?)
            .await
    }

    /// Forgets saved display settings so callers fall back to config defaults.
    #[instrument(skip(self), fields(repo = "settings", operation = "reset_display"))]
    pub async fn reset_display(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = $1")
            .bind(KEY_DISPLAY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mirrors the indicator pause state (enabled = not paused).
    #[instrument(skip(self), fields(repo = "settings", operation = "save_status_bar_enabled"))]
    pub async fn save_status_bar_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        self.put(KEY_STATUS_BAR_ENABLED, &serde_json::to_string(&enabled)?)
            .await
    }

    /// Last mirrored pause state; true when never written.
    pub async fn load_status_bar_enabled(&self) -> anyhow::Result<bool> {
        match self.get(KEY_STATUS_BAR_ENABLED).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(true),
        }
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn put(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;
        tracing::debug!(key, "setting saved");
        Ok(())
    }
}

//! Playback preferences persisted in SQLite

use bridge_traits::{
    error::{BridgeError, Result},
    preferences::{PlaybackPreferences, PreferenceSource, ReconnectMode},
};
use sqlx::{
    sqlite::{SqlitePool, SqlitePoolOptions},
    Row,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

const KEY_CONNECT_TIMEOUT: &str = "player.connect_timeout_ms";
const KEY_TUNNELING: &str = "player.tunneling";
const KEY_RECONNECT_MODE: &str = "player.reconnect_mode";

/// SQLite-backed preference store
///
/// Values live in a typed key/value table. Every setter writes through to
/// the database first and only then publishes the new value to subscribers,
/// so observers never see a value that failed to persist.
pub struct SqlitePreferenceStore {
    pool: SqlitePool,
    tx: watch::Sender<PlaybackPreferences>,
}

impl SqlitePreferenceStore {
    /// Open (or create) the store at `db_path`.
    pub async fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        // SQLite URLs use forward slashes on every platform
        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        let store = Self::with_pool(pool).await?;
        debug!(path = ?db_path, "Initialized preference store");
        Ok(store)
    }

    /// In-memory store (for testing)
    pub async fn in_memory() -> Result<Self> {
        // Each SQLite memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to connect to DB: {}", e)))?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                value_type TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to create table: {}", e)))?;

        let initial = Self::load(&pool).await?;
        let (tx, _rx) = watch::channel(initial);
        Ok(Self { pool, tx })
    }

    /// Reads all preferences, falling back to defaults for missing,
    /// mistyped or unparsable entries. Only a failing query is an error.
    async fn load(pool: &SqlitePool) -> Result<PlaybackPreferences> {
        let defaults = PlaybackPreferences::default();

        let connect_timeout = match Self::get_value(pool, KEY_CONNECT_TIMEOUT, "i64").await? {
            Some(raw) => match raw.parse::<u64>() {
                Ok(millis) => Duration::from_millis(millis),
                Err(e) => {
                    warn!(key = KEY_CONNECT_TIMEOUT, error = %e, "Ignoring unreadable preference");
                    defaults.connect_timeout
                }
            },
            None => defaults.connect_timeout,
        };

        let tunneling = match Self::get_value(pool, KEY_TUNNELING, "bool").await? {
            Some(raw) => raw.parse::<bool>().unwrap_or_else(|e| {
                warn!(key = KEY_TUNNELING, error = %e, "Ignoring unreadable preference");
                defaults.tunneling
            }),
            None => defaults.tunneling,
        };

        let reconnect_mode = match Self::get_value(pool, KEY_RECONNECT_MODE, "string").await? {
            Some(raw) => parse_reconnect_mode(&raw).unwrap_or_else(|| {
                warn!(key = KEY_RECONNECT_MODE, value = %raw, "Ignoring unknown reconnect mode");
                defaults.reconnect_mode
            }),
            None => defaults.reconnect_mode,
        };

        Ok(PlaybackPreferences {
            connect_timeout,
            tunneling,
            reconnect_mode,
        })
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    async fn set_value(&self, key: &str, value: &str, value_type: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, value_type, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                value_type = excluded.value_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(value_type)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::Storage(format!("Failed to store preference: {}", e)))?;

        debug!(key = key, value_type = value_type, "Stored preference");
        Ok(())
    }

    async fn get_value(
        pool: &SqlitePool,
        key: &str,
        expected_type: &str,
    ) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value, value_type FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to read preference: {}", e)))?;

        match row {
            Some(row) => {
                let value: String = row.get(0);
                let value_type: String = row.get(1);

                if value_type != expected_type {
                    warn!(
                        key = key,
                        expected = expected_type,
                        actual = value_type,
                        "Ignoring preference with mismatched type"
                    );
                    return Ok(None);
                }

                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn publish<F>(&self, f: F)
    where
        F: FnOnce(&mut PlaybackPreferences),
    {
        self.tx.send_if_modified(|current| {
            let before = *current;
            f(current);
            before != *current
        });
    }

    pub async fn set_connect_timeout(&self, timeout: Duration) -> Result<()> {
        let millis = timeout.as_millis().to_string();
        self.set_value(KEY_CONNECT_TIMEOUT, &millis, "i64").await?;
        self.publish(|p| p.connect_timeout = timeout);
        Ok(())
    }

    pub async fn set_tunneling(&self, enabled: bool) -> Result<()> {
        self.set_value(KEY_TUNNELING, &enabled.to_string(), "bool")
            .await?;
        self.publish(|p| p.tunneling = enabled);
        Ok(())
    }

    pub async fn set_reconnect_mode(&self, mode: ReconnectMode) -> Result<()> {
        self.set_value(KEY_RECONNECT_MODE, reconnect_mode_str(mode), "string")
            .await?;
        self.publish(|p| p.reconnect_mode = mode);
        Ok(())
    }

    /// Writes all three values in one transaction and publishes once.
    pub async fn set_all(&self, preferences: PlaybackPreferences) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to begin transaction: {}", e)))?;

        let millis = preferences.connect_timeout.as_millis().to_string();
        let tunneling = preferences.tunneling.to_string();
        let entries = [
            (KEY_CONNECT_TIMEOUT, millis.as_str(), "i64"),
            (KEY_TUNNELING, tunneling.as_str(), "bool"),
            (
                KEY_RECONNECT_MODE,
                reconnect_mode_str(preferences.reconnect_mode),
                "string",
            ),
        ];

        for (key, value, value_type) in entries {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, value_type, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    value_type = excluded.value_type,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(value_type)
            .bind(Self::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to store preference: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to commit: {}", e)))?;

        debug!("Committed playback preferences");
        self.publish(|p| *p = preferences);
        Ok(())
    }
}

impl PreferenceSource for SqlitePreferenceStore {
    fn current(&self) -> PlaybackPreferences {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<PlaybackPreferences> {
        self.tx.subscribe()
    }
}

fn reconnect_mode_str(mode: ReconnectMode) -> &'static str {
    match mode {
        ReconnectMode::None => "NONE",
        ReconnectMode::Reconnect => "RECONNECT",
    }
}

fn parse_reconnect_mode(raw: &str) -> Option<ReconnectMode> {
    match raw {
        "NONE" => Some(ReconnectMode::None),
        "RECONNECT" => Some(ReconnectMode::Reconnect),
        _ => None,
    }
}

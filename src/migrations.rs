//! Schema migrations.
//!
//! Versioned SQL scripts live in `migrations/` and are embedded at compile
//! time. Applied versions are tracked in the `database_migrations` table.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Row};
use tracing::{debug, error, info};

use crate::error::{OrganizerError, Result};

/// A versioned schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Zero-padded version, e.g. `"004"`.
    pub version: &'static str,
    /// Human-readable summary.
    pub description: &'static str,
    /// SQL applying the change.
    pub up: &'static str,
    /// SQL reverting the change.
    pub down: &'static str,
}

/// Registered migrations in version order.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        description: "Create artists and videos",
        up: include_str!("../migrations/001_initial_schema.up.sql"),
        down: include_str!("../migrations/001_initial_schema.down.sql"),
    },
    Migration {
        version: "002",
        description: "Create users and settings",
        up: include_str!("../migrations/002_users_and_settings.up.sql"),
        down: include_str!("../migrations/002_users_and_settings.down.sql"),
    },
    Migration {
        version: "003",
        description: "Create playlists",
        up: include_str!("../migrations/003_playlists.up.sql"),
        down: include_str!("../migrations/003_playlists.down.sql"),
    },
    Migration {
        version: "004",
        description: "Add thumbnail_url to videos",
        up: include_str!("../migrations/004_video_thumbnails.up.sql"),
        down: include_str!("../migrations/004_video_thumbnails.down.sql"),
    },
    Migration {
        version: "005",
        description: "Index videos by status",
        up: include_str!("../migrations/005_video_status_index.up.sql"),
        down: include_str!("../migrations/005_video_status_index.down.sql"),
    },
];

const CREATE_TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS database_migrations (\
       version VARCHAR(10) PRIMARY KEY,\
       description VARCHAR(255),\
       applied_at DATETIME,\
       applied_by VARCHAR(100)\
     )";

/// A row of the tracking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedMigration {
    pub version: String,
    pub description: String,
    pub applied_at: DateTime<Utc>,
    pub applied_by: String,
}

/// A registered migration that has not been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMigration {
    pub version: String,
    pub description: String,
}

/// Applied and pending migrations.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    /// Highest applied version.
    pub current_version: Option<String>,
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<PendingMigration>,
}

impl MigrationStatus {
    /// Check if nothing is pending.
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Open (creating if needed) the SQLite database at `url`.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    debug!("Connected to {}", url);
    Ok(pool)
}

/// Applies and rolls back [`Migration`]s against a pool.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    pool: SqlitePool,
    applied_by: String,
    migrations: Vec<Migration>,
}

impl MigrationRunner {
    /// Runner over the built-in migrations.
    pub fn new<S: Into<String>>(pool: SqlitePool, applied_by: S) -> Self {
        Self {
            pool,
            applied_by: applied_by.into(),
            migrations: MIGRATIONS.to_vec(),
        }
    }

    /// Replace the registered migrations.
    pub fn with_migrations(mut self, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by(|a, b| a.version.cmp(b.version));
        self.migrations = migrations;
        self
    }

    /// Underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_table(&self) -> Result<()> {
        self.pool.execute(CREATE_TRACKING_TABLE).await?;
        Ok(())
    }

    async fn applied(&self) -> Result<Vec<AppliedMigration>> {
        self.ensure_table().await?;
        let rows = sqlx::query(
            "SELECT version, description, applied_at, applied_by \
             FROM database_migrations ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut applied = Vec::with_capacity(rows.len());
        for row in rows {
            applied.push(AppliedMigration {
                version: row.try_get("version")?,
                description: row
                    .try_get::<Option<String>, _>("description")?
                    .unwrap_or_default(),
                applied_at: row.try_get("applied_at")?,
                applied_by: row
                    .try_get::<Option<String>, _>("applied_by")?
                    .unwrap_or_default(),
            });
        }
        Ok(applied)
    }

    /// Report applied and pending migrations.
    pub async fn status(&self) -> Result<MigrationStatus> {
        let applied = self.applied().await?;
        let applied_versions: HashSet<&str> = applied.iter().map(|m| m.version.as_str()).collect();

        let pending = self
            .migrations
            .iter()
            .filter(|m| !applied_versions.contains(m.version))
            .map(|m| PendingMigration {
                version: m.version.to_string(),
                description: m.description.to_string(),
            })
            .collect();

        Ok(MigrationStatus {
            current_version: applied.last().map(|m| m.version.clone()),
            applied,
            pending,
        })
    }

    /// Apply every pending migration in version order.
    ///
    /// Each migration runs in its own transaction together with its tracking
    /// row; the first failure stops the run. Returns the applied versions.
    pub async fn run_pending(&self) -> Result<Vec<String>> {
        let status = self.status().await?;
        let mut done = Vec::new();

        for pending in &status.pending {
            let Some(migration) = self.find(&pending.version) else {
                continue;
            };
            info!(
                target: "mvorg",
                event = "migration_apply",
                version = migration.version,
                description = migration.description
            );

            let mut tx = self.pool.begin().await?;
            execute_script(&mut tx, migration.version, migration.up).await?;
            sqlx::query(
                "INSERT INTO database_migrations (version, description, applied_at, applied_by) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(migration.version)
            .bind(migration.description)
            .bind(Utc::now())
            .bind(&self.applied_by)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            done.push(migration.version.to_string());
        }

        if done.is_empty() {
            debug!("Schema is up to date");
        } else {
            info!("Applied {} migrations", done.len());
        }
        Ok(done)
    }

    /// Roll back `version` and every later applied version, newest first.
    ///
    /// Returns the rolled-back versions.
    ///
    /// # Errors
    ///
    /// [`OrganizerError::UnknownMigration`] if `version` is not registered or
    /// not applied.
    pub async fn rollback(&self, version: &str) -> Result<Vec<String>> {
        if self.find(version).is_none() {
            return Err(OrganizerError::UnknownMigration(version.to_string()));
        }

        let applied = self.applied().await?;
        if !applied.iter().any(|m| m.version == version) {
            return Err(OrganizerError::UnknownMigration(format!(
                "{} is not applied",
                version
            )));
        }

        let mut targets: Vec<&AppliedMigration> = applied
            .iter()
            .filter(|m| m.version.as_str() >= version)
            .collect();
        targets.sort_by(|a, b| b.version.cmp(&a.version));

        let mut done = Vec::new();
        for target in targets {
            let migration = self
                .find(&target.version)
                .ok_or_else(|| OrganizerError::UnknownMigration(target.version.clone()))?;
            info!(
                target: "mvorg",
                event = "migration_rollback",
                version = migration.version
            );

            let mut tx = self.pool.begin().await?;
            execute_script(&mut tx, migration.version, migration.down).await?;
            sqlx::query("DELETE FROM database_migrations WHERE version = ?")
                .bind(migration.version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            done.push(migration.version.to_string());
        }

        info!("Rolled back {} migrations", done.len());
        Ok(done)
    }

    fn find(&self, version: &str) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }
}

/// Split a script into statements, dropping `--` comment lines.
fn statements(sql: &str) -> Vec<String> {
    let cleaned = sql
        .lines()
        .filter(|line| {
            let t = line.trim_start();
            !(t.is_empty() || t.starts_with("--"))
        })
        .collect::<Vec<_>>()
        .join("\n");

    cleaned
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let upper = s.to_ascii_uppercase();
            upper != "BEGIN" && upper != "COMMIT"
        })
        .map(str::to_string)
        .collect()
}

async fn execute_script(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: &str,
    sql: &str,
) -> Result<()> {
    for stmt in statements(sql) {
        if let Err(e) = sqlx::query(&stmt).execute(&mut **tx).await {
            error!(
                target: "mvorg",
                event = "migration_stmt_failed",
                version = version,
                error = %e
            );
            return Err(OrganizerError::Migration {
                version: version.to_string(),
                message: e.to_string(),
            });
        }
    }
    Ok(())
}

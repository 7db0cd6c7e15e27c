//! SQLite log of past resolutions

use crate::types::{Recommendation, Resolution};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

/// One stored resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub id: i64,
    pub question_id: String,
    pub recommendation: Recommendation,
    pub detail: String,
    pub fell_back: bool,
    pub resolved_at: DateTime<Utc>,
}

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resolutions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question_id TEXT NOT NULL,
                recommendation TEXT NOT NULL,
                detail TEXT NOT NULL,
                fell_back INTEGER NOT NULL DEFAULT 0,
                resolved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_resolutions_question ON resolutions(question_id, resolved_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append one resolution
    pub async fn record_resolution(&self, resolution: &Resolution) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO resolutions (question_id, recommendation, detail, fell_back, resolved_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&resolution.question_id)
        .bind(resolution.recommendation.as_str())
        .bind(&resolution.detail)
        .bind(resolution.fell_back)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to record resolution")?;

        debug!("Recorded resolution for {}", resolution.question_id);
        Ok(result.last_insert_rowid())
    }

    /// Most recent resolutions, newest first
    pub async fn recent_resolutions(&self, limit: i64) -> Result<Vec<ResolutionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, question_id, recommendation, detail, fell_back, resolved_at
            FROM resolutions
            ORDER BY resolved_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Resolutions of one question, newest first
    pub async fn resolutions_for(&self, question_id: &str, limit: i64) -> Result<Vec<ResolutionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, question_id, recommendation, detail, fell_back, resolved_at
            FROM resolutions
            WHERE question_id = ?
            ORDER BY resolved_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(question_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Latest resolution of one question
    pub async fn latest_for(&self, question_id: &str) -> Result<Option<ResolutionRecord>> {
        Ok(self.resolutions_for(question_id, 1).await?.into_iter().next())
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ResolutionRecord> {
    let recommendation: String = row.get("recommendation");
    let resolved_at: String = row.get("resolved_at");

    Ok(ResolutionRecord {
        id: row.get("id"),
        question_id: row.get("question_id"),
        recommendation: recommendation.parse()?,
        detail: row.get("detail"),
        fell_back: row.get::<i64, _>("fell_back") != 0,
        resolved_at: DateTime::parse_from_rfc3339(&resolved_at)
            .map(|d| d.with_timezone(&Utc))
            .with_context(|| format!("Bad resolved_at timestamp: {}", resolved_at))?,
    })
}

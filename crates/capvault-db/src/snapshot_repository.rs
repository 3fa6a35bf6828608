use capvault_core::error::AppError;
use capvault_core::models::{Product, Snapshot, SnapshotProduct};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use uuid::Uuid;

use crate::database::Database;

/// Repository for scrape snapshots in PostgreSQL.
///
/// Snapshots are append-only; the latest is the one with the greatest
/// `scraped_at`.
#[derive(Clone)]
pub struct SnapshotRepository {
    db: Database,
}

/// One row of snapshot history, without the product payload.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub scraped_at: DateTime<Utc>,
    pub product_count: i32,
}

impl SnapshotRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store `products` as a new snapshot and confirm it reads back.
    pub async fn save(&self, products: &[Product]) -> Result<Uuid, AppError> {
        let entries: Vec<SnapshotProduct> = products.iter().map(Product::to_entry).collect();
        let payload = serde_json::to_value(&entries)?;
        let payload = &payload;

        let id: Uuid = self
            .db
            .run(move |pool| async move {
                sqlx::query_scalar("INSERT INTO snapshots (products) VALUES ($1) RETURNING id")
                    .bind(payload)
                    .fetch_one(&pool)
                    .await
            })
            .await?;

        let stored: i64 = self
            .db
            .run(move |pool| async move {
                sqlx::query_scalar("SELECT COUNT(*) FROM snapshots WHERE id = $1")
                    .bind(id)
                    .fetch_one(&pool)
                    .await
            })
            .await?;

        if stored != 1 {
            return Err(AppError::DatabaseError(format!(
                "Snapshot {id} was not found after insert"
            )));
        }

        tracing::info!(snapshot_id = %id, products = entries.len(), "Saved snapshot");
        Ok(id)
    }

    /// Get the most recent snapshot, if any.
    pub async fn load_latest(&self) -> Result<Option<Snapshot>, AppError> {
        let row = self
            .db
            .run(|pool| async move {
                sqlx::query_as::<_, SnapshotRow>(
                    r#"
                    SELECT id, scraped_at, products
                    FROM snapshots
                    ORDER BY scraped_at DESC
                    LIMIT 1
                    "#,
                )
                .fetch_optional(&pool)
                .await
            })
            .await?;

        Ok(row.map(Into::into))
    }

    /// Snapshot history, newest first.
    pub async fn history(&self, limit: usize) -> Result<Vec<SnapshotSummary>, AppError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .run(move |pool| async move {
                sqlx::query_as::<_, SnapshotSummary>(
                    r#"
                    SELECT id, scraped_at, jsonb_array_length(products) AS product_count
                    FROM snapshots
                    ORDER BY scraped_at DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&pool)
                .await
            })
            .await
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    scraped_at: DateTime<Utc>,
    products: Json<Vec<SnapshotProduct>>,
}

impl From<SnapshotRow> for Snapshot {
    fn from(row: SnapshotRow) -> Self {
        Snapshot {
            id: row.id,
            scraped_at: row.scraped_at,
            products: row.products.0,
        }
    }
}

// -- Trait implementation --

impl capvault_core::traits::SnapshotStore for SnapshotRepository {
    async fn save(&self, products: &[Product]) -> Result<Uuid, AppError> {
        SnapshotRepository::save(self, products).await
    }

    async fn load_latest(&self) -> Result<Option<Snapshot>, AppError> {
        SnapshotRepository::load_latest(self).await
    }
}

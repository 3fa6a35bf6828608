use capvault_core::error::AppError;
use capvault_core::models::{CollectionItem, CollectionItemUpdate, NewCollectionItem};
use serde_json::{Map, Value};
use sqlx::types::Json;
use uuid::Uuid;

use crate::database::Database;

/// Repository for the user's keycap collection in PostgreSQL.
#[derive(Clone)]
pub struct KeycapRepository {
    db: Database,
}

impl KeycapRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List collection items in insertion order, optionally by vendor.
    pub async fn list(&self, vendor: Option<&str>) -> Result<Vec<CollectionItem>, AppError> {
        let rows = self
            .db
            .run(move |pool| async move {
                sqlx::query_as::<_, KeycapRow>(
                    r#"
                    SELECT id, name, vendor, attributes
                    FROM keycaps
                    WHERE ($1::VARCHAR IS NULL OR vendor = $1)
                    ORDER BY created_at, id
                    "#,
                )
                .bind(vendor)
                .fetch_all(&pool)
                .await
            })
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add an item. Returns the generated UUID.
    pub async fn insert(&self, item: &NewCollectionItem) -> Result<Uuid, AppError> {
        let id: Uuid = self
            .db
            .run(move |pool| async move {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO keycaps (name, vendor, attributes)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    "#,
                )
                .bind(&item.name)
                .bind(&item.vendor)
                .bind(Json(&item.attributes))
                .fetch_one(&pool)
                .await
            })
            .await?;

        tracing::info!(keycap_id = %id, name = %item.name, "Added keycap to collection");
        Ok(id)
    }

    /// Apply a partial update. Extra attributes are merged into the stored
    /// ones. Returns `false` if no item has this id.
    pub async fn update(&self, id: Uuid, update: &CollectionItemUpdate) -> Result<bool, AppError> {
        let result = self
            .db
            .run(move |pool| async move {
                sqlx::query(
                    r#"
                    UPDATE keycaps
                    SET name = COALESCE($2, name),
                        vendor = COALESCE($3, vendor),
                        attributes = attributes || $4
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&update.name)
                .bind(&update.vendor)
                .bind(Json(&update.attributes))
                .execute(&pool)
                .await
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an item. Returns `false` if no item has this id.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .db
            .run(move |pool| async move {
                sqlx::query("DELETE FROM keycaps WHERE id = $1")
                    .bind(id)
                    .execute(&pool)
                    .await
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct KeycapRow {
    id: Uuid,
    name: String,
    vendor: Option<String>,
    attributes: Json<Map<String, Value>>,
}

impl From<KeycapRow> for CollectionItem {
    fn from(row: KeycapRow) -> Self {
        CollectionItem {
            id: row.id,
            name: row.name,
            vendor: row.vendor,
            attributes: row.attributes.0,
        }
    }
}

// -- Trait implementation --

impl capvault_core::traits::CollectionStore for KeycapRepository {
    async fn list(&self, vendor: Option<&str>) -> Result<Vec<CollectionItem>, AppError> {
        KeycapRepository::list(self, vendor).await
    }

    async fn insert(&self, item: &NewCollectionItem) -> Result<Uuid, AppError> {
        KeycapRepository::insert(self, item).await
    }

    async fn update(&self, id: Uuid, update: &CollectionItemUpdate) -> Result<bool, AppError> {
        KeycapRepository::update(self, id, update).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        KeycapRepository::delete(self, id).await
    }
}

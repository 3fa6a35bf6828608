use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use capvault_core::models::{
    CollectionItem, CollectionItemUpdate, NewCollectionItem, Product, SnapshotProduct,
};

// ---------------------------------------------------------------------------
// Keycaps
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct KeycapQuery {
    /// Only return keycaps from this vendor.
    pub vendor: Option<String>,
}

/// A keycap in the collection. Extra fields are returned at the top level.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct KeycapResponse {
    pub id: Uuid,
    pub name: String,
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<CollectionItem> for KeycapResponse {
    fn from(item: CollectionItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            vendor: item.vendor,
            attributes: item.attributes,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateKeycapRequest {
    pub name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<CreateKeycapRequest> for NewCollectionItem {
    fn from(req: CreateKeycapRequest) -> Self {
        Self {
            name: req.name,
            vendor: req.vendor,
            attributes: req.attributes,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateKeycapRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<UpdateKeycapRequest> for CollectionItemUpdate {
    fn from(req: UpdateKeycapRequest) -> Self {
        Self {
            name: req.name,
            vendor: req.vendor,
            attributes: req.attributes,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateKeycapResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Drops
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct DropsQuery {
    /// `true` to scrape even if a stored snapshot exists.
    pub force: Option<String>,
}

impl DropsQuery {
    pub fn force(&self) -> bool {
        self.force
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// One group-buy listing. Fields only known for fresh scrapes are omitted
/// when served from a stored snapshot.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DropResponse {
    pub name: String,
    pub batch: u32,
    pub price: String,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pokemon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl From<SnapshotProduct> for DropResponse {
    fn from(p: SnapshotProduct) -> Self {
        Self {
            name: p.name,
            batch: p.batch,
            price: p.price,
            image_url: p.image_url,
            product_url: None,
            vendor: None,
            pokemon: None,
            color: None,
            scraped_at: None,
        }
    }
}

impl From<Product> for DropResponse {
    fn from(p: Product) -> Self {
        Self {
            name: p.name,
            batch: p.batch,
            price: p.price,
            image_url: p.image_url,
            product_url: Some(p.product_url),
            vendor: Some(p.vendor),
            pokemon: Some(p.pokemon),
            color: p.color,
            scraped_at: Some(p.scraped_at),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CompareResponse {
    /// Listings already in the collection.
    pub matches: Vec<DropResponse>,
    /// Listings not yet in the collection.
    pub missing: Vec<DropResponse>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DebugScraperResponse {
    pub status: String,
    pub count: usize,
    pub snapshot_id: Option<Uuid>,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    /// The run deadline fired; the partial results were not stored.
    pub timed_out: bool,
    /// First few products of the run.
    pub drops: Vec<DropResponse>,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

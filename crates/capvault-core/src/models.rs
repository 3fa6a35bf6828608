use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vendor tag stamped on every scraped product.
pub const VENDOR: &str = "s-craft";

/// Placeholder name some catalog cards render before their data loads.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// A group-buy listing extracted from one catalog card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub image_url: Option<String>,
    /// Catalog page the product was found on.
    pub product_url: String,
    /// Display text as scraped; never parsed.
    pub price: String,
    /// Stable batch number (not the vendor's section id).
    pub batch: u32,
    pub vendor: String,
    /// Name part before the `" - "` delimiter.
    pub pokemon: String,
    /// Name part after the `" - "` delimiter, if any.
    pub color: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl Product {
    /// Build a product stamped with the current time and the fixed vendor.
    pub fn new(
        name: String,
        price: String,
        image_url: Option<String>,
        product_url: String,
        batch: u32,
    ) -> Self {
        let (pokemon, color) = split_name(&name);
        Self {
            name,
            image_url,
            product_url,
            price,
            batch,
            vendor: VENDOR.to_string(),
            pokemon,
            color,
            scraped_at: Utc::now(),
        }
    }

    /// Key used for in-run deduplication: (normalized name, batch).
    pub fn dedup_key(&self) -> (String, u32) {
        (normalize_name(&self.name), self.batch)
    }

    /// The comparison-relevant subset persisted in snapshots.
    pub fn to_entry(&self) -> SnapshotProduct {
        SnapshotProduct {
            name: self.name.clone(),
            batch: self.batch,
            price: self.price.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Case-insensitive name part of the per-run dedup key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Split a vendor name such as `"Pika - Red"` into `("Pika", Some("Red"))`.
///
/// Names without the delimiter are returned whole with no color.
pub fn split_name(name: &str) -> (String, Option<String>) {
    match name.split_once(" - ") {
        Some((pokemon, color)) => {
            let color = color.trim();
            (
                pokemon.trim().to_string(),
                (!color.is_empty()).then(|| color.to_string()),
            )
        }
        None => (name.to_string(), None),
    }
}

/// Why a catalog card was dropped during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// No name selector produced non-empty text.
    MissingName,
    /// The name was the "Unknown Product" placeholder.
    PlaceholderName,
    /// No price selector produced non-empty text.
    MissingPrice,
}

impl std::fmt::Display for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Rejected::MissingName => "missing name",
            Rejected::PlaceholderName => "placeholder name",
            Rejected::MissingPrice => "missing price",
        };
        f.write_str(reason)
    }
}

/// Everything extracted from one catalog page.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// Number of candidate card fragments selected on the page.
    pub cards_found: usize,
    /// True when the primary card selectors matched nothing.
    pub used_fallback: bool,
    pub outcomes: Vec<Result<Product, Rejected>>,
}

/// A product as stored in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotProduct {
    pub name: String,
    pub batch: u32,
    pub price: String,
    pub image_url: Option<String>,
}

/// One immutable, timestamped scrape result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub scraped_at: DateTime<Utc>,
    pub products: Vec<SnapshotProduct>,
}

/// A keycap owned by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub id: Uuid,
    pub name: String,
    pub vendor: Option<String>,
    /// Free-form fields the user attached (colorway, profile, notes...).
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// DTO for inserting a keycap into the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCollectionItem {
    pub name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// Partial update for a collection item. Absent fields are left untouched;
/// attributes are merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl CollectionItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.vendor.is_none() && self.attributes.is_empty()
    }
}

/// Latest snapshot partitioned against the collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub matches: Vec<SnapshotProduct>,
    pub missing: Vec<SnapshotProduct>,
}

/// Products returned by a scrape trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Drops {
    /// Served from the latest stored snapshot; nothing was fetched.
    Stored(Snapshot),
    /// Freshly scraped. `snapshot_id` is `None` when the run found nothing
    /// or was cut short by the run deadline.
    Scraped {
        snapshot_id: Option<Uuid>,
        products: Vec<Product>,
    },
}

impl Drops {
    pub fn len(&self) -> usize {
        match self {
            Drops::Stored(snapshot) => snapshot.products.len(),
            Drops::Scraped { products, .. } => products.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

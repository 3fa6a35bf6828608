//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::catalog::PageRequest;
use crate::error::AppError;
use crate::models::{
    CollectionItem, CollectionItemUpdate, NewCollectionItem, PageExtraction, Product, Rejected,
    Snapshot, SnapshotProduct, UNKNOWN_PRODUCT,
};
use crate::traits::{CardExtractor, CollectionStore, Fetcher, SnapshotStore};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Canned response for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Html(String),
    Fail(String),
    /// Never completes; for deadline tests.
    Hang,
}

/// Mock fetcher that records every requested URL.
#[derive(Clone)]
pub struct MockFetcher {
    default: MockResponse,
    pages: Arc<Mutex<HashMap<String, MockResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Every URL returns `html`.
    pub fn new(html: &str) -> Self {
        Self::with_default(MockResponse::Html(html.to_string()))
    }

    /// Every URL fails with an HTTP error.
    pub fn failing(message: &str) -> Self {
        Self::with_default(MockResponse::Fail(message.to_string()))
    }

    fn with_default(default: MockResponse) -> Self {
        Self {
            default,
            pages: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the response for one URL.
    pub fn with_page(self, url: &str, response: MockResponse) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = {
            self.calls.lock().unwrap().push(url.to_string());
            let pages = self.pages.lock().unwrap();
            pages.get(url).cloned().unwrap_or_else(|| self.default.clone())
        };
        match response {
            MockResponse::Html(html) => Ok(html),
            MockResponse::Fail(message) => Err(AppError::HttpError(message)),
            MockResponse::Hang => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// MockCardExtractor
// ---------------------------------------------------------------------------

/// Mock extractor reading one card per line as `name|price`.
///
/// Applies the same validation gates as the HTML extractor: empty name,
/// placeholder name and empty price are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCardExtractor;

impl CardExtractor for MockCardExtractor {
    fn extract_page(&self, html: &str, page: &PageRequest) -> PageExtraction {
        let outcomes: Vec<_> = html
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (name, price) = line.split_once('|').unwrap_or((line, ""));
                let (name, price) = (name.trim(), price.trim());
                if name.is_empty() {
                    Err(Rejected::MissingName)
                } else if name == UNKNOWN_PRODUCT {
                    Err(Rejected::PlaceholderName)
                } else if price.is_empty() {
                    Err(Rejected::MissingPrice)
                } else {
                    Ok(Product::new(
                        name.to_string(),
                        price.to_string(),
                        None,
                        page.url.clone(),
                        page.batch,
                    ))
                }
            })
            .collect();

        PageExtraction {
            cards_found: outcomes.len(),
            used_fallback: false,
            outcomes,
        }
    }
}

// ---------------------------------------------------------------------------
// MockSnapshotStore
// ---------------------------------------------------------------------------

/// In-memory snapshot store.
#[derive(Clone)]
pub struct MockSnapshotStore {
    snapshots: Arc<Mutex<Vec<Snapshot>>>,
    unavailable: bool,
}

impl MockSnapshotStore {
    /// No snapshot yet.
    pub fn empty() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(Vec::new())),
            unavailable: false,
        }
    }

    /// Every call fails with `StorageUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(Vec::new())),
            unavailable: true,
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.unavailable {
            return Err(AppError::StorageUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

impl SnapshotStore for MockSnapshotStore {
    async fn save(&self, products: &[Product]) -> Result<Uuid, AppError> {
        self.check()?;
        let snapshot = Snapshot {
            id: Uuid::new_v4(),
            scraped_at: Utc::now(),
            products: products.iter().map(Product::to_entry).collect(),
        };
        let id = snapshot.id;
        self.snapshots.lock().unwrap().push(snapshot);
        Ok(id)
    }

    async fn load_latest(&self) -> Result<Option<Snapshot>, AppError> {
        self.check()?;
        let snapshots = self.snapshots.lock().unwrap();
        Ok(snapshots.iter().max_by_key(|s| s.scraped_at).cloned())
    }
}

// ---------------------------------------------------------------------------
// MockCollectionStore
// ---------------------------------------------------------------------------

/// In-memory collection store.
#[derive(Clone)]
pub struct MockCollectionStore {
    items: Arc<Mutex<Vec<CollectionItem>>>,
    list_error: Option<String>,
}

impl MockCollectionStore {
    pub fn empty() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<CollectionItem>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
            list_error: None,
        }
    }

    /// `list` fails with `StorageUnavailable`.
    pub fn with_list_error(message: &str) -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            list_error: Some(message.to_string()),
        }
    }
}

impl CollectionStore for MockCollectionStore {
    async fn list(&self, vendor: Option<&str>) -> Result<Vec<CollectionItem>, AppError> {
        if let Some(message) = &self.list_error {
            return Err(AppError::StorageUnavailable(message.clone()));
        }
        let items = self.items.lock().unwrap();
        Ok(items
            .iter()
            .filter(|item| vendor.is_none_or(|v| item.vendor.as_deref() == Some(v)))
            .cloned()
            .collect())
    }

    async fn insert(&self, item: &NewCollectionItem) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.items.lock().unwrap().push(CollectionItem {
            id,
            name: item.name.clone(),
            vendor: item.vendor.clone(),
            attributes: item.attributes.clone(),
        });
        Ok(id)
    }

    async fn update(&self, id: Uuid, update: &CollectionItemUpdate) -> Result<bool, AppError> {
        let mut items = self.items.lock().unwrap();
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        if let Some(name) = &update.name {
            item.name = name.clone();
        }
        if let Some(vendor) = &update.vendor {
            item.vendor = Some(vendor.clone());
        }
        for (key, value) in &update.attributes {
            item.attributes.insert(key.clone(), value.clone());
        }
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() < before)
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

pub fn make_product(name: &str, batch: u32) -> Product {
    Product::new(
        name.to_string(),
        "$10.00".to_string(),
        None,
        "https://vendor.example/shop?batch_id=1".to_string(),
        batch,
    )
}

pub fn make_snapshot(products: &[(&str, u32)]) -> Snapshot {
    Snapshot {
        id: Uuid::new_v4(),
        scraped_at: Utc::now(),
        products: products
            .iter()
            .map(|(name, batch)| SnapshotProduct {
                name: name.to_string(),
                batch: *batch,
                price: "$10.00".to_string(),
                image_url: None,
            })
            .collect(),
    }
}

pub fn make_collection_item(name: &str) -> CollectionItem {
    CollectionItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        vendor: Some("s-craft".to_string()),
        attributes: serde_json::Map::new(),
    }
}

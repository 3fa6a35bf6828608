use std::future::Future;

use uuid::Uuid;

use crate::catalog::PageRequest;
use crate::error::AppError;
use crate::models::{
    CollectionItem, CollectionItemUpdate, NewCollectionItem, PageExtraction, Product, Snapshot,
};

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns one catalog page into product records.
///
/// Implementations select the candidate card fragments and run field
/// extraction on each; rejected cards are reported, not raised.
pub trait CardExtractor: Send + Sync + Clone {
    fn extract_page(&self, html: &str, page: &PageRequest) -> PageExtraction;
}

/// Persists scrape runs as immutable, timestamped snapshots.
pub trait SnapshotStore: Send + Sync + Clone {
    /// Save the comparison-relevant fields of `products`. Returns the snapshot id.
    fn save(&self, products: &[Product]) -> impl Future<Output = Result<Uuid, AppError>> + Send;

    /// The snapshot with the greatest `scraped_at`, or `None` if nothing was scraped yet.
    fn load_latest(&self) -> impl Future<Output = Result<Option<Snapshot>, AppError>> + Send;
}

/// The user's keycap collection.
pub trait CollectionStore: Send + Sync + Clone {
    fn list(
        &self,
        vendor: Option<&str>,
    ) -> impl Future<Output = Result<Vec<CollectionItem>, AppError>> + Send;

    fn insert(
        &self,
        item: &NewCollectionItem,
    ) -> impl Future<Output = Result<Uuid, AppError>> + Send;

    /// Returns true if a row was modified.
    fn update(
        &self,
        id: Uuid,
        update: &CollectionItemUpdate,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Returns true if a row was deleted.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<bool, AppError>> + Send;
}

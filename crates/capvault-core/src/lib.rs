pub mod catalog;
pub mod config;
pub mod drops;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod scrape;
pub mod traits;

#[cfg(test)]
mod testutil;

pub use catalog::{BatchConfig, CatalogConfig, PageRequest};
pub use config::ScraperConfig;
pub use drops::{DropService, StoredScrape};
pub use error::AppError;
pub use models::{
    CollectionItem, CollectionItemUpdate, Drops, NewCollectionItem, PageExtraction, Product,
    Reconciliation, Rejected, Snapshot, SnapshotProduct,
};
pub use reconcile::{compare_with_collection, reconcile};
pub use scrape::{ScrapeReport, ScrapeService, ScrapeStats};
pub use traits::{CardExtractor, CollectionStore, Fetcher, SnapshotStore};

use uuid::Uuid;

use crate::error::AppError;
use crate::models::Drops;
use crate::scrape::{ScrapeReport, ScrapeService};
use crate::traits::{CardExtractor, Fetcher, SnapshotStore};

/// A finished scrape run and the snapshot it was stored as, if any.
#[derive(Debug, Clone)]
pub struct StoredScrape {
    pub report: ScrapeReport,
    pub snapshot_id: Option<Uuid>,
}

/// Serves group-buy drops: from the latest snapshot when one exists,
/// otherwise (or when forced) by scraping and persisting a new snapshot.
pub struct DropService<F, E, S>
where
    F: Fetcher,
    E: CardExtractor,
    S: SnapshotStore,
{
    scraper: ScrapeService<F, E>,
    snapshots: S,
}

impl<F, E, S> DropService<F, E, S>
where
    F: Fetcher,
    E: CardExtractor,
    S: SnapshotStore,
{
    pub fn new(scraper: ScrapeService<F, E>, snapshots: S) -> Self {
        Self { scraper, snapshots }
    }

    /// Return the current drops.
    ///
    /// Without `force`, the latest stored snapshot is returned as-is and no
    /// page is fetched. Only storage failures are returned as errors.
    pub async fn run_scrape(&self, force: bool) -> Result<Drops, AppError> {
        if !force {
            if let Some(snapshot) = self.snapshots.load_latest().await? {
                tracing::info!(
                    snapshot_id = %snapshot.id,
                    scraped_at = %snapshot.scraped_at,
                    "Serving latest stored scrape"
                );
                return Ok(Drops::Stored(snapshot));
            }
            tracing::info!("No previous scrape results found, scraping now");
        }

        let stored = self.scrape_and_store().await?;
        Ok(Drops::Scraped {
            snapshot_id: stored.snapshot_id,
            products: stored.report.products,
        })
    }

    /// Run a full scrape and persist it if anything was found.
    ///
    /// A run cut short by the deadline is returned but never stored, so it
    /// cannot replace a complete snapshot.
    pub async fn scrape_and_store(&self) -> Result<StoredScrape, AppError> {
        let report = self.scraper.run().await;
        if report.stats.timed_out {
            tracing::warn!(
                products = report.products.len(),
                pages_fetched = report.stats.pages_fetched,
                "Scrape hit the run deadline, partial results not stored"
            );
            return Ok(StoredScrape {
                report,
                snapshot_id: None,
            });
        }
        if report.products.is_empty() {
            tracing::warn!("Scrape produced no products, nothing stored");
            return Ok(StoredScrape {
                report,
                snapshot_id: None,
            });
        }

        let id = self.snapshots.save(&report.products).await?;
        tracing::info!(%id, products = report.products.len(), "Stored scrape results");
        Ok(StoredScrape {
            report,
            snapshot_id: Some(id),
        })
    }
}

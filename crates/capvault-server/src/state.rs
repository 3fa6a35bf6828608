use capvault_client::{HtmlCardExtractor, ReqwestFetcher};
use capvault_core::{AppError, DropService, ScrapeService, ScraperConfig};
use capvault_db::{Database, SnapshotRepository};

/// The drop service as wired for production: HTTP fetching, HTML card
/// extraction, PostgreSQL snapshots.
pub type LiveDropService = DropService<ReqwestFetcher, HtmlCardExtractor, SnapshotRepository>;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub scraper: ScraperConfig,
    fetcher: ReqwestFetcher,
    extractor: HtmlCardExtractor,
}

impl AppState {
    /// Build the HTTP client and card extractor once. An unusable base URL
    /// fails here rather than on the first request.
    pub fn new(db: Database, scraper: ScraperConfig) -> Result<Self, AppError> {
        let fetcher = ReqwestFetcher::with_timeout(scraper.timeout)?;
        let extractor = HtmlCardExtractor::new(&scraper.base_url)?;
        Ok(Self {
            db,
            scraper,
            fetcher,
            extractor,
        })
    }

    /// Drop service for one request. Shares the connection pool of the
    /// state's HTTP client.
    pub fn drop_service(&self) -> LiveDropService {
        let scraper =
            ScrapeService::from_config(self.fetcher.clone(), self.extractor.clone(), &self.scraper);
        DropService::new(scraper, self.db.snapshot_repo())
    }
}

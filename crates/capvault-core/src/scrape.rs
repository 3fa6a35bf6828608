use std::collections::HashSet;
use std::time::Duration;

use futures::StreamExt;

use crate::catalog::{CatalogConfig, PageRequest};
use crate::config::ScraperConfig;
use crate::models::{PageExtraction, Product};
use crate::traits::{CardExtractor, Fetcher};

/// Counters describing one scrape run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub pages_total: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub cards_found: usize,
    pub cards_rejected: usize,
    pub duplicates: usize,
    /// True if the run deadline fired before every page was processed.
    pub timed_out: bool,
}

/// Products plus run statistics.
#[derive(Debug, Clone, Default)]
pub struct ScrapeReport {
    pub products: Vec<Product>,
    pub stats: ScrapeStats,
}

/// Accumulates accepted products for one run, dropping repeated
/// (name, batch) keys.
#[derive(Debug, Default)]
struct ScrapeRun {
    seen: HashSet<(String, u32)>,
    products: Vec<Product>,
    stats: ScrapeStats,
}

impl ScrapeRun {
    fn absorb(&mut self, page: &PageRequest, extraction: PageExtraction) {
        self.stats.pages_fetched += 1;
        self.stats.cards_found += extraction.cards_found;

        if extraction.used_fallback {
            tracing::warn!(
                batch = page.batch,
                page = page.page,
                "No products matched primary card selectors, used fallback selectors"
            );
        }

        let mut accepted = 0usize;
        for outcome in extraction.outcomes {
            match outcome {
                Ok(product) => {
                    if self.seen.insert(product.dedup_key()) {
                        accepted += 1;
                        self.products.push(product);
                    } else {
                        tracing::debug!(
                            batch = page.batch,
                            name = %product.name,
                            "Skipping duplicate product"
                        );
                        self.stats.duplicates += 1;
                    }
                }
                Err(reason) => {
                    tracing::debug!(batch = page.batch, page = page.page, %reason, "Card rejected");
                    self.stats.cards_rejected += 1;
                }
            }
        }

        tracing::info!(
            batch = page.batch,
            page = page.page,
            cards = extraction.cards_found,
            accepted,
            "Processed catalog page"
        );
    }
}

/// Walks the catalog table: fetch → extract → dedup.
///
/// Generic over the fetcher and card extractor so the pipeline can be
/// exercised without network access.
pub struct ScrapeService<F, E>
where
    F: Fetcher,
    E: CardExtractor,
{
    fetcher: F,
    extractor: E,
    catalog: CatalogConfig,
    concurrency: usize,
    run_deadline: Duration,
}

impl<F, E> ScrapeService<F, E>
where
    F: Fetcher,
    E: CardExtractor,
{
    /// Create a sequential scraper over `catalog` with the default run deadline.
    pub fn new(fetcher: F, extractor: E, catalog: CatalogConfig) -> Self {
        let defaults = ScraperConfig::default();
        Self {
            fetcher,
            extractor,
            catalog,
            concurrency: defaults.concurrency,
            run_deadline: defaults.run_deadline,
        }
    }

    /// Create a scraper over the reference catalog using `config`.
    pub fn from_config(fetcher: F, extractor: E, config: &ScraperConfig) -> Self {
        Self::new(fetcher, extractor, CatalogConfig::reference(&config.base_url))
            .with_concurrency(config.concurrency)
            .with_run_deadline(config.run_deadline)
    }

    /// Fetch up to `concurrency` pages at once. Output order is unaffected.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = deadline;
        self
    }

    /// Scrape every configured page. Never fails: a fully failed run
    /// yields an empty list.
    pub async fn scrape_all(&self) -> Vec<Product> {
        self.run().await.products
    }

    /// Scrape every configured page and report run statistics.
    pub async fn run(&self) -> ScrapeReport {
        let pages = self.catalog.pages();
        let mut run = ScrapeRun::default();
        run.stats.pages_total = pages.len();

        let collect = self.collect(&pages, &mut run);
        if tokio::time::timeout(self.run_deadline, collect).await.is_err() {
            tracing::warn!(
                deadline_secs = self.run_deadline.as_secs(),
                "Scrape deadline reached, returning products gathered so far"
            );
            run.stats.timed_out = true;
        }

        tracing::info!(
            products = run.products.len(),
            pages_fetched = run.stats.pages_fetched,
            pages_failed = run.stats.pages_failed,
            rejected = run.stats.cards_rejected,
            duplicates = run.stats.duplicates,
            "Scraped unique products across all batches"
        );

        ScrapeReport {
            products: run.products,
            stats: run.stats,
        }
    }

    async fn collect(&self, pages: &[PageRequest], run: &mut ScrapeRun) {
        let fetcher = &self.fetcher;
        let mut responses = futures::stream::iter(pages)
            .map(|page| async move {
                tracing::info!(
                    batch = page.batch,
                    section_id = page.section_id,
                    page = page.page,
                    url = %page.url,
                    "Scraping catalog page"
                );
                (page, fetcher.fetch(&page.url).await)
            })
            .buffered(self.concurrency)
            .boxed();

        while let Some((page, response)) = responses.next().await {
            match response {
                Ok(html) => {
                    let extraction = self.extractor.extract_page(&html, page);
                    run.absorb(page, extraction);
                }
                Err(e) if e.is_fetch_failure() => {
                    tracing::warn!(
                        batch = page.batch,
                        page = page.page,
                        error = %e,
                        "Error fetching catalog page"
                    );
                    run.stats.pages_failed += 1;
                }
                Err(e) => {
                    tracing::error!(
                        batch = page.batch,
                        page = page.page,
                        error = %e,
                        "Unexpected fetcher error"
                    );
                    run.stats.pages_failed += 1;
                }
            }
        }
    }
}

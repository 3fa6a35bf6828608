//! The vendor catalog layout: which sections make up each batch and how
//! many pages each one spans.

/// Catalog listing the S-Craft group buys.
pub const DEFAULT_BASE_URL: &str = "https://www.s-craft.studio/shop/group-buy";

/// Batches at or above this number embed loading placeholders ahead of the
/// real product image.
pub const IMAGE_FALLBACK_BATCH: u32 = 9;

/// One catalog section as exposed to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Stable, user-facing batch number.
    pub batch: u32,
    /// The vendor's internal `batch_id` query parameter.
    pub section_id: u32,
    pub pages: u32,
}

impl BatchConfig {
    pub const fn new(batch: u32, section_id: u32, pages: u32) -> Self {
        Self {
            batch,
            section_id,
            pages,
        }
    }
}

/// Batch table of the live catalog. Section ids skip values the vendor
/// retired between releases.
pub const REFERENCE_BATCHES: &[BatchConfig] = &[
    BatchConfig::new(1, 1, 1),
    BatchConfig::new(2, 2, 1),
    BatchConfig::new(3, 3, 1),
    BatchConfig::new(4, 4, 1),
    BatchConfig::new(5, 5, 1),
    BatchConfig::new(6, 6, 1),
    BatchConfig::new(7, 7, 1),
    BatchConfig::new(8, 8, 1),
    BatchConfig::new(9, 9, 1),
    BatchConfig::new(10, 14, 1),
    BatchConfig::new(11, 18, 2),
    BatchConfig::new(12, 21, 2),
];

/// A single (batch, page) fetch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub batch: u32,
    pub section_id: u32,
    pub page: u32,
    pub url: String,
}

/// Base URL plus the batch table to walk.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub batches: Vec<BatchConfig>,
}

impl CatalogConfig {
    pub fn new(base_url: impl Into<String>, batches: Vec<BatchConfig>) -> Self {
        Self {
            base_url: base_url.into(),
            batches,
        }
    }

    /// The live catalog table against `base_url`.
    pub fn reference(base_url: impl Into<String>) -> Self {
        Self::new(base_url, REFERENCE_BATCHES.to_vec())
    }

    /// URL of one catalog page. The first page carries no `page` parameter.
    pub fn page_url(&self, section_id: u32, page: u32) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        let mut url = format!("{}{separator}batch_id={section_id}", self.base_url);
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }

    /// Every (batch, page) pair in table order.
    pub fn pages(&self) -> Vec<PageRequest> {
        self.batches
            .iter()
            .flat_map(|cfg| {
                (1..=cfg.pages).map(move |page| PageRequest {
                    batch: cfg.batch,
                    section_id: cfg.section_id,
                    page,
                    url: self.page_url(cfg.section_id, page),
                })
            })
            .collect()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::reference(DEFAULT_BASE_URL)
    }
}

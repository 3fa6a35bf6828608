use std::sync::Arc;

use capvault_core::catalog::{IMAGE_FALLBACK_BATCH, PageRequest};
use capvault_core::error::AppError;
use capvault_core::models::{PageExtraction, Product, Rejected, UNKNOWN_PRODUCT};
use capvault_core::traits::CardExtractor;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const PRIMARY_CARD_SELECTOR: &str = "div.product-item, div.product-card, div.product";
const FALLBACK_CARD_SELECTOR: &str = r#"div[class*="product"], div[class*="item"]"#;

const NAME_SELECTORS: &[&str] = &["h2", "h3", ".product-name", ".title", r#"[class*="name"]"#];
const PRICE_SELECTORS: &[&str] = &[".price", r#"[class*="price"]"#, r#"span[class*="amount"]"#];
const IMAGE_SELECTORS: &[&str] = &[
    "img.product-image",
    "img.main-image",
    r#"img[class*="product"]"#,
    r#"img[class*="main"]"#,
    "img",
];
const GENERIC_IMAGE_SELECTORS: &[&str] = &["img"];

/// URL suffixes of lazy-loading spinners and decorative placeholders.
/// Matched case-sensitively and without a leading dot.
const PLACEHOLDER_SUFFIXES: &[&str] = &["gif", "svg"];

/// One way of reading a field out of a product card.
#[derive(Debug, Clone)]
enum FieldStrategy {
    /// Trimmed text of the first matching element whose text is non-empty.
    Text(Selector),
    /// Normalized `src` of the first matching element.
    ImageSrc {
        selector: Selector,
        skip_placeholders: bool,
    },
}

impl FieldStrategy {
    fn apply(&self, card: ElementRef<'_>, base_url: &Url) -> Option<String> {
        match self {
            FieldStrategy::Text(selector) => card
                .select(selector)
                .map(|el| el.text().collect::<String>().trim().to_string())
                .find(|text| !text.is_empty()),
            FieldStrategy::ImageSrc {
                selector,
                skip_placeholders,
            } => {
                let src = card.select(selector).next()?.value().attr("src")?;
                let url = normalize_image_url(src, base_url)?;
                if *skip_placeholders && is_placeholder(&url) {
                    tracing::trace!(%url, "Skipping placeholder image");
                    return None;
                }
                Some(url)
            }
        }
    }
}

/// Evaluate strategies in order and return the first success.
fn first_success(strategies: &[FieldStrategy], card: ElementRef<'_>, base_url: &Url) -> Option<String> {
    strategies
        .iter()
        .find_map(|strategy| strategy.apply(card, base_url))
}

fn is_placeholder(url: &str) -> bool {
    PLACEHOLDER_SUFFIXES.iter().any(|suffix| url.ends_with(suffix))
}

/// Strip the query string and resolve relative paths against `base_url`.
///
/// Returns `None` for empty input or anything that does not resolve to an
/// http(s) URL (inline `data:` images, for instance).
pub fn normalize_image_url(raw: &str, base_url: &Url) -> Option<String> {
    let raw = raw.trim();
    let path = raw.split_once('?').map_or(raw, |(head, _)| head);
    if path.is_empty() {
        return None;
    }

    let resolved = if path.starts_with("http://") || path.starts_with("https://") {
        Url::parse(path).ok()?
    } else {
        base_url.join(path).ok()?
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

struct Strategies {
    primary_cards: Selector,
    fallback_cards: Selector,
    name: Vec<FieldStrategy>,
    price: Vec<FieldStrategy>,
    /// Specific-to-generic, placeholders skipped.
    image_filtered: Vec<FieldStrategy>,
    /// Single generic selector, unfiltered.
    image_generic: Vec<FieldStrategy>,
}

impl Strategies {
    fn build() -> Result<Self, AppError> {
        let text = |selectors: &[&str]| -> Result<Vec<FieldStrategy>, AppError> {
            selectors
                .iter()
                .map(|s| parse_selector(s).map(FieldStrategy::Text))
                .collect()
        };
        let image = |selectors: &[&str], skip_placeholders: bool| -> Result<Vec<FieldStrategy>, AppError> {
            selectors
                .iter()
                .map(|s| {
                    parse_selector(s).map(|selector| FieldStrategy::ImageSrc {
                        selector,
                        skip_placeholders,
                    })
                })
                .collect()
        };

        Ok(Self {
            primary_cards: parse_selector(PRIMARY_CARD_SELECTOR)?,
            fallback_cards: parse_selector(FALLBACK_CARD_SELECTOR)?,
            name: text(NAME_SELECTORS)?,
            price: text(PRICE_SELECTORS)?,
            image_filtered: image(IMAGE_SELECTORS, true)?,
            image_generic: image(GENERIC_IMAGE_SELECTORS, false)?,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, AppError> {
    Selector::parse(selector)
        .map_err(|e| AppError::Generic(format!("Invalid CSS selector '{selector}': {e:?}")))
}

/// Extracts product records from catalog HTML using ordered selector
/// fallbacks.
///
/// Name and price are mandatory; a card missing either is rejected. The
/// image is best effort: later batches get a placeholder-aware search,
/// earlier ones take the first `<img>` as-is.
pub struct HtmlCardExtractor {
    strategies: Arc<Strategies>,
    base_url: Url,
    image_fallback_batch: u32,
}

impl Clone for HtmlCardExtractor {
    fn clone(&self) -> Self {
        Self {
            strategies: Arc::clone(&self.strategies),
            base_url: self.base_url.clone(),
            image_fallback_batch: self.image_fallback_batch,
        }
    }
}

impl HtmlCardExtractor {
    /// Create an extractor resolving relative image URLs against `base_url`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid catalog base URL '{base_url}': {e}")))?;

        Ok(Self {
            strategies: Arc::new(Strategies::build()?),
            base_url,
            image_fallback_batch: IMAGE_FALLBACK_BATCH,
        })
    }

    /// Candidate card fragments, plus whether the fallback selectors were needed.
    fn select_cards<'a>(&self, document: &'a Html) -> (Vec<ElementRef<'a>>, bool) {
        let primary: Vec<_> = document.select(&self.strategies.primary_cards).collect();
        if !primary.is_empty() {
            return (primary, false);
        }
        let fallback = document.select(&self.strategies.fallback_cards).collect();
        (fallback, true)
    }

    /// Extract one product from a single card fragment.
    pub fn extract_card(
        &self,
        card: ElementRef<'_>,
        batch: u32,
        page_url: &str,
    ) -> Result<Product, Rejected> {
        let name = first_success(&self.strategies.name, card, &self.base_url)
            .ok_or(Rejected::MissingName)?;
        if name == UNKNOWN_PRODUCT {
            return Err(Rejected::PlaceholderName);
        }

        let price = first_success(&self.strategies.price, card, &self.base_url)
            .ok_or(Rejected::MissingPrice)?;

        let image_strategies = if batch >= self.image_fallback_batch {
            &self.strategies.image_filtered
        } else {
            &self.strategies.image_generic
        };
        let image_url = first_success(image_strategies, card, &self.base_url);

        Ok(Product::new(
            name,
            price,
            image_url,
            page_url.to_string(),
            batch,
        ))
    }

    /// Extract a product from a standalone card fragment.
    pub fn extract_fragment(
        &self,
        fragment: &str,
        batch: u32,
        page_url: &str,
    ) -> Result<Product, Rejected> {
        let html = Html::parse_fragment(fragment);
        self.extract_card(html.root_element(), batch, page_url)
    }
}

impl CardExtractor for HtmlCardExtractor {
    fn extract_page(&self, html: &str, page: &PageRequest) -> PageExtraction {
        let document = Html::parse_document(html);
        let (cards, used_fallback) = self.select_cards(&document);

        let outcomes = cards
            .iter()
            .map(|card| self.extract_card(*card, page.batch, &page.url))
            .collect();

        PageExtraction {
            cards_found: cards.len(),
            used_fallback,
            outcomes,
        }
    }
}

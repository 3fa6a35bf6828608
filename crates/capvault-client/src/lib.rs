pub mod extractor;
pub mod fetcher;

pub use extractor::{HtmlCardExtractor, normalize_image_url};
pub use fetcher::ReqwestFetcher;

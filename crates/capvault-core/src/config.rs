use std::str::FromStr;
use std::time::Duration;

use crate::catalog::DEFAULT_BASE_URL;
use crate::error::AppError;

/// Scraper settings.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Catalog base URL; also the base for resolving relative image URLs.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum number of pages fetched at once.
    pub concurrency: usize,
    /// Ceiling on a whole scrape run.
    pub run_deadline: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            concurrency: 1,
            run_deadline: Duration::from_secs(300),
        }
    }
}

impl ScraperConfig {
    /// Read configuration from environment variables.
    ///
    /// - `CAPVAULT_BASE_URL` (defaults to the S-Craft group-buy catalog)
    /// - `CAPVAULT_TIMEOUT_SECS` (defaults to 10)
    /// - `CAPVAULT_CONCURRENCY` (defaults to 1)
    /// - `CAPVAULT_RUN_DEADLINE_SECS` (defaults to 300)
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let base_url = std::env::var("CAPVAULT_BASE_URL").unwrap_or(defaults.base_url);
        let timeout_secs: u64 = positive_env("CAPVAULT_TIMEOUT_SECS", 10)?;
        let concurrency: usize = positive_env("CAPVAULT_CONCURRENCY", 1)?;
        let deadline_secs: u64 = positive_env("CAPVAULT_RUN_DEADLINE_SECS", 300)?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            concurrency,
            run_deadline: Duration::from_secs(deadline_secs),
        })
    }
}

/// Parse an optional, strictly positive integer variable.
fn positive_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
{
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => parse_positive(name, &raw),
    }
}

fn parse_positive<T>(name: &str, raw: &str) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed: T = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {name} '{raw}': must be a positive integer"
        ))
    })?;
    if parsed <= T::default() {
        return Err(AppError::ConfigError(format!("{name} must be at least 1")));
    }
    Ok(parsed)
}

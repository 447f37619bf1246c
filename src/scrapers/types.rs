use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Houses for sale across Poland, 72 per page, newest first
pub const DEFAULT_START_URL: &str = "https://www.otodom.pl/pl/wyniki/sprzedaz/dom/cala-polska?ownerTypeSingleSelect=ALL&viewType=listing&by=LATEST&direction=DESC&limit=72&page={page}";

/// Page count assumed when the pagination control cannot be read
pub const FALLBACK_PAGE_COUNT: u32 = 805;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Crawl parameters
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Listing URL with a `{page}` placeholder
    pub start_url_template: String,
    /// Result store location
    pub results_path: PathBuf,
    pub fallback_page_count: u32,
    /// Listing pages fetched concurrently
    pub page_concurrency: usize,
    /// Pause after each scroll step on a detail page
    pub scroll_pause: Duration,
    /// Fraction of the current document height scrolled per step
    pub scroll_increment: f64,
    /// Bounded wait for the maps link on a detail page
    pub maps_timeout: Duration,
    pub headless: bool,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url_template: DEFAULT_START_URL.to_string(),
            results_path: PathBuf::from("results/otodom_houses.json"),
            fallback_page_count: FALLBACK_PAGE_COUNT,
            page_concurrency: 4,
            scroll_pause: Duration::from_secs(1),
            scroll_increment: 0.3,
            maps_timeout: Duration::from_secs(10),
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl CrawlConfig {
    /// Defaults overridden by `OTODOM_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(url) = var::<String>("OTODOM_START_URL")? {
            cfg.start_url_template = url;
        }
        if let Some(path) = var::<PathBuf>("OTODOM_RESULTS_PATH")? {
            cfg.results_path = path;
        }
        if let Some(pages) = var("OTODOM_FALLBACK_PAGES")? {
            cfg.fallback_page_count = pages;
        }
        if let Some(n) = var::<usize>("OTODOM_PAGE_CONCURRENCY")? {
            cfg.page_concurrency = n.max(1);
        }
        if let Some(ms) = var("OTODOM_SCROLL_PAUSE_MS")? {
            cfg.scroll_pause = Duration::from_millis(ms);
        }
        if let Some(increment) = var::<f64>("OTODOM_SCROLL_INCREMENT")? {
            anyhow::ensure!(
                increment > 0.0,
                "OTODOM_SCROLL_INCREMENT must be positive, got {increment}"
            );
            cfg.scroll_increment = increment;
        }
        if let Some(secs) = var("OTODOM_MAPS_TIMEOUT_SECS")? {
            cfg.maps_timeout = Duration::from_secs(secs);
        }
        if let Some(headless) = var("OTODOM_HEADLESS")? {
            cfg.headless = headless;
        }
        if let Some(ua) = var::<String>("OTODOM_USER_AGENT")? {
            cfg.user_agent = ua;
        }
        if let Some(secs) = var("OTODOM_REQUEST_TIMEOUT_SECS")? {
            cfg.request_timeout = Duration::from_secs(secs);
        }

        Ok(cfg)
    }

    /// Listing URL for a 1-based page number
    pub fn page_url(&self, page: u32) -> String {
        self.start_url_template.replace("{page}", &page.to_string())
    }
}

fn var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Cannot read {name}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_fills_placeholder() {
        let cfg = CrawlConfig::default();

        assert!(cfg.page_url(7).ends_with("&page=7"));
        assert!(!cfg.page_url(7).contains("{page}"));
    }

    #[test]
    fn defaults_match_crawl_policy() {
        let cfg = CrawlConfig::default();

        assert_eq!(cfg.fallback_page_count, 805);
        assert_eq!(cfg.scroll_pause, Duration::from_secs(1));
        assert_eq!(cfg.maps_timeout, Duration::from_secs(10));
        assert!((cfg.scroll_increment - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unparseable_variable() {
        env::set_var("OTODOM_TEST_NUMBER", "twelve");

        let err = var::<u32>("OTODOM_TEST_NUMBER").unwrap_err();
        assert!(err.to_string().contains("OTODOM_TEST_NUMBER"));

        env::remove_var("OTODOM_TEST_NUMBER");
        assert_eq!(var::<u32>("OTODOM_TEST_NUMBER").unwrap(), None);
    }
}

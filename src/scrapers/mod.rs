pub mod browser;
pub mod dedup;
pub mod extractor;
pub mod http;
pub mod otodom;
pub mod pagination;
pub mod selectors;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use browser::ChromeSession;
pub use extractor::{DetailExtractor, ExtractorSettings};
pub use http::HttpFetcher;
pub use otodom::{CrawlSummary, OtodomCrawler};
pub use types::CrawlConfig;
